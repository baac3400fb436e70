// tests/integration_test.rs
use git2::{Repository as Git2Repo, Signature};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn git_release(dir: &Path, args: &[&str]) -> Output {
    // The user config directory must not leak into the run
    Command::new(env!("CARGO_BIN_EXE_git-release"))
        .args(args)
        .current_dir(dir)
        .env("XDG_CONFIG_HOME", dir.join(".no-user-config"))
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute git-release")
}

fn init_repo(dir: &Path) -> Git2Repo {
    let repo = Git2Repo::init(dir).unwrap();
    {
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
    }
    repo.set_head("refs/heads/main").unwrap();
    repo
}

fn commit_file(repo: &Git2Repo, name: &str, contents: &str, message: &str) -> git2::Oid {
    let workdir = repo.workdir().unwrap().to_path_buf();
    fs::write(workdir.join(name), contents).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("Test User", "test@example.com").unwrap();

    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => Vec::new(),
    };
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .unwrap()
}

const LOCAL_PIPELINE: &str = r##"
branches = ["main"]
plugins = [
    "commit-analyzer",
    "release-notes-generator",
    ["changelog", { changelog_title = "# Changelog" }],
    "git",
    ["publish", { push = false }],
]
"##;

#[test]
fn test_git_release_help() {
    let dir = TempDir::new().unwrap();
    let output = git_release(dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("git-release"));
    assert!(stdout.contains("conventional commits"));
    assert!(stdout.contains("--dry-run"));
}

#[test]
fn test_git_release_version() {
    let dir = TempDir::new().unwrap();
    let output = git_release(dir.path(), &["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(
        stdout.trim(),
        format!("git-release {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn test_list_shows_default_configuration() {
    let dir = TempDir::new().unwrap();
    let output = git_release(dir.path(), &["--list"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("main"));
    assert!(stdout.contains("beta (channel: beta) [prerelease]"));
    assert!(stdout.contains("1. commit-analyzer"));
    assert!(stdout.contains("5. publish"));
}

#[test]
fn test_invalid_config_exits_with_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".releaserc.toml"), "plugins = [\"npm\"]\n").unwrap();

    let output = git_release(dir.path(), &["--list"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("ERROR:"));
    assert!(stderr.contains("Unknown step 'npm'"));
}

#[test]
fn test_release_in_real_repository() {
    let dir = TempDir::new().unwrap();
    let repo = init_repo(dir.path());
    fs::write(dir.path().join(".releaserc.toml"), LOCAL_PIPELINE).unwrap();
    commit_file(&repo, "README.md", "hello\n", "feat: initial import");
    commit_file(&repo, "README.md", "hello world\n", "fix: greet everyone");

    let output = git_release(dir.path(), &[]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let tag = repo.revparse_single("v1.0.0").unwrap().peel_to_commit().unwrap();
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(tag.id(), head.id());
    assert!(head
        .message()
        .unwrap()
        .starts_with("chore(release): v1.0.0 [skip ci]"));

    let changelog = fs::read_to_string(dir.path().join("CHANGELOG.md")).unwrap();
    assert!(changelog.starts_with("# Changelog\n\n## 1.0.0 ("));
    assert!(changelog.contains("### Features"));
    assert!(changelog.contains("### Bug Fixes"));
    assert!(head.tree().unwrap().get_name("CHANGELOG.md").is_some());

    // Nothing new since the tag
    let output = git_release(dir.path(), &[]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("No release on 'main'"));

    commit_file(&repo, "README.md", "hello again\n", "feat!: new greeting");
    let output = git_release(dir.path(), &[]);
    assert!(output.status.success());
    assert!(repo.revparse_single("v2.0.0").is_ok());
}

#[test]
fn test_dry_run_in_real_repository() {
    let dir = TempDir::new().unwrap();
    let repo = init_repo(dir.path());
    fs::write(dir.path().join(".releaserc.toml"), LOCAL_PIPELINE).unwrap();
    let before = commit_file(&repo, "README.md", "hello\n", "feat: initial import");

    let output = git_release(dir.path(), &["--dry-run"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("(dry run)"));
    assert!(stdout.contains("v1.0.0"));

    assert!(repo.tag_names(None).unwrap().is_empty());
    assert_eq!(repo.head().unwrap().target(), Some(before));
    assert!(!dir.path().join("CHANGELOG.md").exists());
}

#[test]
fn test_unconfigured_branch_is_skipped() {
    let dir = TempDir::new().unwrap();
    let repo = init_repo(dir.path());
    fs::write(dir.path().join(".releaserc.toml"), LOCAL_PIPELINE).unwrap();
    let head = commit_file(&repo, "README.md", "hello\n", "feat: initial import");
    let commit = repo.find_commit(head).unwrap();
    repo.branch("feature/login", &commit, false).unwrap();

    let output = git_release(dir.path(), &["--branch", "feature/login"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("matches no release rule"));
    assert!(repo.tag_names(None).unwrap().is_empty());
}

const BETA_BRANCHES: &str = r#"
branches = ["main", { name = "beta", prerelease = true, channel = "beta" }]
"#;

/// Commit `b.txt` on a new `beta` branch, then return to `main`
fn beta_ahead_of_main(repo: &Git2Repo) -> git2::Oid {
    let main_head = repo.head().unwrap().peel_to_commit().unwrap();
    repo.branch("beta", &main_head, false).unwrap();

    let mut checkout = git2::build::CheckoutBuilder::new();
    checkout.force();
    repo.set_head("refs/heads/beta").unwrap();
    repo.checkout_head(Some(&mut checkout)).unwrap();
    let beta_head = commit_file(repo, "b.txt", "beta\n", "feat: beta feature");

    repo.set_head("refs/heads/main").unwrap();
    repo.checkout_head(Some(&mut checkout)).unwrap();
    beta_head
}

#[test]
fn test_committing_release_of_other_branch_is_rejected() {
    let dir = TempDir::new().unwrap();
    let repo = init_repo(dir.path());
    let plugins = LOCAL_PIPELINE.replace("branches = [\"main\"]", "");
    let config = format!("{}{}", BETA_BRANCHES, plugins);
    fs::write(dir.path().join(".releaserc.toml"), config).unwrap();
    let main_head = commit_file(&repo, "a.txt", "main\n", "feat: initial import");
    let beta_head = beta_ahead_of_main(&repo);

    let output = git_release(dir.path(), &["--branch", "beta"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("'main' is checked out"), "stderr: {}", stderr);

    assert!(repo.tag_names(None).unwrap().is_empty());
    assert_eq!(repo.head().unwrap().target(), Some(main_head));
    assert_eq!(
        repo.find_branch("beta", git2::BranchType::Local)
            .unwrap()
            .get()
            .target(),
        Some(beta_head)
    );
    assert!(!dir.path().join("CHANGELOG.md").exists());
}

#[test]
fn test_tag_only_release_of_other_branch() {
    let dir = TempDir::new().unwrap();
    let repo = init_repo(dir.path());
    let config = format!(
        "{}{}",
        BETA_BRANCHES,
        r#"plugins = ["commit-analyzer", ["publish", { push = false }]]"#
    );
    fs::write(dir.path().join(".releaserc.toml"), config).unwrap();
    let main_head = commit_file(&repo, "a.txt", "main\n", "feat: initial import");
    let beta_head = beta_ahead_of_main(&repo);

    let output = git_release(dir.path(), &["--branch", "beta"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let tagged = repo
        .revparse_single("v1.0.0-beta.1")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(tagged.id(), beta_head);
    assert!(tagged.tree().unwrap().get_name("b.txt").is_some());
    assert_eq!(repo.head().unwrap().target(), Some(main_head));
}
