use crate::error::{ReleaseError, Result};
use crate::git::CommitInfo;
use git2::{Oid, Repository as Git2Repo};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn workdir(&self) -> Result<&Path> {
        self.repo
            .workdir()
            .ok_or_else(|| ReleaseError::config("Cannot release from a bare repository"))
    }

    /// Express `path` relative to the working tree, as the index expects
    fn relative_to_workdir(&self, path: &Path) -> Result<PathBuf> {
        if path.is_relative() {
            return Ok(path.to_path_buf());
        }

        let workdir = self.workdir()?;
        if let Ok(rel) = path.strip_prefix(workdir) {
            return Ok(rel.to_path_buf());
        }

        let canonical_workdir = workdir.canonicalize()?;
        let canonical_path = path.canonicalize()?;
        canonical_path
            .strip_prefix(&canonical_workdir)
            .map(Path::to_path_buf)
            .map_err(|_| {
                ReleaseError::config(format!(
                    "Asset '{}' is outside the repository",
                    path.display()
                ))
            })
    }
}

/// Credential callbacks for fetch and push.
///
/// Tries SSH keys from `~/.ssh/`, then the SSH agent, then git's default
/// credential helpers.
fn remote_callbacks<'a>() -> git2::RemoteCallbacks<'a> {
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(git2::CredentialType::SSH_KEY) {
            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = home.join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        git2::Cred::default()
    });
    callbacks
}

impl super::Repository for Git2Repository {
    fn current_branch(&self) -> Result<String> {
        let head = self
            .repo
            .head()
            .map_err(|e| ReleaseError::branch(format!("Cannot resolve HEAD: {}", e)))?;

        if !head.is_branch() {
            return Err(ReleaseError::branch(
                "HEAD is detached; pass --branch explicitly",
            ));
        }

        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| ReleaseError::branch("HEAD branch name is not valid UTF-8"))
    }

    fn get_branch_head_oid(&self, branch_name: &str) -> Result<Oid> {
        let branch = self
            .repo
            .find_branch(branch_name, git2::BranchType::Local)
            .map_err(|e| {
                ReleaseError::branch(format!("Cannot find branch '{}': {}", branch_name, e))
            })?;

        branch.get().target().ok_or_else(|| {
            ReleaseError::branch(format!("Branch '{}' has no target", branch_name))
        })
    }

    fn get_commits_between(&self, from_oid: Option<Oid>, to_oid: Oid) -> Result<Vec<CommitInfo>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::REVERSE)?;
        revwalk.push(to_oid)?;
        if let Some(from) = from_oid {
            revwalk.hide(from)?;
        }

        let mut commits = Vec::new();
        for oid_result in revwalk {
            let oid = oid_result?;
            let commit = self.repo.find_commit(oid)?;

            commits.push(CommitInfo {
                hash: oid.to_string(),
                message: commit.message().unwrap_or("(empty message)").to_string(),
                author: commit.author().name().unwrap_or("unknown").to_string(),
            });
        }

        Ok(commits)
    }

    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        let reference_name = format!("refs/tags/{}", tag_name);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => {
                let oid = reference
                    .peel(git2::ObjectType::Commit)
                    .map_err(|e| ReleaseError::tag(format!("Cannot peel tag: {}", e)))?
                    .id();

                Ok(Some(oid))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(ReleaseError::tag(format!(
                "Cannot find tag '{}': {}",
                tag_name, e
            ))),
        }
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn is_ancestor(&self, ancestor: Oid, descendant: Oid) -> Result<bool> {
        if ancestor == descendant {
            return Ok(true);
        }
        Ok(self.repo.graph_descendant_of(descendant, ancestor)?)
    }

    fn create_tag(&self, name: &str, oid: Oid) -> Result<()> {
        let object = self
            .repo
            .find_object(oid, None)
            .map_err(|e| ReleaseError::tag(format!("Cannot find object: {}", e)))?;

        self.repo
            .tag_lightweight(name, &object, false)
            .map_err(|e| ReleaseError::tag(format!("Cannot create tag '{}': {}", name, e)))?;

        Ok(())
    }

    fn commit_paths(&self, branch: &str, paths: &[&Path], message: &str) -> Result<Option<Oid>> {
        // The index and HEAD belong to the checked-out branch
        let checked_out = self.current_branch()?;
        if checked_out != branch {
            return Err(ReleaseError::branch(format!(
                "Cannot commit to '{}' while '{}' is checked out",
                branch, checked_out
            )));
        }

        let mut index = self.repo.index()?;
        for path in paths {
            let rel = self.relative_to_workdir(path)?;
            debug!(path = %rel.display(), "staging asset");
            index.add_path(&rel)?;
        }
        index.write()?;

        let tree_id = index.write_tree()?;
        let parent = self.repo.head()?.peel_to_commit()?;
        if parent.tree_id() == tree_id {
            return Ok(None);
        }

        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.repo.signature()?;
        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;

        Ok(Some(oid))
    }

    fn push_tags(&self, remote: &str, tag_names: &[&str]) -> Result<()> {
        let refspecs: Vec<String> = tag_names
            .iter()
            .map(|tag| format!("refs/tags/{}:refs/tags/{}", tag, tag))
            .collect();

        self.push_refspecs(remote, &refspecs)
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        let refspec = format!("refs/heads/{}:refs/heads/{}", branch, branch);
        self.push_refspecs(remote, &[refspec])
    }

    fn fetch_from_remote(&self, remote: &str, branch: &str) -> Result<()> {
        let mut remote_handle = self
            .repo
            .find_remote(remote)
            .map_err(|e| ReleaseError::remote(format!("Cannot find remote: {}", e)))?;

        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks());

        let refspec_branch = format!("+refs/heads/{}:refs/remotes/{}/{}", branch, remote, branch);
        remote_handle
            .fetch(
                &[refspec_branch.as_str(), "+refs/tags/*:refs/tags/*"],
                Some(&mut fetch_options),
                None,
            )
            .map_err(|e| ReleaseError::remote(format!("Fetch failed: {}", e)))?;

        Ok(())
    }
}

impl Git2Repository {
    fn push_refspecs(&self, remote: &str, refspecs: &[String]) -> Result<()> {
        let mut remote_handle = self
            .repo
            .find_remote(remote)
            .map_err(|e| ReleaseError::remote(format!("Cannot find remote: {}", e)))?;

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(remote_callbacks());

        let refspec_strs: Vec<&str> = refspecs.iter().map(|s| s.as_str()).collect();
        remote_handle
            .push(&refspec_strs, Some(&mut push_options))
            .map_err(|e| ReleaseError::remote(format!("Push failed: {}", e)))?;

        Ok(())
    }
}
