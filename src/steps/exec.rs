use crate::context::ReleaseContext;
use crate::error::{ReleaseError, Result};
use crate::steps::{require_version, ExecuteStep, StepEnv};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::process::{Command, Output};
use tracing::{debug, info};

/// Runs a shell command with the release exported in `RELEASE_*` variables
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Exec {
    /// Command line; `{placeholder}`s are rendered from the context first
    pub cmd: String,
    /// Working directory, relative to the project root
    #[serde(default)]
    pub cwd: Option<String>,
}

fn shell(command: &str) -> Command {
    #[cfg(windows)]
    let cmd = {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    };

    #[cfg(not(windows))]
    let cmd = {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    };

    cmd
}

fn check_output(what: &str, output: Output) -> Result<String> {
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReleaseError::command(format!(
            "{} failed with exit code {}\nStdout: {}\nStderr: {}",
            what,
            output.status.code().unwrap_or(-1),
            stdout.trim_end(),
            stderr.trim_end()
        )));
    }
    Ok(stdout)
}

/// Run `command` through the platform shell and return its stdout.
/// A non-zero exit status is an error carrying both output streams.
pub(crate) fn run_shell(
    command: &str,
    cwd: &Path,
    env_vars: &HashMap<String, String>,
) -> Result<String> {
    debug!(command, cwd = %cwd.display(), "running shell command");
    let output = shell(command)
        .current_dir(cwd)
        .envs(env_vars)
        .output()
        .map_err(|e| ReleaseError::command(format!("Failed to execute '{}': {}", command, e)))?;

    check_output(&format!("Command '{}'", command), output)
}

/// Run an executable script directly.
///
/// # Returns
/// * `Err` if the script is missing, is not a file, or exits non-zero
pub(crate) fn run_script(
    script: &Path,
    cwd: &Path,
    env_vars: &HashMap<String, String>,
) -> Result<String> {
    if !script.exists() {
        return Err(ReleaseError::command(format!(
            "Script not found: {}",
            script.display()
        )));
    }
    if !script.is_file() {
        return Err(ReleaseError::command(format!(
            "Script path is not a file: {}",
            script.display()
        )));
    }

    debug!(script = %script.display(), "running script");
    let output = Command::new(script)
        .current_dir(cwd)
        .envs(env_vars)
        .output()
        .map_err(|e| {
            ReleaseError::command(format!(
                "Failed to execute script {}: {}",
                script.display(),
                e
            ))
        })?;

    check_output(&format!("Script {}", script.display()), output)
}

impl ExecuteStep for Exec {
    const NAME: &'static str = "exec";

    fn execute(&self, ctx: ReleaseContext, env: &StepEnv<'_>) -> Result<ReleaseContext> {
        require_version(&ctx, Self::NAME)?;
        let command = ctx.render(&self.cmd);
        let cwd = match &self.cwd {
            Some(dir) => env.root.join(dir),
            None => env.root.to_path_buf(),
        };

        if env.dry_run {
            crate::ui::display_dry_run(Self::NAME, &format!("would run `{}`", command));
            return Ok(ctx);
        }

        let stdout = run_shell(&command, &cwd, &ctx.to_env_vars())?;
        for line in stdout.lines() {
            info!(target: "exec", "{}", line);
        }
        Ok(ctx)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::git::MockRepository;
    use crate::steps::test_support::{analyzed_context, EnvFixture};
    use std::fs;

    fn exec(cmd: &str) -> Exec {
        Exec {
            cmd: cmd.to_string(),
            cwd: None,
        }
    }

    #[test]
    fn test_successful_command() {
        let repo = MockRepository::default();
        let fixture = EnvFixture::new();
        let env = fixture.env(&repo, false);

        let ctx = analyzed_context("notes");
        let result = exec("true").execute(ctx.clone(), &env).unwrap();
        assert_eq!(result, ctx);
    }

    #[test]
    fn test_failing_command_reports_output() {
        let repo = MockRepository::default();
        let fixture = EnvFixture::new();
        let env = fixture.env(&repo, false);

        let err = exec("echo boom >&2; exit 3")
            .execute(analyzed_context(""), &env)
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("exit code 3"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_command_sees_release_environment() {
        let repo = MockRepository::default();
        let fixture = EnvFixture::new();
        let env = fixture.env(&repo, false);

        exec("printf '%s %s' \"$RELEASE_TAG\" {version} > out.txt")
            .execute(analyzed_context(""), &env)
            .unwrap();

        let written = fs::read_to_string(fixture.dir.path().join("out.txt")).unwrap();
        assert_eq!(written, "v1.1.0 1.1.0");
    }

    #[test]
    fn test_command_runs_in_cwd() {
        let repo = MockRepository::default();
        let fixture = EnvFixture::new();
        fs::create_dir(fixture.dir.path().join("pkg")).unwrap();
        let env = fixture.env(&repo, false);

        let step = Exec {
            cmd: "touch marker".to_string(),
            cwd: Some("pkg".to_string()),
        };
        step.execute(analyzed_context(""), &env).unwrap();
        assert!(fixture.dir.path().join("pkg/marker").exists());
    }

    #[test]
    fn test_dry_run_does_not_execute() {
        let repo = MockRepository::default();
        let fixture = EnvFixture::new();
        let env = fixture.env(&repo, true);

        exec("touch marker")
            .execute(analyzed_context(""), &env)
            .unwrap();
        assert!(!fixture.dir.path().join("marker").exists());
    }

    #[test]
    fn test_missing_script_fails() {
        let result = run_script(
            Path::new("/nonexistent/path/to/notify.sh"),
            Path::new("/"),
            &HashMap::new(),
        );
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Script not found"));
    }

    #[test]
    fn test_script_directory_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = run_script(dir.path(), dir.path(), &HashMap::new());
        assert!(result.unwrap_err().to_string().contains("not a file"));
    }
}
