use crate::context::ReleaseContext;
use crate::error::Result;
use crate::steps::exec::run_script;
use crate::steps::{require_version, ExecuteStep, StepEnv};
use serde::Deserialize;
use tracing::{debug, info};

/// Announces a finished release
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Notify {
    /// Supports `{package}` in addition to the context placeholders
    pub message: String,
    /// Defaults to the project directory name
    pub package_name: Option<String>,
    /// Executable run with `RELEASE_MESSAGE` set, relative to the project root
    pub script: Option<String>,
    pub notify_on_success: bool,
}

impl Default for Notify {
    fn default() -> Self {
        Notify {
            message: "{package} {version} has been released".to_string(),
            package_name: None,
            script: None,
            notify_on_success: true,
        }
    }
}

impl ExecuteStep for Notify {
    const NAME: &'static str = "notify";

    fn execute(&self, ctx: ReleaseContext, env: &StepEnv<'_>) -> Result<ReleaseContext> {
        require_version(&ctx, Self::NAME)?;
        if !self.notify_on_success {
            debug!("notifications disabled");
            return Ok(ctx);
        }

        let package = match &self.package_name {
            Some(name) => name.clone(),
            None => env
                .root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        let message = ctx.render_with(&self.message, &[("package", package.as_str())]);

        if env.dry_run {
            crate::ui::display_dry_run(Self::NAME, &format!("would announce '{}'", message));
            return Ok(ctx);
        }

        crate::ui::display_success(&message);

        if let Some(script) = &self.script {
            let mut env_vars = ctx.to_env_vars();
            env_vars.insert("RELEASE_MESSAGE".to_string(), message);
            run_script(&env.root.join(script), env.root, &env_vars)?;
            info!(script = %script, "notification sent");
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
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn write_script(dir: &Path, body: &str) {
        let path = dir.join("notify.sh");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn notify_with_script() -> Notify {
        Notify {
            package_name: Some("acme".to_string()),
            script: Some("notify.sh".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_script_receives_message() {
        let repo = MockRepository::default();
        let fixture = EnvFixture::new();
        write_script(
            fixture.dir.path(),
            "printf '%s|%s' \"$RELEASE_MESSAGE\" \"$RELEASE_TAG\" > sent.txt",
        );
        let env = fixture.env(&repo, false);

        notify_with_script()
            .execute(analyzed_context(""), &env)
            .unwrap();

        let sent = fs::read_to_string(fixture.dir.path().join("sent.txt")).unwrap();
        assert_eq!(sent, "acme 1.1.0 has been released|v1.1.0");
    }

    #[test]
    fn test_failing_script_fails_step() {
        let repo = MockRepository::default();
        let fixture = EnvFixture::new();
        write_script(fixture.dir.path(), "exit 1");
        let env = fixture.env(&repo, false);

        assert!(notify_with_script()
            .execute(analyzed_context(""), &env)
            .is_err());
    }

    #[test]
    fn test_disabled_notification_skips_script() {
        let repo = MockRepository::default();
        let fixture = EnvFixture::new();
        write_script(fixture.dir.path(), "exit 1");
        let env = fixture.env(&repo, false);

        let step = Notify {
            notify_on_success: false,
            ..notify_with_script()
        };
        assert!(step.execute(analyzed_context(""), &env).is_ok());
    }

    #[test]
    fn test_dry_run_skips_script() {
        let repo = MockRepository::default();
        let fixture = EnvFixture::new();
        write_script(fixture.dir.path(), "touch sent.txt");
        let env = fixture.env(&repo, true);

        notify_with_script()
            .execute(analyzed_context(""), &env)
            .unwrap();
        assert!(!fixture.dir.path().join("sent.txt").exists());
    }

    #[test]
    fn test_without_script_only_prints() {
        let repo = MockRepository::default();
        let fixture = EnvFixture::new();
        let env = fixture.env(&repo, false);

        let ctx = analyzed_context("notes");
        let result = Notify::default().execute(ctx.clone(), &env).unwrap();
        assert_eq!(result, ctx);
    }
}
