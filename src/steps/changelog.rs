use crate::boundary::BoundaryWarning;
use crate::context::ReleaseContext;
use crate::error::Result;
use crate::steps::{require_version, ExecuteStep, StepEnv};
use serde::Deserialize;
use std::fs;
use tracing::{debug, info};

/// Prepends the release notes to a changelog file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Changelog {
    /// Relative to the project root
    pub changelog_file: String,
    /// Kept as the first line of the file
    pub changelog_title: Option<String>,
}

impl Default for Changelog {
    fn default() -> Self {
        Changelog {
            changelog_file: "CHANGELOG.md".to_string(),
            changelog_title: None,
        }
    }
}

impl Changelog {
    /// New file contents with `notes` placed above `existing`
    pub fn prepend(&self, existing: &str, notes: &str) -> String {
        let notes = notes.trim();
        let mut rest = existing.trim_start();

        if let Some(title) = &self.changelog_title {
            if let Some(stripped) = rest.strip_prefix(title.as_str()) {
                rest = stripped.trim_start();
            }
        }
        let rest = rest.trim_end();

        let mut parts: Vec<&str> = Vec::new();
        if let Some(title) = &self.changelog_title {
            parts.push(title);
        }
        parts.push(notes);
        if !rest.is_empty() {
            parts.push(rest);
        }
        format!("{}\n", parts.join("\n\n"))
    }
}

impl ExecuteStep for Changelog {
    const NAME: &'static str = "changelog";

    fn execute(&self, mut ctx: ReleaseContext, env: &StepEnv<'_>) -> Result<ReleaseContext> {
        let (_, tag) = require_version(&ctx, Self::NAME)?;

        if ctx.notes.trim().is_empty() {
            crate::ui::display_boundary_warning(&BoundaryWarning::EmptyNotes {
                step: Self::NAME.to_string(),
            });
            return Ok(ctx);
        }

        let path = env.root.join(&self.changelog_file);
        if env.dry_run {
            crate::ui::display_dry_run(
                Self::NAME,
                &format!("would add notes for {} to {}", tag, self.changelog_file),
            );
            return Ok(ctx);
        }

        let existing = if path.exists() {
            fs::read_to_string(&path)?
        } else {
            debug!(path = %path.display(), "creating changelog");
            String::new()
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, self.prepend(&existing, &ctx.notes))?;

        info!(path = %path.display(), "changelog updated");
        ctx.changelog_file = Some(path);
        Ok(ctx)
    }
}
