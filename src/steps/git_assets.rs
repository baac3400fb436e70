use crate::boundary::BoundaryWarning;
use crate::context::ReleaseContext;
use crate::error::Result;
use crate::steps::{require_version, ExecuteStep, StepEnv};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_MESSAGE: &str = "chore(release): {tag} [skip ci]\n\n{notes}";

/// Commits release assets back to the branch
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GitAssets {
    /// Paths relative to the project root
    pub assets: Vec<String>,
    pub message: String,
}

impl Default for GitAssets {
    fn default() -> Self {
        GitAssets {
            assets: vec!["CHANGELOG.md".to_string()],
            message: DEFAULT_MESSAGE.to_string(),
        }
    }
}

impl GitAssets {
    /// Split configured assets into those present under `root` and those missing
    fn existing_assets(&self, root: &Path) -> (Vec<PathBuf>, Vec<String>) {
        let mut present = Vec::new();
        let mut missing = Vec::new();
        for asset in &self.assets {
            let path = root.join(asset);
            if path.exists() {
                present.push(path);
            } else {
                missing.push(asset.clone());
            }
        }
        (present, missing)
    }
}

impl ExecuteStep for GitAssets {
    const NAME: &'static str = "git";

    fn execute(&self, mut ctx: ReleaseContext, env: &StepEnv<'_>) -> Result<ReleaseContext> {
        require_version(&ctx, Self::NAME)?;
        let message = ctx.render(&self.message).trim_end().to_string();

        if env.dry_run {
            crate::ui::display_dry_run(
                Self::NAME,
                &format!(
                    "would commit {} with message '{}'",
                    self.assets.join(", "),
                    message.lines().next().unwrap_or_default()
                ),
            );
            return Ok(ctx);
        }

        let (present, missing) = self.existing_assets(env.root);
        for path in missing {
            crate::ui::display_boundary_warning(&BoundaryWarning::MissingAsset { path });
        }

        let paths: Vec<&Path> = present.iter().map(PathBuf::as_path).collect();
        match env.repo.commit_paths(&ctx.branch, &paths, &message)? {
            Some(oid) => {
                info!(commit = %oid, assets = paths.len(), "release assets committed");
                ctx.release_commit = Some(oid.to_string());
            }
            None => info!("release assets unchanged, nothing to commit"),
        }
        Ok(ctx)
    }
}
