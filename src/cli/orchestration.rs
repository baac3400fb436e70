//! Release workflow orchestration
//!
//! Keeps clap out of the workflow: `main.rs` turns its arguments into a
//! [ReleaseWorkflowArgs] and everything below can be driven programmatically.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::{load_config, ReleaseConfig};
use crate::git::{Git2Repository, Repository};
use crate::pipeline::{PipelineRunner, RunOptions, RunOutcome, RunReport};
use crate::steps;

/// Arguments for the release workflow
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseWorkflowArgs {
    /// Path to custom config file
    pub config_path: Option<PathBuf>,

    /// Branch to release; the checked-out branch when `None`
    pub branch: Option<String>,

    /// Run every step without side effects
    pub dry_run: bool,

    /// Project root, where configuration and assets are looked up
    pub root: PathBuf,
}

impl ReleaseWorkflowArgs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ReleaseWorkflowArgs {
            config_path: None,
            branch: None,
            dry_run: false,
            root: root.into(),
        }
    }

    fn load_config(&self) -> Result<ReleaseConfig> {
        load_config(self.config_path.as_deref(), &self.root).context("Error loading config")
    }
}

/// Main release workflow
///
/// 1. Load and validate configuration
/// 2. Open the repository and pick the branch
/// 3. Run the pipeline and report the outcome
pub fn run_release_workflow(args: &ReleaseWorkflowArgs) -> Result<RunReport> {
    let config = args.load_config()?;

    let repo = Git2Repository::open(&args.root)
        .with_context(|| format!("Git repository error in {}", args.root.display()))?;
    let branch = match &args.branch {
        Some(branch) => branch.clone(),
        None => repo
            .current_branch()
            .context("Cannot determine the branch to release; pass --branch")?,
    };

    let options = RunOptions::new(&args.root).dry_run(args.dry_run);
    let runner = PipelineRunner::new(config, &repo, options)?;

    if args.dry_run {
        crate::ui::display_status("Dry run: no files, commits, tags or pushes will be made");
    }

    let report = runner.run(&branch)?;
    report_outcome(&report);
    Ok(report)
}

/// Print the end result of a run
pub fn report_outcome(report: &RunReport) {
    match &report.outcome {
        RunOutcome::Skipped { branch } => {
            crate::ui::display_status(&format!(
                "Branch '{}' matches no release rule; nothing to do",
                branch
            ));
        }
        RunOutcome::NoRelease(ctx) => {
            crate::ui::display_status(&format!(
                "No release on '{}': no commit since {} warrants one",
                ctx.branch,
                ctx.last_release
                    .as_ref()
                    .map(|r| r.git_tag.as_str())
                    .unwrap_or("the beginning of history")
            ));
        }
        RunOutcome::Released(ctx) => {
            let summary = crate::ui::format_release_summary(ctx);
            if ctx.published {
                crate::ui::display_success(&format!("Released {}", summary));
            } else {
                crate::ui::display_success(&format!("Prepared {}", summary));
            }
        }
    }
}

/// Show configured branches and the resolved pipeline
pub fn list_configuration(args: &ReleaseWorkflowArgs) -> Result<()> {
    let config = args.load_config()?;
    let steps = steps::resolve(&config.plugins)?;
    crate::ui::display_configuration(&config.branches, &steps);
    Ok(())
}
