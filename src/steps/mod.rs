//! Pipeline steps
//!
//! Each configured step name maps, through [STEP_TABLE], to a builder that
//! turns the step's loosely-typed options into a typed [Step] variant.
//! Options are checked when the pipeline is resolved, so a bad name or a
//! malformed option fails before anything runs.

pub mod changelog;
pub mod commit_analyzer;
pub mod exec;
pub mod git_assets;
pub mod notify;
pub mod publish;
pub mod release_notes;

pub use changelog::Changelog;
pub use commit_analyzer::{CommitAnalyzer, ReleaseRule, RuleRelease};
pub use exec::Exec;
pub use git_assets::GitAssets;
pub use notify::Notify;
pub use publish::Publish;
pub use release_notes::ReleaseNotesGenerator;

use crate::config::StepConfig;
use crate::context::ReleaseContext;
use crate::domain::TagFormat;
use crate::error::{ReleaseError, Result};
use crate::git::Repository;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;

/// Everything a step may read besides the context. Shared by all steps of
/// a run and never mutated.
pub struct StepEnv<'a> {
    pub repo: &'a dyn Repository,
    /// Project root; relative paths in step options resolve against it
    pub root: &'a Path,
    pub dry_run: bool,
    pub release_date: NaiveDate,
    pub tag_format: &'a TagFormat,
    pub initial_version: &'a semver::Version,
    pub repository_url: Option<&'a str>,
    pub remote: &'a str,
}

/// Capability implemented by every step kind
pub trait ExecuteStep {
    /// Name the step is configured under
    const NAME: &'static str;

    /// Whether the step reads the next version, and so must be placed
    /// after a `commit-analyzer`
    const REQUIRES_VERSION: bool = true;

    fn execute(&self, ctx: ReleaseContext, env: &StepEnv<'_>) -> Result<ReleaseContext>;
}

/// A resolved pipeline step
#[derive(Debug, Clone)]
pub enum Step {
    CommitAnalyzer(CommitAnalyzer),
    ReleaseNotes(ReleaseNotesGenerator),
    Changelog(Changelog),
    Exec(Exec),
    Git(GitAssets),
    Publish(Publish),
    Notify(Notify),
}

type StepBuilder = fn(Map<String, Value>) -> serde_json::Result<Step>;

fn options<T: DeserializeOwned>(options: Map<String, Value>) -> serde_json::Result<T> {
    serde_json::from_value(Value::Object(options))
}

/// Lookup table from configured name to step builder
pub const STEP_TABLE: [(&str, StepBuilder); 7] = [
    (CommitAnalyzer::NAME, |o| options(o).map(Step::CommitAnalyzer)),
    (ReleaseNotesGenerator::NAME, |o| options(o).map(Step::ReleaseNotes)),
    (Changelog::NAME, |o| options(o).map(Step::Changelog)),
    (Exec::NAME, |o| options(o).map(Step::Exec)),
    (GitAssets::NAME, |o| options(o).map(Step::Git)),
    (Publish::NAME, |o| options(o).map(Step::Publish)),
    (Notify::NAME, |o| options(o).map(Step::Notify)),
];

/// Names of every step kind, in table order
pub fn known_steps() -> Vec<&'static str> {
    STEP_TABLE.iter().map(|(name, _)| *name).collect()
}

impl Step {
    /// Build a step from its configuration
    pub fn from_config(config: &StepConfig) -> Result<Self> {
        let (_, build) = STEP_TABLE
            .iter()
            .find(|(name, _)| *name == config.name)
            .ok_or_else(|| {
                ReleaseError::config(format!(
                    "Unknown step '{}' (known steps: {})",
                    config.name,
                    known_steps().join(", ")
                ))
            })?;

        build(config.options.clone()).map_err(|e| {
            ReleaseError::config(format!("Invalid options for step '{}': {}", config.name, e))
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Step::CommitAnalyzer(_) => CommitAnalyzer::NAME,
            Step::ReleaseNotes(_) => ReleaseNotesGenerator::NAME,
            Step::Changelog(_) => Changelog::NAME,
            Step::Exec(_) => Exec::NAME,
            Step::Git(_) => GitAssets::NAME,
            Step::Publish(_) => Publish::NAME,
            Step::Notify(_) => Notify::NAME,
        }
    }

    pub fn requires_version(&self) -> bool {
        match self {
            Step::CommitAnalyzer(_) => CommitAnalyzer::REQUIRES_VERSION,
            Step::ReleaseNotes(_) => ReleaseNotesGenerator::REQUIRES_VERSION,
            Step::Changelog(_) => Changelog::REQUIRES_VERSION,
            Step::Exec(_) => Exec::REQUIRES_VERSION,
            Step::Git(_) => GitAssets::REQUIRES_VERSION,
            Step::Publish(_) => Publish::REQUIRES_VERSION,
            Step::Notify(_) => Notify::REQUIRES_VERSION,
        }
    }

    pub fn execute(&self, ctx: ReleaseContext, env: &StepEnv<'_>) -> Result<ReleaseContext> {
        match self {
            Step::CommitAnalyzer(step) => step.execute(ctx, env),
            Step::ReleaseNotes(step) => step.execute(ctx, env),
            Step::Changelog(step) => step.execute(ctx, env),
            Step::Exec(step) => step.execute(ctx, env),
            Step::Git(step) => step.execute(ctx, env),
            Step::Publish(step) => step.execute(ctx, env),
            Step::Notify(step) => step.execute(ctx, env),
        }
    }
}

/// Resolve configured steps, in order.
///
/// Fails on the first unknown name or malformed options, and when a step
/// that reads the next version is placed before any `commit-analyzer`.
pub fn resolve(configs: &[StepConfig]) -> Result<Vec<Step>> {
    let steps = configs
        .iter()
        .map(Step::from_config)
        .collect::<Result<Vec<_>>>()?;

    let mut analyzed = false;
    for step in &steps {
        if step.requires_version() && !analyzed {
            return Err(ReleaseError::config(format!(
                "Step '{}' needs the next version and must come after '{}'",
                step.name(),
                CommitAnalyzer::NAME
            )));
        }
        analyzed |= matches!(step, Step::CommitAnalyzer(_));
    }

    Ok(steps)
}

/// Fetch the next version a step depends on; resolution guarantees an
/// analyzer ran, so absence means the context was built by hand.
pub(crate) fn require_version<'c>(
    ctx: &'c ReleaseContext,
    step: &str,
) -> Result<(&'c semver::Version, &'c str)> {
    match (&ctx.next_version, &ctx.git_tag) {
        (Some(version), Some(tag)) => Ok((version, tag.as_str())),
        _ => Err(ReleaseError::version(format!(
            "Step '{}' ran without a next version",
            step
        ))),
    }
}
