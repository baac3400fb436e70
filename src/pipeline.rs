//! Pipeline runner
//!
//! [PipelineRunner] owns a validated configuration and its resolved steps.
//! A run locates the previous release of the branch, collects the commits
//! since, and then moves one [ReleaseContext] through the steps in order.

use crate::boundary::BoundaryWarning;
use crate::config::ReleaseConfig;
use crate::context::{LastRelease, ReleaseContext};
use crate::domain::branch::find_rule;
use crate::domain::{version, BranchRule, TagFormat};
use crate::error::{ReleaseError, Result};
use crate::git::Repository;
use crate::steps::{self, Step, StepEnv};
use chrono::NaiveDate;
use git2::Oid;
use semver::Version;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Per-run settings that are not part of the configuration file
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Project root; step paths are resolved against it
    pub root: PathBuf,
    pub dry_run: bool,
    /// Date printed in release notes
    pub release_date: NaiveDate,
}

impl RunOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        RunOptions {
            root: root.into(),
            dry_run: false,
            release_date: chrono::Local::now().date_naive(),
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn release_date(mut self, date: NaiveDate) -> Self {
        self.release_date = date;
        self
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// No branch rule matched; nothing was read or written
    Skipped { branch: String },
    /// Commit analysis found nothing worth releasing
    NoRelease(ReleaseContext),
    /// Every step ran
    Released(ReleaseContext),
}

impl RunOutcome {
    /// Final context, unless the run was skipped
    pub fn context(&self) -> Option<&ReleaseContext> {
        match self {
            RunOutcome::Skipped { .. } => None,
            RunOutcome::NoRelease(ctx) | RunOutcome::Released(ctx) => Some(ctx),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Names of the steps that ran, in order
    pub executed: Vec<&'static str>,
}

pub struct PipelineRunner<'a> {
    config: ReleaseConfig,
    repo: &'a dyn Repository,
    options: RunOptions,
    steps: Vec<Step>,
    tag_format: TagFormat,
    initial_version: Version,
}

impl<'a> PipelineRunner<'a> {
    /// Validate `config` and resolve its steps.
    ///
    /// Every configuration error surfaces here, before any step can run.
    pub fn new(
        config: ReleaseConfig,
        repo: &'a dyn Repository,
        options: RunOptions,
    ) -> Result<Self> {
        config.validate()?;
        let steps = steps::resolve(&config.plugins)?;
        if steps.is_empty() {
            warn!("no steps configured; runs will only report the last release");
        }

        Ok(PipelineRunner {
            tag_format: config.tag_format()?,
            initial_version: config.initial_version()?,
            config,
            repo,
            options,
            steps,
        })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn config(&self) -> &ReleaseConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.options.root
    }

    /// Branch rule that governs `branch`, if any
    pub fn rule_for(&self, branch: &str) -> Option<&BranchRule> {
        find_rule(&self.config.branches, branch)
    }

    /// Run the pipeline for `branch`.
    ///
    /// # Returns
    /// * `Ok(report)` - Skipped, no release, or released
    /// * `Err` - The first step failure, wrapped with the step's name, a
    ///   repository error while preparing the context, or a branch error when
    ///   the pipeline commits to a branch that is not checked out
    pub fn run(&self, branch: &str) -> Result<RunReport> {
        let Some(rule) = self.rule_for(branch) else {
            info!(branch, "no branch rule matches, skipping");
            return Ok(RunReport {
                outcome: RunOutcome::Skipped {
                    branch: branch.to_string(),
                },
                executed: Vec::new(),
            });
        };

        self.ensure_worktree_on(branch)?;

        info!(branch, rule = %rule.name, "starting release pipeline");
        let mut ctx = self.prepare(branch, rule)?;
        let env = self.env();

        let mut executed = Vec::with_capacity(self.steps.len());
        for (i, step) in self.steps.iter().enumerate() {
            crate::ui::display_step(i + 1, self.steps.len(), step.name());
            debug!(step = step.name(), "executing step");

            ctx = step
                .execute(ctx, &env)
                .map_err(|e| ReleaseError::step(step.name(), e))?;
            executed.push(step.name());

            if ctx.is_no_release() {
                info!(step = step.name(), "no release warranted, stopping");
                return Ok(RunReport {
                    outcome: RunOutcome::NoRelease(ctx),
                    executed,
                });
            }
        }

        Ok(RunReport {
            outcome: RunOutcome::Released(ctx),
            executed,
        })
    }

    /// Steps that write the working tree or commit from the index act on the
    /// checked-out branch, so a real run of them requires `branch` there.
    fn ensure_worktree_on(&self, branch: &str) -> Result<()> {
        if self.options.dry_run {
            return Ok(());
        }
        let writes_worktree = self
            .steps
            .iter()
            .any(|step| matches!(step, Step::Changelog(_) | Step::Git(_)));
        if !writes_worktree {
            return Ok(());
        }

        let checked_out = self.repo.current_branch().map_err(|_| {
            ReleaseError::branch(format!(
                "Cannot release '{}' without it checked out; check out '{}' first or use --dry-run",
                branch, branch
            ))
        })?;
        if checked_out != branch {
            return Err(ReleaseError::branch(format!(
                "Cannot release '{}' while '{}' is checked out; check out '{}' first or use --dry-run",
                branch, checked_out, branch
            )));
        }
        Ok(())
    }

    fn env(&self) -> StepEnv<'_> {
        StepEnv {
            repo: self.repo,
            root: self.options.root.as_path(),
            dry_run: self.options.dry_run,
            release_date: self.options.release_date,
            tag_format: &self.tag_format,
            initial_version: &self.initial_version,
            repository_url: self.config.repository_url.as_deref(),
            remote: &self.config.behavior.remote,
        }
    }

    /// Build the starting context: last release, last stable version and
    /// the commits since. Only reads from the repository.
    fn prepare(&self, branch: &str, rule: &BranchRule) -> Result<ReleaseContext> {
        let mut ctx = ReleaseContext::new(branch, rule);

        if self.config.behavior.fetch {
            let remote = &self.config.behavior.remote;
            if let Err(e) = self.repo.fetch_from_remote(remote, branch) {
                crate::ui::display_boundary_warning(&BoundaryWarning::FetchFailed {
                    remote: remote.clone(),
                    reason: e.to_string(),
                });
            }
        }

        let head = self.repo.get_branch_head_oid(branch)?;
        let releases = self.reachable_releases(head)?;

        ctx.last_stable = releases
            .iter()
            .map(|(version, _, _)| version)
            .filter(|version| version.pre.is_empty())
            .max()
            .cloned();

        let last = releases
            .into_iter()
            .filter(|(v, _, _)| version::belongs_to_line(v, ctx.prerelease_id.as_deref()))
            .max_by(|a, b| a.0.cmp(&b.0));

        let from = last.as_ref().map(|(_, _, oid)| *oid);
        ctx.commits = self.repo.get_commits_between(from, head)?;

        if let Some((version, tag, oid)) = last {
            debug!(%version, %tag, "last release found");
            if ctx.commits.is_empty() {
                crate::ui::display_boundary_warning(&BoundaryWarning::NoNewCommits {
                    latest_tag: tag.clone(),
                    current_commit_hash: head.to_string(),
                });
            }
            ctx.last_release = Some(LastRelease {
                version,
                git_tag: tag,
                git_head: oid.to_string(),
            });
        } else {
            debug!("no previous release on this branch");
        }

        info!(commits = ctx.commits.len(), "commits collected");
        Ok(ctx)
    }

    /// Every tag that parses under the tag format and points at `head` or
    /// one of its ancestors
    fn reachable_releases(&self, head: Oid) -> Result<Vec<(Version, String, Oid)>> {
        let mut releases = Vec::new();
        for tag in self.repo.list_tags()? {
            let Some(version) = self.tag_format.parse(&tag) else {
                debug!(%tag, "ignoring tag outside the tag format");
                continue;
            };
            let Some(oid) = self.repo.find_tag_oid(&tag)? else {
                continue;
            };
            if self.repo.is_ancestor(oid, head)? {
                releases.push((version, tag, oid));
            }
        }
        Ok(releases)
    }
}
