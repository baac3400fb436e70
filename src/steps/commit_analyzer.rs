use crate::context::ReleaseContext;
use crate::domain::branch::wildcard_match;
use crate::domain::{version, ParsedCommit, VersionBump};
use crate::error::{ReleaseError, Result};
use crate::steps::{ExecuteStep, StepEnv};
use serde::Deserialize;
use tracing::{debug, info};

/// Release decision attached to a custom rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleRelease {
    Major,
    Minor,
    Patch,
    /// Matching commits never trigger a release
    None,
}

impl RuleRelease {
    fn bump(self) -> Option<VersionBump> {
        match self {
            RuleRelease::Major => Some(VersionBump::Major),
            RuleRelease::Minor => Some(VersionBump::Minor),
            RuleRelease::Patch => Some(VersionBump::Patch),
            RuleRelease::None => None,
        }
    }
}

/// A custom release rule. Every field that is set must match; `scope` and
/// `subject` accept `*` wildcards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseRule {
    #[serde(default, rename = "type")]
    pub commit_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub breaking: Option<bool>,
    pub release: RuleRelease,
}

impl ReleaseRule {
    fn matches(&self, commit: &ParsedCommit) -> bool {
        let type_ok = self
            .commit_type
            .as_ref()
            .map_or(true, |t| t.eq_ignore_ascii_case(&commit.r#type));
        let scope_ok = self.scope.as_ref().map_or(true, |pattern| {
            commit
                .scope
                .as_deref()
                .map_or(false, |scope| wildcard_match(pattern, scope))
        });
        let subject_ok = self
            .subject
            .as_ref()
            .map_or(true, |pattern| wildcard_match(pattern, &commit.description));
        let breaking_ok = self
            .breaking
            .map_or(true, |breaking| breaking == commit.is_breaking_change);

        type_ok && scope_ok && subject_ok && breaking_ok
    }
}

/// Analyzes commits to determine the release type and next version
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CommitAnalyzer {
    /// Checked before the default conventional rules
    pub release_rules: Vec<ReleaseRule>,
}

impl CommitAnalyzer {
    /// Release type warranted by a single commit message
    pub fn analyze_message(&self, message: &str) -> Option<VersionBump> {
        let parsed = ParsedCommit::parse(message);

        let matched: Vec<RuleRelease> = self
            .release_rules
            .iter()
            .filter(|rule| rule.matches(&parsed))
            .map(|rule| rule.release)
            .collect();
        if !matched.is_empty() {
            return matched.into_iter().filter_map(RuleRelease::bump).max();
        }

        if parsed.is_breaking_change {
            return Some(VersionBump::Major);
        }
        match parsed.r#type.as_str() {
            "feat" | "feature" => Some(VersionBump::Minor),
            "fix" | "perf" | "revert" => Some(VersionBump::Patch),
            _ => None,
        }
    }

    /// Analyze commit messages and determine version bump; `None` means
    /// nothing warrants a release
    pub fn analyze_messages(&self, messages: &[String]) -> Option<VersionBump> {
        messages
            .iter()
            .filter_map(|message| self.analyze_message(message))
            .max()
    }
}

impl ExecuteStep for CommitAnalyzer {
    const NAME: &'static str = "commit-analyzer";
    const REQUIRES_VERSION: bool = false;

    fn execute(&self, mut ctx: ReleaseContext, env: &StepEnv<'_>) -> Result<ReleaseContext> {
        crate::ui::display_commit_analysis(&ctx);

        let messages: Vec<String> = ctx.commits.iter().map(|c| c.message.clone()).collect();
        let release_type = self.analyze_messages(&messages);
        ctx.analyzed = true;
        ctx.release_type = release_type;

        let Some(bump) = release_type else {
            info!(commits = messages.len(), "no commit warrants a release");
            return Ok(ctx);
        };

        let last_release = ctx.last_release.as_ref().map(|r| &r.version);
        let next = version::next_version(
            ctx.last_stable.as_ref(),
            last_release,
            bump,
            ctx.prerelease_id.as_deref(),
            env.initial_version,
        )?;
        let tag = env.tag_format.format(&next);

        if env.repo.find_tag_oid(&tag)?.is_some() {
            return Err(ReleaseError::tag(format!("Tag '{}' already exists", tag)));
        }

        debug!(%bump, version = %next, %tag, "next release computed");
        ctx.next_version = Some(next);
        ctx.git_tag = Some(tag);
        Ok(ctx)
    }
}
