//! Release context passed from step to step
//!
//! A [ReleaseContext] is created once per run, moved into each step and
//! handed back with more fields filled in. Steps only ever add to it.

use crate::domain::{BranchRule, VersionBump};
use crate::git::CommitInfo;
use regex::{Captures, Regex};
use semver::Version;
use std::collections::HashMap;
use std::path::PathBuf;

/// The most recent release found on the branch's release line
#[derive(Debug, Clone, PartialEq)]
pub struct LastRelease {
    pub version: Version,
    pub git_tag: String,
    pub git_head: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReleaseContext {
    pub branch: String,
    pub channel: Option<String>,
    pub is_prerelease: bool,
    pub prerelease_id: Option<String>,

    pub last_release: Option<LastRelease>,
    /// Highest stable release reachable from the branch
    pub last_stable: Option<Version>,
    /// Commits since the last release, oldest first
    pub commits: Vec<CommitInfo>,

    /// Set once a commit analysis has run, even if it found nothing to release
    pub analyzed: bool,
    pub release_type: Option<VersionBump>,
    pub next_version: Option<Version>,
    pub git_tag: Option<String>,
    pub notes: String,

    pub changelog_file: Option<PathBuf>,
    pub release_commit: Option<String>,
    pub published: bool,
}

impl ReleaseContext {
    /// Fresh context for a run on `branch` governed by `rule`
    pub fn new(branch: impl Into<String>, rule: &BranchRule) -> Self {
        let branch = branch.into();
        ReleaseContext {
            prerelease_id: rule.prerelease_id(&branch),
            channel: rule.channel.clone(),
            is_prerelease: rule.prerelease,
            branch,
            ..Default::default()
        }
    }

    /// True when analysis has run and decided there is nothing to release
    pub fn is_no_release(&self) -> bool {
        self.analyzed && self.next_version.is_none()
    }

    fn placeholders(&self) -> Vec<(&'static str, String)> {
        let opt = |v: Option<String>| v.unwrap_or_default();
        vec![
            ("version", opt(self.next_version.as_ref().map(Version::to_string))),
            ("tag", opt(self.git_tag.clone())),
            ("branch", self.branch.clone()),
            ("channel", opt(self.channel.clone())),
            ("release_type", opt(self.release_type.map(|t| t.to_string()))),
            (
                "last_version",
                opt(self.last_release.as_ref().map(|r| r.version.to_string())),
            ),
            (
                "last_tag",
                opt(self.last_release.as_ref().map(|r| r.git_tag.clone())),
            ),
            ("notes", self.notes.clone()),
        ]
    }

    /// Substitute `{version}`, `{tag}`, `{branch}`, `{channel}`,
    /// `{release_type}`, `{last_version}`, `{last_tag}` and `{notes}`.
    /// Unknown placeholders are left as written.
    pub fn render(&self, template: &str) -> String {
        self.render_with(template, &[])
    }

    /// Like [ReleaseContext::render], with `extra` placeholders taking
    /// precedence over the context's own.
    ///
    /// Substitution is a single pass: values are inserted verbatim, even
    /// when they contain placeholder syntax themselves.
    pub fn render_with(&self, template: &str, extra: &[(&str, &str)]) -> String {
        let mut values: HashMap<&str, String> = self.placeholders().into_iter().collect();
        for (key, value) in extra {
            values.insert(*key, value.to_string());
        }

        Regex::new(r"\{(\w+)\}")
            .map(|re| {
                re.replace_all(template, |caps: &Captures| match values.get(&caps[1]) {
                    Some(value) => value.clone(),
                    None => caps[0].to_string(),
                })
                .into_owned()
            })
            .unwrap_or_else(|_| template.to_string())
    }

    /// Environment exported to commands run by the pipeline
    ///
    /// Maps context fields to RELEASE_* environment variables; unset fields
    /// are exported as empty strings.
    pub fn to_env_vars(&self) -> HashMap<String, String> {
        self.placeholders()
            .into_iter()
            .map(|(key, value)| (format!("RELEASE_{}", key.to_uppercase()), value))
            .chain([(
                "RELEASE_PRERELEASE".to_string(),
                self.is_prerelease.to_string(),
            )])
            .collect()
    }
}
