use crate::context::ReleaseContext;
use crate::domain::ParsedCommit;
use crate::error::Result;
use crate::git::CommitInfo;
use crate::steps::{require_version, ExecuteStep, StepEnv};
use serde::Deserialize;
use tracing::debug;

/// Commit types that get a section in the notes, in display order
const SECTIONS: [(&str, &str); 4] = [
    ("feat", "Features"),
    ("fix", "Bug Fixes"),
    ("perf", "Performance Improvements"),
    ("revert", "Reverts"),
];

/// Renders markdown release notes from the analyzed commits
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ReleaseNotesGenerator {
    /// Overrides the top-level `repository_url` for links
    pub repository_url: Option<String>,
    /// Append the abbreviated commit hash to each entry
    pub include_hashes: bool,
}

impl Default for ReleaseNotesGenerator {
    fn default() -> Self {
        ReleaseNotesGenerator {
            repository_url: None,
            include_hashes: true,
        }
    }
}

impl ReleaseNotesGenerator {
    fn entry(
        &self,
        parsed: &ParsedCommit,
        text: &str,
        commit: &CommitInfo,
        url: Option<&str>,
    ) -> String {
        let mut line = String::from("* ");
        if let Some(scope) = &parsed.scope {
            line.push_str(&format!("**{}:** ", scope));
        }
        line.push_str(text);
        if self.include_hashes {
            let reference = match url {
                Some(url) => format!("[{}]({}/commit/{})", commit.short_hash(), url, commit.hash),
                None => commit.short_hash().to_string(),
            };
            line.push_str(&format!(" ({})", reference));
        }
        line
    }

    /// Build the notes for `ctx`, dated `date`
    pub fn render(
        &self,
        ctx: &ReleaseContext,
        version: &str,
        tag: &str,
        date: &str,
        url: Option<&str>,
    ) -> String {
        let url = url.map(|u| u.trim_end_matches('/'));

        let heading = match (url, &ctx.last_release) {
            (Some(url), Some(last)) => format!(
                "## [{}]({}/compare/{}...{}) ({})",
                version, url, last.git_tag, tag, date
            ),
            _ => format!("## {} ({})", version, date),
        };

        let parsed: Vec<(ParsedCommit, &CommitInfo)> = ctx
            .commits
            .iter()
            .map(|commit| (ParsedCommit::parse(&commit.message), commit))
            .collect();

        let mut sections = Vec::new();

        let breaking: Vec<String> = parsed
            .iter()
            .filter(|(p, _)| p.is_breaking_change)
            .map(|(p, c)| {
                let text = p.breaking_notes.as_deref().unwrap_or(&p.description);
                self.entry(p, text, c, url)
            })
            .collect();
        if !breaking.is_empty() {
            sections.push(format!("### ⚠ BREAKING CHANGES\n\n{}", breaking.join("\n")));
        }

        for (commit_type, title) in SECTIONS {
            let entries: Vec<String> = parsed
                .iter()
                .filter(|(p, _)| {
                    p.r#type == commit_type || (commit_type == "feat" && p.r#type == "feature")
                })
                .map(|(p, c)| self.entry(p, &p.description, c, url))
                .collect();
            if !entries.is_empty() {
                sections.push(format!("### {}\n\n{}", title, entries.join("\n")));
            }
        }

        let mut notes = heading;
        for section in sections {
            notes.push_str("\n\n");
            notes.push_str(&section);
        }
        notes.push('\n');
        notes
    }
}

impl ExecuteStep for ReleaseNotesGenerator {
    const NAME: &'static str = "release-notes-generator";

    fn execute(&self, mut ctx: ReleaseContext, env: &StepEnv<'_>) -> Result<ReleaseContext> {
        let (version, tag) = require_version(&ctx, Self::NAME)?;
        let (version, tag) = (version.to_string(), tag.to_string());
        let url = self.repository_url.as_deref().or(env.repository_url);
        let date = env.release_date.format("%Y-%m-%d").to_string();

        let notes = self.render(&ctx, &version, &tag, &date, url);
        debug!(lines = notes.lines().count(), "release notes generated");
        ctx.notes = notes;
        Ok(ctx)
    }
}
