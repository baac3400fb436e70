use std::fmt;

/// Non-fatal conditions met while preparing or running a release.
/// These are reported to the user but never abort the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryWarning {
    /// No new commits since the latest release tag
    NoNewCommits {
        latest_tag: String,
        current_commit_hash: String,
    },
    /// Fetch operation failed; local refs are used as-is
    FetchFailed { remote: String, reason: String },
    /// A configured asset does not exist and was left out of the release commit
    MissingAsset { path: String },
    /// A step that needs release notes ran before any were generated
    EmptyNotes { step: String },
}

impl fmt::Display for BoundaryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryWarning::NoNewCommits {
                latest_tag,
                current_commit_hash,
            } => {
                let short_hash = if current_commit_hash.len() > 7 {
                    &current_commit_hash[..7]
                } else {
                    current_commit_hash.as_str()
                };
                write!(
                    f,
                    "No new commits since tag '{}' (current: {})",
                    latest_tag, short_hash
                )
            }
            BoundaryWarning::FetchFailed { remote, reason } => {
                write!(
                    f,
                    "Could not fetch from remote '{}': {}. Using local data.",
                    remote, reason
                )
            }
            BoundaryWarning::MissingAsset { path } => {
                write!(f, "Asset '{}' does not exist and was skipped", path)
            }
            BoundaryWarning::EmptyNotes { step } => {
                write!(
                    f,
                    "Step '{}' found no release notes; add 'release-notes-generator' before it",
                    step
                )
            }
        }
    }
}
