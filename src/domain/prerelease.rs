//! Pre-release identifiers for prerelease branches
//!
//! A prerelease version carries an identifier taken from its branch (e.g.
//! `beta`) and an iteration number: `1.2.0-beta.3`.
//! See https://semver.org/#spec-item-9

use crate::error::{ReleaseError, Result};
use std::fmt;

/// Pre-release identifier with optional iteration number
///
/// # Examples
/// - "beta" -> PreRelease { identifier: "beta", iteration: None }
/// - "beta.1" -> PreRelease { identifier: "beta", iteration: Some(1) }
/// - "rc.3" -> PreRelease { identifier: "rc", iteration: Some(3) }
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreRelease {
    pub identifier: String,
    pub iteration: Option<u32>,
}

impl PreRelease {
    pub fn new(identifier: impl Into<String>, iteration: Option<u32>) -> Self {
        PreRelease {
            identifier: identifier.into(),
            iteration,
        }
    }

    /// Parse a pre-release string such as "beta", "beta.1" or "next-major.5"
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(ReleaseError::version("Empty pre-release identifier"));
        }

        let mut parts = s.splitn(2, '.');
        let identifier = parts.next().unwrap_or_default();

        if identifier.is_empty() || !is_valid_identifier(identifier) {
            return Err(ReleaseError::version(format!(
                "Invalid pre-release identifier: '{}'",
                s
            )));
        }

        let iteration = match parts.next() {
            Some(n) => Some(n.parse::<u32>().map_err(|_| {
                ReleaseError::version(format!("Invalid iteration number: '{}'", n))
            })?),
            None => None,
        };

        Ok(PreRelease::new(identifier, iteration))
    }

    /// Increment the iteration number
    ///
    /// If iteration is None, returns Some(1). Otherwise increments by 1.
    pub fn increment_iteration(&self) -> Self {
        PreRelease {
            identifier: self.identifier.clone(),
            iteration: Some(self.iteration.map_or(1, |n| n + 1)),
        }
    }

    pub fn to_semver(&self) -> Result<semver::Prerelease> {
        semver::Prerelease::new(&self.to_string()).map_err(|e| {
            ReleaseError::version(format!("Invalid pre-release '{}': {}", self, e))
        })
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier)?;
        if let Some(iter) = self.iteration {
            write!(f, ".{}", iter)?;
        }
        Ok(())
    }
}

fn is_valid_identifier(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Derive a pre-release identifier from a branch name.
///
/// Characters that semver does not allow in identifiers become `-`, so
/// `release/next` yields `release-next`.
pub fn identifier_for_branch(branch: &str) -> String {
    branch
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identifier_only() {
        let pr = PreRelease::parse("beta").unwrap();
        assert_eq!(pr.identifier, "beta");
        assert_eq!(pr.iteration, None);
    }

    #[test]
    fn test_parse_with_iteration() {
        let pr = PreRelease::parse("rc.3").unwrap();
        assert_eq!(pr.identifier, "rc");
        assert_eq!(pr.iteration, Some(3));
    }

    #[test]
    fn test_parse_hyphenated_identifier() {
        let pr = PreRelease::parse("next-major.5").unwrap();
        assert_eq!(pr.identifier, "next-major");
        assert_eq!(pr.iteration, Some(5));
    }

    #[test]
    fn test_parse_empty_fails() {
        assert!(PreRelease::parse("").is_err());
    }

    #[test]
    fn test_parse_invalid_iteration() {
        assert!(PreRelease::parse("beta.x").is_err());
        assert!(PreRelease::parse("beta.1.2").is_err());
    }

    #[test]
    fn test_increment_from_none() {
        let pr = PreRelease::new("alpha", None).increment_iteration();
        assert_eq!(pr.iteration, Some(1));
    }

    #[test]
    fn test_increment_existing() {
        let pr = PreRelease::parse("beta.7").unwrap().increment_iteration();
        assert_eq!(pr.to_string(), "beta.8");
    }

    #[test]
    fn test_to_semver() {
        let pre = PreRelease::new("beta", Some(2)).to_semver().unwrap();
        assert_eq!(pre.as_str(), "beta.2");
    }

    #[test]
    fn test_identifier_for_branch() {
        assert_eq!(identifier_for_branch("beta"), "beta");
        assert_eq!(identifier_for_branch("release/next"), "release-next");
        assert_eq!(identifier_for_branch("feat_x.y"), "feat-x-y");
    }
}
