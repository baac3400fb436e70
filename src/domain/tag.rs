use crate::error::{ReleaseError, Result};
use regex::Regex;
use semver::Version;

const PLACEHOLDER: &str = "{version}";

/// Tag naming pattern (e.g., "v{version}", "release-{version}")
#[derive(Debug, Clone)]
pub struct TagFormat {
    pattern: String,
    matcher: Regex,
}

impl TagFormat {
    /// Create a tag format; the pattern must contain exactly one `{version}`
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();

        if pattern.matches(PLACEHOLDER).count() != 1 {
            return Err(ReleaseError::tag(format!(
                "Tag format '{}' must contain exactly one {{version}} placeholder",
                pattern
            )));
        }

        let escaped = regex::escape(&pattern);
        let regex_pattern = escaped.replace(r"\{version\}", r"(?P<version>.+)");
        let matcher = Regex::new(&format!("^{}$", regex_pattern))
            .map_err(|e| ReleaseError::tag(format!("Invalid tag format '{}': {}", pattern, e)))?;

        Ok(TagFormat { pattern, matcher })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Format a version according to pattern
    /// Example: pattern="v{version}", version=1.2.3 -> "v1.2.3"
    pub fn format(&self, version: &Version) -> String {
        self.pattern.replace(PLACEHOLDER, &version.to_string())
    }

    /// Extract the version from a tag name produced by this format.
    ///
    /// Returns `None` when the tag does not follow the pattern or the
    /// embedded part is not a semantic version.
    pub fn parse(&self, tag: &str) -> Option<Version> {
        let captures = self.matcher.captures(tag)?;
        Version::parse(captures.name("version")?.as_str()).ok()
    }
}
