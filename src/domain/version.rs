use crate::domain::prerelease::PreRelease;
use crate::error::{ReleaseError, Result};
use semver::{Prerelease, Version};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version bump type decision
///
/// Ordered so that the highest-impact bump compares greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionBump {
    Patch,
    Minor,
    Major,
}

impl VersionBump {
    pub fn name(&self) -> &'static str {
        match self {
            VersionBump::Patch => "patch",
            VersionBump::Minor => "minor",
            VersionBump::Major => "major",
        }
    }
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse a plain semantic version (no tag prefix)
pub fn parse(s: &str) -> Result<Version> {
    Version::parse(s.trim())
        .map_err(|e| ReleaseError::version(format!("Invalid version '{}': {}", s, e)))
}

/// The release part of a version, with prerelease and build metadata dropped
pub fn base(version: &Version) -> Version {
    Version::new(version.major, version.minor, version.patch)
}

/// Bump version according to bump type
///
/// - **Major**: major += 1, minor = 0, patch = 0
/// - **Minor**: minor += 1, patch = 0
/// - **Patch**: patch += 1
pub fn bump(version: &Version, bump_type: VersionBump) -> Version {
    match bump_type {
        VersionBump::Major => Version::new(version.major + 1, 0, 0),
        VersionBump::Minor => Version::new(version.major, version.minor + 1, 0),
        VersionBump::Patch => Version::new(version.major, version.minor, version.patch + 1),
    }
}

/// Compute the next release version.
///
/// `last_stable` is the highest stable release reachable from the branch and
/// `last_release` the highest release of the branch's own line (which may be
/// a prerelease). With no stable release yet, `initial` becomes the target.
///
/// On a prerelease branch the iteration of the previous prerelease is
/// incremented as long as its base version already covers the bump; otherwise
/// a new `<target>-<id>.1` line starts.
pub fn next_version(
    last_stable: Option<&Version>,
    last_release: Option<&Version>,
    bump_type: VersionBump,
    prerelease_id: Option<&str>,
    initial: &Version,
) -> Result<Version> {
    let target = match last_stable {
        Some(stable) => bump(stable, bump_type),
        None => base(initial),
    };

    let Some(id) = prerelease_id else {
        return Ok(target);
    };

    if let Some(last) = last_release.filter(|v| !v.pre.is_empty()) {
        let previous = PreRelease::parse(last.pre.as_str())?;
        if previous.identifier == id && base(last) >= target {
            let mut next = base(last);
            next.pre = previous.increment_iteration().to_semver()?;
            return Ok(next);
        }
    }

    let mut next = target;
    next.pre = PreRelease::new(id, Some(1)).to_semver()?;
    Ok(next)
}

/// Whether a version belongs to the release line of a branch.
///
/// Release branches only see stable versions; prerelease branches see stable
/// versions plus prereleases carrying their own identifier.
pub fn belongs_to_line(version: &Version, prerelease_id: Option<&str>) -> bool {
    if version.pre == Prerelease::EMPTY {
        return true;
    }
    match prerelease_id {
        Some(id) => PreRelease::parse(version.pre.as_str())
            .map(|pre| pre.identifier == id)
            .unwrap_or(false),
        None => false,
    }
}
