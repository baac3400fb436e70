use crate::domain::{BranchRule, TagFormat};
use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File names searched for in the project directory, in order
pub const CONFIG_FILE_NAMES: [&str; 2] = [".releaserc.toml", ".releaserc.json"];

/// Represents the complete configuration for git-release.
///
/// Contains the branch rules, the ordered step list, tag formatting and
/// runtime behavior options. Immutable once loaded.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ReleaseConfig {
    #[serde(default = "default_branches")]
    pub branches: Vec<BranchRule>,

    #[serde(default = "default_plugins")]
    pub plugins: Vec<StepConfig>,

    #[serde(default = "default_tag_format")]
    pub tag_format: String,

    #[serde(default = "default_initial_version")]
    pub initial_version: String,

    /// Web URL of the repository, used for links in release notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_url: Option<String>,

    #[serde(default)]
    pub behavior: BehaviorConfig,
}

/// A configured pipeline step: a step name plus loosely-typed options.
///
/// Deserializes from a bare name (`"changelog"`), a `[name, options]` pair,
/// or a `{ name, options }` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawStepConfig")]
pub struct StepConfig {
    pub name: String,
    pub options: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStepConfig {
    Name(String),
    Pair(String, Map<String, Value>),
    Table {
        name: String,
        #[serde(default)]
        options: Map<String, Value>,
    },
}

impl From<RawStepConfig> for StepConfig {
    fn from(raw: RawStepConfig) -> Self {
        match raw {
            RawStepConfig::Name(name) => StepConfig::new(name),
            RawStepConfig::Pair(name, options) | RawStepConfig::Table { name, options } => {
                StepConfig { name, options }
            }
        }
    }
}

impl StepConfig {
    /// A step with no options
    pub fn new(name: impl Into<String>) -> Self {
        StepConfig {
            name: name.into(),
            options: Map::new(),
        }
    }

    /// A step with options given as a JSON object; non-object values are
    /// treated as no options
    pub fn with_options(name: impl Into<String>, options: Value) -> Self {
        StepConfig {
            name: name.into(),
            options: match options {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }
    }
}

/// Configuration for behavior customization.
///
/// Controls how the runner talks to the remote without affecting version analysis.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BehaviorConfig {
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Fetch branches and tags from `remote` before looking for the last release
    #[serde(default)]
    pub fetch: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        BehaviorConfig {
            remote: default_remote(),
            fetch: false,
        }
    }
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_tag_format() -> String {
    "v{version}".to_string()
}

fn default_initial_version() -> String {
    "1.0.0".to_string()
}

/// Returns the default branch rules: stable releases from `main`,
/// prereleases from `beta` on the `beta` channel.
fn default_branches() -> Vec<BranchRule> {
    vec![
        BranchRule::release("main"),
        BranchRule::prerelease("beta", Some("beta")),
    ]
}

/// Returns the default pipeline.
fn default_plugins() -> Vec<StepConfig> {
    vec![
        StepConfig::with_options(
            "commit-analyzer",
            json!({
                "release_rules": [
                    { "subject": "*[force release]*", "release": "patch" }
                ]
            }),
        ),
        StepConfig::new("release-notes-generator"),
        StepConfig::new("changelog"),
        StepConfig::with_options("git", json!({ "assets": ["CHANGELOG.md"] })),
        StepConfig::new("publish"),
    ]
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        ReleaseConfig {
            branches: default_branches(),
            plugins: default_plugins(),
            tag_format: default_tag_format(),
            initial_version: default_initial_version(),
            repository_url: None,
            behavior: BehaviorConfig::default(),
        }
    }
}

impl ReleaseConfig {
    /// Check everything that can be checked without running a step.
    ///
    /// Step names and options are checked separately when the pipeline is
    /// resolved.
    pub fn validate(&self) -> Result<()> {
        if self.branches.is_empty() {
            return Err(ReleaseError::config("At least one branch must be configured"));
        }

        let mut seen = HashSet::new();
        for rule in &self.branches {
            if rule.name.trim().is_empty() {
                return Err(ReleaseError::config("Branch names must not be empty"));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(ReleaseError::config(format!(
                    "Branch '{}' is configured more than once",
                    rule.name
                )));
            }
        }

        self.tag_format()?;
        self.initial_version()?;
        Ok(())
    }

    pub fn tag_format(&self) -> Result<TagFormat> {
        TagFormat::new(self.tag_format.as_str())
            .map_err(|e| ReleaseError::config(e.to_string()))
    }

    /// The version used for the first release; must be a plain `X.Y.Z`
    pub fn initial_version(&self) -> Result<semver::Version> {
        let version = crate::domain::version::parse(&self.initial_version)
            .map_err(|e| ReleaseError::config(e.to_string()))?;
        if !version.pre.is_empty() || !version.build.is_empty() {
            return Err(ReleaseError::config(format!(
                "initial_version '{}' must not carry prerelease or build metadata",
                self.initial_version
            )));
        }
        Ok(version)
    }
}

/// Parse configuration text; `.json` paths are read as JSON, anything else as TOML
pub fn parse_config(contents: &str, path: &Path) -> Result<ReleaseConfig> {
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let config: ReleaseConfig = if is_json {
        serde_json::from_str(contents).map_err(|e| {
            ReleaseError::config(format!("Invalid JSON in {}: {}", path.display(), e))
        })?
    } else {
        toml::from_str(contents).map_err(|e| {
            ReleaseError::config(format!("Invalid TOML in {}: {}", path.display(), e))
        })?
    };

    config.validate()?;
    Ok(config)
}

/// Locate the configuration file for a project directory.
///
/// Search order:
/// 1. `.releaserc.toml` then `.releaserc.json` in `project_dir`
/// 2. `git-release/releaserc.toml` in the user config directory
pub fn find_config_file(project_dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|path| path.is_file())
        .or_else(|| {
            dirs::config_dir()
                .map(|dir| dir.join("git-release").join("releaserc.toml"))
                .filter(|path| path.is_file())
        })
}

/// Loads configuration from file or returns defaults.
///
/// An explicit `config_path` must exist. Otherwise the file found by
/// [find_config_file] is used, falling back to [ReleaseConfig::default].
///
/// # Returns
/// * `Err` - If a file exists but cannot be read, parsed or validated
pub fn load_config(config_path: Option<&Path>, project_dir: &Path) -> Result<ReleaseConfig> {
    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(project_dir),
    };

    let Some(path) = path else {
        debug!("no configuration file found, using defaults");
        return Ok(ReleaseConfig::default());
    };

    debug!(path = %path.display(), "loading configuration");
    let contents = fs::read_to_string(&path).map_err(|e| {
        ReleaseError::config(format!("Cannot read {}: {}", path.display(), e))
    })?;
    parse_config(&contents, &path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ReleaseConfig::default();
        config.validate().unwrap();
        assert_eq!(config.branches.len(), 2);
        assert_eq!(config.plugins[0].name, "commit-analyzer");
        assert_eq!(config.behavior.remote, "origin");
    }

    #[test]
    fn test_parse_step_forms_toml() {
        let config = parse_config(
            r#"
plugins = [
    "commit-analyzer",
    ["exec", { cmd = "echo {version}" }],
    { name = "notify", options = { message = "released" } },
]
"#,
            Path::new(".releaserc.toml"),
        )
        .unwrap();

        assert_eq!(config.plugins.len(), 3);
        assert!(config.plugins[0].options.is_empty());
        assert_eq!(config.plugins[1].name, "exec");
        assert_eq!(config.plugins[1].options["cmd"], json!("echo {version}"));
        assert_eq!(config.plugins[2].options["message"], json!("released"));
    }

    #[test]
    fn test_parse_json() {
        let config = parse_config(
            r#"{
                "branches": ["main", {"name": "next", "prerelease": true}],
                "plugins": ["commit-analyzer", ["changelog", {"changelog_file": "HISTORY.md"}]],
                "tag_format": "release-{version}"
            }"#,
            Path::new(".releaserc.json"),
        )
        .unwrap();

        assert_eq!(config.branches[1], BranchRule::prerelease("next", None));
        assert_eq!(config.plugins[1].options["changelog_file"], json!("HISTORY.md"));
        assert_eq!(config.tag_format, "release-{version}");
    }

    #[test]
    fn test_duplicate_branches_rejected() {
        let err = parse_config(r#"branches = ["main", "main"]"#, Path::new("x.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_empty_branches_rejected() {
        assert!(parse_config("branches = []", Path::new("x.toml")).is_err());
    }

    #[test]
    fn test_invalid_tag_format_rejected() {
        let err = parse_config(r#"tag_format = "release""#, Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ReleaseError::Config(_)));
    }

    #[test]
    fn test_invalid_initial_version_rejected() {
        assert!(parse_config(r#"initial_version = "1.0""#, Path::new("x.toml")).is_err());
        assert!(parse_config(r#"initial_version = "1.0.0-rc.1""#, Path::new("x.toml")).is_err());
    }

    #[test]
    fn test_unknown_top_level_key_rejected() {
        assert!(parse_config(r#"plugin = ["changelog"]"#, Path::new("x.toml")).is_err());
    }
}
