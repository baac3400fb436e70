use crate::domain::prerelease::identifier_for_branch;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Release rule for a source branch.
///
/// Deserializes from either a bare branch name (`"main"`) or a table
/// (`{ name = "beta", channel = "beta", prerelease = true }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawBranchRule")]
pub struct BranchRule {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub prerelease: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBranchRule {
    Name(String),
    Rule {
        name: String,
        #[serde(default)]
        channel: Option<String>,
        #[serde(default)]
        prerelease: bool,
    },
}

impl From<RawBranchRule> for BranchRule {
    fn from(raw: RawBranchRule) -> Self {
        match raw {
            RawBranchRule::Name(name) => BranchRule::release(name),
            RawBranchRule::Rule {
                name,
                channel,
                prerelease,
            } => BranchRule {
                name,
                channel,
                prerelease,
            },
        }
    }
}

impl BranchRule {
    /// A stable release branch on the default channel
    pub fn release(name: impl Into<String>) -> Self {
        BranchRule {
            name: name.into(),
            channel: None,
            prerelease: false,
        }
    }

    /// A prerelease branch publishing to `channel`
    pub fn prerelease(name: impl Into<String>, channel: Option<&str>) -> Self {
        BranchRule {
            name: name.into(),
            channel: channel.map(str::to_string),
            prerelease: true,
        }
    }

    /// Check whether this rule applies to `branch`
    pub fn matches(&self, branch: &str) -> bool {
        wildcard_match(&self.name, branch)
    }

    /// Pre-release identifier used for versions cut from `branch`
    pub fn prerelease_id(&self, branch: &str) -> Option<String> {
        self.prerelease.then(|| identifier_for_branch(branch))
    }
}

/// Match `text` against `pattern`, where `*` matches any run of characters
/// and everything else is literal.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == text;
    }

    let regex_pattern = regex::escape(pattern).replace(r"\*", ".*");
    Regex::new(&format!("^{}$", regex_pattern))
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// Find the first rule that applies to `branch`
pub fn find_rule<'a>(rules: &'a [BranchRule], branch: &str) -> Option<&'a BranchRule> {
    rules.iter().find(|rule| rule.matches(branch))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let rule = BranchRule::release("main");
        assert!(rule.matches("main"));
        assert!(!rule.matches("main2"));
        assert!(!rule.matches("develop"));
    }

    #[test]
    fn test_wildcard_match() {
        let rule = BranchRule::release("release/*");
        assert!(rule.matches("release/1.x"));
        assert!(!rule.matches("hotfix/1.x"));
    }

    #[test]
    fn test_wildcard_escapes_regex_characters() {
        let rule = BranchRule::release("v1.*");
        assert!(rule.matches("v1.x"));
        assert!(!rule.matches("v1x"));
    }

    #[test]
    fn test_wildcard_match_brackets() {
        assert!(wildcard_match("*[force release]*", "fix typo [force release]"));
        assert!(!wildcard_match("*[force release]*", "fix typo"));
    }

    #[test]
    fn test_prerelease_id() {
        assert_eq!(BranchRule::release("main").prerelease_id("main"), None);
        assert_eq!(
            BranchRule::prerelease("beta", Some("beta")).prerelease_id("beta"),
            Some("beta".to_string())
        );
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![
            BranchRule::prerelease("next/*", Some("next")),
            BranchRule::release("*"),
        ];
        assert!(find_rule(&rules, "next/feature").unwrap().prerelease);
        assert!(!find_rule(&rules, "main").unwrap().prerelease);
    }

    #[test]
    fn test_no_matching_rule() {
        let rules = vec![BranchRule::release("main")];
        assert!(find_rule(&rules, "feature/x").is_none());
    }

    #[test]
    fn test_deserialize_both_forms() {
        let rules: Vec<BranchRule> = serde_json::from_str(
            r#"["main", {"name": "beta", "channel": "beta", "prerelease": true}]"#,
        )
        .unwrap();
        assert_eq!(rules[0], BranchRule::release("main"));
        assert_eq!(rules[1], BranchRule::prerelease("beta", Some("beta")));
    }
}
