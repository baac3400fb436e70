use regex::Regex;

/// Footer tokens that mark a breaking change
const BREAKING_MARKERS: [&str; 2] = ["BREAKING CHANGE:", "BREAKING-CHANGE:"];

/// Parsed representation of a conventional commit message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    pub r#type: String,
    pub scope: Option<String>,
    pub description: String,
    pub body: Option<String>,
    pub is_breaking_change: bool,
    /// Text following a `BREAKING CHANGE:` footer, if any
    pub breaking_notes: Option<String>,
}

impl ParsedCommit {
    /// Parse a commit message according to conventional commits spec
    /// Supports formats:
    /// - type(scope)!: description
    /// - type(scope): description
    /// - type!: description
    /// - type: description
    /// - non-conventional text (parsed as a `chore`)
    ///
    /// Only the first line is matched against the header grammar; the rest
    /// of the message is the body, scanned for breaking-change footers.
    pub fn parse(message: &str) -> Self {
        let message = message.trim();
        let (header, rest) = match message.split_once('\n') {
            Some((header, rest)) => (header.trim(), rest.trim()),
            None => (message, ""),
        };
        let body = (!rest.is_empty()).then(|| rest.to_string());
        let breaking_notes = extract_breaking_notes(rest);

        let captures = Regex::new(
            r"^(?P<type>[A-Za-z]+)(?:\((?P<scope>[^)]*)\))?(?P<bang>!)?:\s*(?P<description>.*)$",
        )
        .ok()
        .and_then(|re| re.captures(header));

        let Some(captures) = captures else {
            // Default: non-conventional commit
            return ParsedCommit {
                r#type: "chore".to_string(),
                scope: None,
                description: header.to_string(),
                body,
                is_breaking_change: breaking_notes.is_some(),
                breaking_notes,
            };
        };

        let r#type = captures
            .name("type")
            .map(|m| m.as_str().to_lowercase())
            .unwrap_or_default();
        let scope = captures
            .name("scope")
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty());
        let description = captures
            .name("description")
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        let has_exclamation = captures.name("bang").is_some();

        ParsedCommit {
            r#type,
            scope,
            description,
            body,
            is_breaking_change: has_exclamation || breaking_notes.is_some(),
            breaking_notes,
        }
    }
}

fn extract_breaking_notes(body: &str) -> Option<String> {
    BREAKING_MARKERS.iter().find_map(|marker| {
        body.find(marker).map(|idx| {
            body[idx + marker.len()..]
                .lines()
                .take_while(|line| !line.trim().is_empty())
                .map(str::trim)
                .collect::<Vec<_>>()
                .join(" ")
        })
    })
}
