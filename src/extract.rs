//! Version-token extraction from raw schema content.
//!
//! The tracked schema files declare their version as a JSON member named
//! `$schemaVersion`. Extraction deliberately stays line-based instead of
//! parsing the whole document: historical revisions are frequently not valid
//! JSON, and a file with no declared version is a normal outcome, not a
//! fault.

use regex::Regex;
use std::sync::OnceLock;

/// Marker that identifies the version-declaration line.
const VERSION_MARKER: &str = "$schemaVersion";

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#""\$schemaVersion"\s*:\s*"([^"]+)""#).unwrap())
}

/// Extract the declared version token from raw schema file content.
///
/// Scans the content line by line, takes the first line containing the
/// marker, and applies the quoted-value pattern. Returns `None` when no such
/// line exists or the pattern does not match.
pub fn extract_version(content: &str) -> Option<String> {
    let line = content.lines().find(|line| line.contains(VERSION_MARKER))?;
    version_pattern()
        .captures(line)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_quoted_version() {
        let content = r#"{
  "$schema": "http://json-schema.org/schema#",
  "$schemaVersion": "0.1.2",
  "title": "WeatherObserved"
}"#;
        assert_eq!(extract_version(content), Some("0.1.2".to_string()));
    }

    #[test]
    fn tolerates_loose_whitespace() {
        let content = "\"$schemaVersion\"   :   \"2.0\"";
        assert_eq!(extract_version(content), Some("2.0".to_string()));
    }

    #[test]
    fn absent_marker_is_none() {
        let content = r#"{ "title": "no version declared here" }"#;
        assert_eq!(extract_version(content), None);
    }

    #[test]
    fn marker_without_matching_pattern_is_none() {
        // Marker present but the value is not a quoted string.
        let content = r#""$schemaVersion": 3"#;
        assert_eq!(extract_version(content), None);
    }

    #[test]
    fn first_marker_line_wins() {
        let content = "\"$schemaVersion\": \"1.0\"\n\"$schemaVersion\": \"9.9\"";
        assert_eq!(extract_version(content), Some("1.0".to_string()));
    }

    #[test]
    fn empty_content_is_none() {
        assert_eq!(extract_version(""), None);
    }
}
