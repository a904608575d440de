//! Front-matter parsing

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Accepts any scalar and keeps its textual form; null becomes `None`
struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = Option<String>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string, number or boolean")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(Some(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        Ok(Some(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(Some(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(Some(value.to_string()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Ok(Some(value.to_string()))
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        Ok(Some(value.to_string()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }
}

/// A single scalar inside a list
struct Scalar(Option<String>);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScalarVisitor).map(Scalar)
    }
}

/// Custom deserializer for fields that should be text even when written as a number
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(ScalarVisitor)
}

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(vec![value.to_string()])
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
            Ok(vec![value])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(Scalar(item)) = seq.next_element::<Scalar>()? {
                if let Some(item) = item {
                    vec.push(item);
                }
            }
            Ok(vec)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Front-matter data from an article
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(deserialize_with = "scalar_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub date: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub time: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub source: Option<String>,
    /// The generator writes `url`; hand-written articles use `source_url`
    #[serde(deserialize_with = "scalar_string", alias = "url")]
    pub source_url: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub category: Option<String>,
    #[serde(deserialize_with = "string_or_vec")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub excerpt: Option<String>,
    pub engagement_score: Option<f64>,
    pub word_count: Option<usize>,

    /// Additional custom fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    ///
    /// Content without a front-matter block yields the default front-matter.
    /// A block that is present but cannot be parsed is an error.
    pub fn parse(content: &str) -> Result<(Self, &str)> {
        let content = content.trim_start_matches('\u{feff}').trim_start();

        // Check for YAML front-matter (---)
        if content.starts_with("---") {
            return Self::parse_yaml(content);
        }

        // Check for JSON front-matter (;;; or {"key":)
        if content.starts_with(";;;") || content.starts_with('{') {
            return Self::parse_json(content);
        }

        // No front-matter found
        Ok((FrontMatter::default(), content))
    }

    fn parse_yaml(content: &str) -> Result<(Self, &str)> {
        let rest = &content[3..]; // Skip opening ---
        let rest = rest.trim_start_matches(['\n', '\r']);

        let (yaml_content, remaining) = match rest.find("\n---") {
            Some(end_pos) => {
                let remaining = &rest[end_pos + 4..]; // Skip \n---
                (&rest[..end_pos], Some(remaining.trim_start_matches(['\n', '\r'])))
            }
            None => (rest, None),
        };

        // A leading thematic break followed by prose is body text, not metadata
        if !has_yaml_structure(yaml_content) {
            return Ok((FrontMatter::default(), content));
        }

        let Some(remaining) = remaining else {
            bail!("front-matter block is not closed");
        };

        let fm = serde_yaml::from_str::<FrontMatter>(yaml_content)
            .map_err(|e| anyhow!("Failed to parse YAML front-matter: {}", e))?;
        Ok((fm, remaining))
    }

    fn parse_json(content: &str) -> Result<(Self, &str)> {
        // JSON front-matter ends with ;;;
        if let Some(rest) = content.strip_prefix(";;;") {
            let end_pos = rest
                .find(";;;")
                .ok_or_else(|| anyhow!("JSON front-matter block is not closed"))?;
            let json_content = &rest[..end_pos];
            let remaining = &rest[end_pos + 3..];
            let remaining = remaining.trim_start_matches(['\n', '\r']);

            let fm: FrontMatter = serde_json::from_str(json_content)
                .map_err(|e| anyhow!("Failed to parse JSON front-matter: {}", e))?;

            return Ok((fm, remaining));
        }

        // Find matching closing brace
        let mut depth = 0;
        let mut end_pos = 0;
        for (i, c) in content.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end_pos = i + 1;
                        break;
                    }
                }
                _ => {}
            }
        }

        // Without a `;;;` fence a leading brace is only metadata if it is a JSON object
        if end_pos == 0 {
            return Ok((FrontMatter::default(), content));
        }

        let json_content = &content[..end_pos];
        let remaining = &content[end_pos..];
        let remaining = remaining.trim_start_matches(['\n', '\r']);

        match serde_json::from_str::<FrontMatter>(json_content) {
            Ok(fm) => Ok((fm, remaining)),
            Err(e) => {
                tracing::debug!("Leading braces are not JSON front-matter: {}", e);
                Ok((FrontMatter::default(), content))
            }
        }
    }

    /// Parse the date string into a DateTime
    pub fn parse_date(&self) -> Option<DateTime<Local>> {
        self.date.as_deref().and_then(parse_date_string)
    }
}

/// Whether a block between `---` fences looks like `key: value` metadata
fn has_yaml_structure(block: &str) -> bool {
    block.lines().any(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return false;
        }
        let Some(colon_pos) = trimmed.find(':') else {
            return false;
        };
        let key = &trimmed[..colon_pos];
        // Keys are simple identifiers; URL schemes are not keys
        let is_valid_key = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            && !matches!(key, "http" | "https" | "ftp");
        let after_colon = &trimmed[colon_pos + 1..];
        is_valid_key && (after_colon.is_empty() || after_colon.starts_with(' '))
    })
}

/// Parse a date string in various formats
pub fn parse_date_string(s: &str) -> Option<DateTime<Local>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // RFC 3339 / ISO 8601 with offset
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }

    let offset_formats = ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%z"];
    for fmt in offset_formats {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Local));
        }
    }

    let naive_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in naive_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Local.from_local_datetime(&dt).earliest();
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            let dt = d.and_hms_opt(0, 0, 0)?;
            return Local.from_local_datetime(&dt).earliest();
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Hello World
date: 2024-01-15 10:30:00
source: hackernews
category: AI
tags:
  - rust
  - llm
engagement_score: 342
---

This is the content.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Hello World"));
        assert_eq!(fm.source.as_deref(), Some("hackernews"));
        assert_eq!(fm.category.as_deref(), Some("AI"));
        assert_eq!(fm.tags, vec!["rust", "llm"]);
        assert_eq!(fm.engagement_score, Some(342.0));
        assert!(remaining.starts_with("This is the content."));
    }

    #[test]
    fn test_parse_generator_output() {
        // Shape written by the article generator: `url` key, isoformat date
        let content = r#"---
date: '2025-01-20T08:15:30.123456'
engagement_score: 87
source: reddit
tags:
- AI
- Security
title: 大模型安全的新进展
url: https://example.com/post
word_count: 1432
---

正文
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.source_url.as_deref(), Some("https://example.com/post"));
        assert_eq!(fm.word_count, Some(1432));
        assert_eq!(fm.tags, vec!["AI", "Security"]);
        let date = fm.parse_date().unwrap();
        assert_eq!(date.year(), 2025);
        assert_eq!(remaining.trim(), "正文");
    }

    #[test]
    fn test_parse_json_frontmatter() {
        let content = r#"{"title": "Test Post", "tags": ["a", "b"]}

This is content.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Test Post"));
        assert_eq!(fm.tags, vec!["a", "b"]);
        assert!(remaining.contains("This is content."));
    }

    #[test]
    fn test_parse_semicolon_json_frontmatter() {
        let content = ";;;\n{\"title\": \"Fenced\"}\n;;;\nBody";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Fenced"));
        assert_eq!(remaining, "Body");
    }

    #[test]
    fn test_scalar_fields_accept_numbers() {
        let content = "---\ntitle: 2024\ndate: 2024\ntags: [1, two, ~]\n---\nbody";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("2024"));
        assert_eq!(fm.date.as_deref(), Some("2024"));
        assert_eq!(fm.tags, vec!["1", "two"]);
    }

    #[test]
    fn test_null_fields_are_absent() {
        let content = "---\ntitle: Only title\ncategory:\ntags:\nexcerpt: ~\n---\nbody";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.category, None);
        assert!(fm.tags.is_empty());
        assert_eq!(fm.excerpt, None);
    }

    #[test]
    fn test_parse_single_string_tags() {
        let content = "---\ntitle: Single Tag Post\ntags: Notes\n---\n\nContent here.\n";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.tags, vec!["Notes"]);
    }

    #[test]
    fn test_no_frontmatter() {
        let (fm, remaining) = FrontMatter::parse("# Just markdown\n").unwrap();
        assert_eq!(fm.title, None);
        assert_eq!(remaining, "# Just markdown\n");
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let content = "---\ntitle: [unclosed\ndate: 2024-01-01\n---\nbody";
        assert!(FrontMatter::parse(content).is_err());
    }

    #[test]
    fn test_wrong_type_is_error() {
        let content = "---\ntitle: ok\nengagement_score: lots\n---\nbody";
        assert!(FrontMatter::parse(content).is_err());
    }

    #[test]
    fn test_unclosed_frontmatter_is_error() {
        let content = "---\ntitle: Never closed\ndate: 2024-01-01\n\nBody text";
        assert!(FrontMatter::parse(content).is_err());
    }

    #[test]
    fn test_markdown_separator_not_yaml() {
        let content = r#"
---

Some random text with markdown lists:
- Item 1
- Item 2

---
More content here.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title, None);
        assert!(remaining.contains("Some random text"));
    }

    #[test]
    fn test_leading_braces_not_json() {
        let content = "{curly} braces open this note.\n";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title, None);
        assert_eq!(remaining, content);

        let (_, remaining) = FrontMatter::parse("{ unbalanced note\n").unwrap();
        assert_eq!(remaining, "{ unbalanced note\n");
    }

    #[test]
    fn test_unclosed_json_fence_is_error() {
        assert!(FrontMatter::parse(";;;\n{\"title\": \"x\"}\n").is_err());
    }

    #[test]
    fn test_content_with_url_not_yaml() {
        let content = "\n---\n\nCheck out https://example.com/path\n\n---\nMore content.\n";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title, None);
        assert!(remaining.contains("https://example.com"));
    }

    #[test]
    fn test_parse_date_formats() {
        for input in [
            "2024-03-01",
            "2024/03/01",
            "2024-03-01 08:00",
            "2024-03-01 08:00:00",
            "2024-03-01T08:00:00",
            "2024-03-01T08:00:00.123456",
            "2024-03-01T08:00:00Z",
            "2024-03-01T08:00:00+08:00",
        ] {
            assert!(parse_date_string(input).is_some(), "failed on {}", input);
        }
        assert!(parse_date_string("").is_none());
        assert!(parse_date_string("yesterday").is_none());
    }

    #[test]
    fn test_parse_date_orders_with_offsets() {
        let a = parse_date_string("2024-03-01T00:00:00+08:00").unwrap();
        let b = parse_date_string("2024-03-01T00:00:00Z").unwrap();
        assert!(a < b);
    }
}
