//! Table of contents built from article headings

use lazy_static::lazy_static;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref NON_WORD: Regex = Regex::new(r"[^\w-]").unwrap();
}

/// One heading in the table of contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// Whether a heading level is listed in the table of contents
pub(crate) fn in_toc(level: HeadingLevel) -> bool {
    matches!(level, HeadingLevel::H2 | HeadingLevel::H3 | HeadingLevel::H4)
}

/// Turn heading text into an anchor id
pub fn heading_id(text: &str) -> String {
    let lowered = text.trim().to_lowercase();
    let dashed = WHITESPACE.replace_all(&lowered, "-");
    NON_WORD.replace_all(&dashed, "").into_owned()
}

/// Hands out unique anchor ids in document order
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    seen: HashMap<String, usize>,
}

impl IdAllocator {
    pub fn allocate(&mut self, text: &str) -> String {
        let base = heading_id(text);
        let base = if base.is_empty() {
            "section".to_string()
        } else {
            base
        };
        let count = self.seen.entry(base.clone()).or_insert(0);
        let id = if *count == 0 {
            base
        } else {
            format!("{}-{}", base, count)
        };
        *count += 1;
        id
    }
}

/// Extract h2-h4 headings from markdown
pub fn extract(markdown: &str) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    let mut ids = IdAllocator::default();
    let mut current: Option<(HeadingLevel, Option<String>, String)> = None;

    for event in Parser::new_ext(markdown, super::markdown::parser_options()) {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) if in_toc(level) => {
                current = Some((level, id.map(|id| id.to_string()), String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, buf)) = current.as_mut() {
                    buf.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, explicit_id, text)) = current.take() {
                    let text = text.trim().to_string();
                    let id = explicit_id.unwrap_or_else(|| ids.allocate(&text));
                    entries.push(TocEntry {
                        id,
                        text,
                        level: level as u8,
                    });
                }
            }
            _ => {}
        }
    }

    entries
}
