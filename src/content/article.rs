//! Article records produced by the loader

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::frontmatter::parse_date_string;
use super::toc::TocEntry;

/// Lightweight record used by list and search views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    /// File name without the `.md` extension
    pub slug: String,

    pub title: String,

    /// Publication date as written in the front-matter
    pub date: String,

    pub category: String,

    pub tags: Vec<String>,

    /// Summary text, empty when the front-matter has none
    pub excerpt: String,

    /// Origin feed (hackernews, reddit, ...)
    pub source: String,

    /// Word count recorded by the generator, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
}

impl ArticleMetadata {
    /// Parsed publication date, `None` when missing or unparseable
    pub fn published_at(&self) -> Option<DateTime<Local>> {
        parse_date_string(&self.date)
    }

    /// Whether the query text occurs in the title, the excerpt or any tag.
    /// `needle` must already be lowercase.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.excerpt.to_lowercase().contains(needle)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
    }
}

/// A fully rendered article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(flatten)]
    pub meta: ArticleMetadata,

    /// Rendered, sanitized HTML body
    pub content: String,

    pub time: Option<String>,

    pub source_url: Option<String>,

    pub engagement_score: f64,

    /// Table of contents (h2 to h4)
    pub toc: Vec<TocEntry>,
}

impl Article {
    pub fn slug(&self) -> &str {
        &self.meta.slug
    }

    pub fn title(&self) -> &str {
        &self.meta.title
    }
}

/// Sort records newest first. Undated records go last; ties keep their order.
pub fn sort_by_date_desc(records: &mut [ArticleMetadata]) {
    records.sort_by_cached_key(|record| std::cmp::Reverse(record.published_at()));
}
