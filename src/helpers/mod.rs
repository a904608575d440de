//! Display helpers
//!
//! Pure formatting functions for consumers of the query layer. They take
//! values out of article records and never modify the records themselves.

mod date;
mod reading;
mod source;

pub use date::*;
pub use reading::*;
pub use source::*;

use chrono::{DateTime, Local};

use crate::config::SiteConfig;
use crate::content::{Article, ArticleMetadata};

/// Display values derived from an article record
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DisplayInfo {
    pub read_minutes: usize,
    pub relative_date: String,
    pub source_label: String,
    pub source_tone: &'static str,
    pub trending: bool,
}

/// Collection of display helpers bound to a site configuration
pub struct Helpers {
    words_per_minute: usize,
}

impl Helpers {
    /// Create a new helpers instance
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            words_per_minute: config.words_per_minute,
        }
    }

    /// Reading time for a list entry; entries without a word count assume 500 words
    pub fn read_time(&self, meta: &ArticleMetadata) -> usize {
        read_time(meta.word_count.unwrap_or(500), self.words_per_minute)
    }

    /// Display values for a list entry
    pub fn card(&self, meta: &ArticleMetadata, now: &DateTime<Local>) -> DisplayInfo {
        DisplayInfo {
            read_minutes: self.read_time(meta),
            relative_date: humanize_date(&meta.date, now),
            source_label: source_label(&meta.source),
            source_tone: source_tone(&meta.source),
            trending: false,
        }
    }

    /// Display values for a full article
    pub fn detail(&self, article: &Article, now: &DateTime<Local>) -> DisplayInfo {
        DisplayInfo {
            trending: is_trending(article.engagement_score),
            ..self.card(&article.meta, now)
        }
    }
}

impl Default for Helpers {
    fn default() -> Self {
        Self::new(&SiteConfig::default())
    }
}
