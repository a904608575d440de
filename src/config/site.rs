//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Category given to articles whose front-matter has none
pub const DEFAULT_CATEGORY: &str = "科技";

/// Characters kept when an excerpt is derived from the article body
pub const DEFAULT_EXCERPT_LENGTH: usize = 120;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,

    // Content store, relative to the base directory
    pub content_dir: String,

    // Defaults applied while loading
    pub default_category: String,
    pub excerpt_length: usize,

    // Listing
    pub per_page: usize,
    pub recent_count: usize,

    // Display
    pub words_per_minute: usize,

    // Rendering
    /// Keep raw HTML from the content store instead of escaping it.
    /// Only for fully trusted content.
    pub allow_raw_html: bool,
    #[serde(default)]
    pub highlight: HighlightConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "TrendForge".to_string(),
            description: String::new(),

            content_dir: "content/blog".to_string(),

            default_category: DEFAULT_CATEGORY.to_string(),
            excerpt_length: DEFAULT_EXCERPT_LENGTH,

            per_page: 12,
            recent_count: 12,

            words_per_minute: 250,

            allow_raw_html: false,
            highlight: HighlightConfig::default(),

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        tracing::debug!("Loaded config from {:?}", path.as_ref());
        Ok(config)
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}
