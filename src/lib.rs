//! trendforge: content library for the TrendForge article site
//!
//! Reads pre-generated markdown articles with front-matter from a content
//! directory, renders them to sanitized HTML and answers list, search,
//! category and pagination queries. The CLI and the JSON server in this
//! crate are thin consumers of [`content::ContentLoader`] and
//! [`query::Catalog`].

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod helpers;
pub mod query;
pub mod server;

use anyhow::Result;
use std::path::Path;

pub use content::{Article, ArticleMetadata};
pub use error::ContentError;

/// The main application
#[derive(Clone)]
pub struct TrendForge {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Content store directory
    pub content_dir: std::path::PathBuf,
}

impl TrendForge {
    /// Create a new instance from a directory, reading `_config.yml` if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create an instance with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let content_dir = base_dir.join(&config.content_dir);

        Self {
            config,
            base_dir,
            content_dir,
        }
    }

    /// A loader reading this site's content directory
    pub fn loader(&self) -> content::ContentLoader {
        content::ContentLoader::new(self)
    }

    /// Query surface that re-reads the content directory on every call
    pub fn catalog(&self) -> query::Catalog<content::ContentLoader> {
        query::Catalog::new(self.loader())
    }

    /// An empty query using the configured page size
    pub fn query(&self) -> query::ArticleQuery {
        query::ArticleQuery::new(self.config.per_page)
    }
}
