//! Query layer over article metadata
//!
//! Every query starts from a [`MetadataSource`]: the loader, which reads the
//! content directory on each call, or an [`ArticleIndex`](crate::cache::ArticleIndex).
//! Combined queries run search, then the category filter, then pagination.

mod filter;
mod pagination;

use serde::{Deserialize, Serialize};

pub use filter::{categories, filter_by_category, search, tag_counts};
pub use pagination::{paginate, total_pages};

use crate::content::{ArticleMetadata, ContentLoader};

/// Anything that can produce the recency-sorted metadata listing
pub trait MetadataSource {
    fn load_metadata_all(&self) -> Vec<ArticleMetadata>;
}

impl MetadataSource for ContentLoader {
    fn load_metadata_all(&self) -> Vec<ArticleMetadata> {
        ContentLoader::load_metadata_all(self)
    }
}

impl<T: MetadataSource + ?Sized> MetadataSource for &T {
    fn load_metadata_all(&self) -> Vec<ArticleMetadata> {
        (**self).load_metadata_all()
    }
}

/// A combined search / category / page request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleQuery {
    pub query: String,
    pub category: Option<String>,
    pub page: usize,
    pub page_size: usize,
}

impl ArticleQuery {
    pub fn new(page_size: usize) -> Self {
        Self {
            query: String::new(),
            category: None,
            page: 1,
            page_size,
        }
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        self.category = (!category.trim().is_empty()).then_some(category);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }
}

/// One page of a combined query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPage {
    pub items: Vec<ArticleMetadata>,
    /// Matches after filtering, before pagination
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// Landing page summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total: usize,
    /// Date of the newest article
    pub last_updated: Option<String>,
    pub recent: Vec<ArticleMetadata>,
    pub categories: Vec<String>,
}

/// Query surface over a metadata source
pub struct Catalog<S> {
    source: S,
}

impl<S: MetadataSource> Catalog<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Every article, newest first
    pub fn list_all(&self) -> Vec<ArticleMetadata> {
        self.source.load_metadata_all()
    }

    /// Articles whose title, excerpt or tags contain `query`; blank matches all
    pub fn search(&self, query: &str) -> Vec<ArticleMetadata> {
        search(&self.list_all(), query)
    }

    /// Distinct categories across all articles
    pub fn list_categories(&self) -> Vec<String> {
        categories(&self.list_all()).into_iter().collect()
    }

    pub fn tag_counts(&self) -> Vec<(String, usize)> {
        tag_counts(&self.list_all())
    }

    /// The `count` newest articles
    pub fn recent(&self, count: usize) -> Vec<ArticleMetadata> {
        let mut all = self.list_all();
        all.truncate(count);
        all
    }

    /// Search, then filter by category, then paginate
    pub fn query(&self, query: &ArticleQuery) -> QueryPage {
        let mut matches = self.search(&query.query);
        if let Some(category) = &query.category {
            matches = filter_by_category(&matches, category);
        }

        let total = matches.len();
        let page_size = query.page_size.max(1);
        QueryPage {
            items: paginate(&matches, query.page, page_size),
            total,
            page: query.page,
            page_size,
            total_pages: total_pages(total, page_size),
        }
    }

    pub fn overview(&self, recent_count: usize) -> Overview {
        let all = self.list_all();
        Overview {
            total: all.len(),
            last_updated: all.first().map(|a| a.date.clone()),
            categories: categories(&all).into_iter().collect(),
            recent: all.into_iter().take(recent_count).collect(),
        }
    }
}
