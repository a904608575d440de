//! Search, category filtering and aggregation over metadata lists

use indexmap::{IndexMap, IndexSet};

use crate::content::ArticleMetadata;

/// Case-insensitive substring search on title, excerpt and tags.
/// A blank query matches everything and keeps the input order.
pub fn search(list: &[ArticleMetadata], query: &str) -> Vec<ArticleMetadata> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return list.to_vec();
    }
    list.iter()
        .filter(|article| article.matches(&needle))
        .cloned()
        .collect()
}

/// Articles whose category equals `category` exactly, order preserved
pub fn filter_by_category(list: &[ArticleMetadata], category: &str) -> Vec<ArticleMetadata> {
    list.iter()
        .filter(|article| article.category == category)
        .cloned()
        .collect()
}

/// Distinct non-empty categories in first-seen order
pub fn categories(list: &[ArticleMetadata]) -> IndexSet<String> {
    list.iter()
        .map(|article| article.category.as_str())
        .filter(|category| !category.is_empty())
        .map(str::to_string)
        .collect()
}

/// Number of articles per tag, most used first (ties by first appearance)
pub fn tag_counts(list: &[ArticleMetadata]) -> Vec<(String, usize)> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for article in list {
        for tag in &article.tags {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
