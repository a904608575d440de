//! Search articles

use anyhow::Result;
use std::io::Write;

use super::list::display_date;
use crate::query::ArticleQuery;
use crate::TrendForge;

/// Options of the search command
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub query: String,
    pub category: Option<String>,
    pub page: usize,
    pub page_size: Option<usize>,
    pub json: bool,
}

/// Run a combined search and print one page of results
pub fn run<W: Write>(forge: &TrendForge, options: &SearchOptions, out: &mut W) -> Result<()> {
    let query = ArticleQuery::new(options.page_size.unwrap_or(forge.config.per_page))
        .query(options.query.trim())
        .category(options.category.clone().unwrap_or_default())
        .page(options.page.max(1));
    let page = forge.catalog().query(&query);

    if options.json {
        serde_json::to_writer_pretty(&mut *out, &page)?;
        writeln!(out)?;
        return Ok(());
    }

    let keyword = if query.query.is_empty() {
        "(all articles)"
    } else {
        query.query.as_str()
    };
    write!(out, "Results for {}", keyword)?;
    if let Some(category) = &query.category {
        write!(out, " in {}", category)?;
    }
    writeln!(
        out,
        ": {} total, page {}/{}",
        page.total, page.page, page.total_pages
    )?;

    if page.items.is_empty() {
        writeln!(out, "  No matching articles.")?;
    }
    for article in &page.items {
        writeln!(
            out,
            "  {} - {} [{}] ({})",
            display_date(&article.date),
            article.title,
            article.category,
            article.slug
        )?;
    }

    Ok(())
}
