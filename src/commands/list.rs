//! List site content

use anyhow::Result;
use std::io::Write;

use crate::TrendForge;

/// List site content by type
pub fn run<W: Write>(forge: &TrendForge, content_type: &str, out: &mut W) -> Result<()> {
    let catalog = forge.catalog();

    match content_type {
        "article" | "articles" | "post" | "posts" => {
            let articles = catalog.list_all();
            writeln!(out, "Articles ({}):", articles.len())?;
            for article in articles {
                writeln!(
                    out,
                    "  {} - {} [{}] ({})",
                    display_date(&article.date),
                    article.title,
                    article.category,
                    article.slug
                )?;
            }
        }
        "category" | "categories" => {
            let articles = catalog.list_all();
            let categories = crate::query::categories(&articles);
            writeln!(out, "Categories ({}):", categories.len())?;
            for category in categories {
                let count = articles.iter().filter(|a| a.category == category).count();
                writeln!(out, "  {} ({})", category, count)?;
            }
        }
        "tag" | "tags" => {
            let tags = catalog.tag_counts();
            writeln!(out, "Tags ({}):", tags.len())?;
            for (tag, count) in tags {
                writeln!(out, "  {} ({})", tag, count)?;
            }
        }
        "slug" | "slugs" => {
            let slugs = forge.loader().list_slugs();
            writeln!(out, "Slugs ({}):", slugs.len())?;
            for slug in slugs {
                writeln!(out, "  {}", slug)?;
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: article, category, tag, slug",
                content_type
            );
        }
    }

    Ok(())
}

/// Calendar date of a front-matter date, or the raw text if it does not parse
pub(crate) fn display_date(date: &str) -> String {
    crate::content::parse_date_string(date)
        .map(|d| crate::helpers::short_date(&d))
        .unwrap_or_else(|| date.to_string())
}
