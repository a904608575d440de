//! Show a single article

use anyhow::Result;
use std::io::Write;

use crate::error::ContentError;
use crate::helpers::Helpers;
use crate::TrendForge;

/// Print a rendered article, as HTML with a header or as JSON
pub fn run<W: Write>(forge: &TrendForge, slug: &str, json: bool, out: &mut W) -> Result<()> {
    let article = match forge.loader().try_load_article(slug) {
        Ok(article) => article,
        Err(ContentError::NotFound(_)) => anyhow::bail!("Article not found: {}", slug),
        Err(e) => {
            tracing::warn!("{}", e);
            anyhow::bail!("Article not found: {}", slug)
        }
    };

    if json {
        serde_json::to_writer_pretty(&mut *out, &article)?;
        writeln!(out)?;
        return Ok(());
    }

    let info = Helpers::new(&forge.config).detail(&article, &chrono::Local::now());
    writeln!(out, "{}", article.title())?;
    writeln!(
        out,
        "{} · {} · {} · {} min read",
        info.source_label, article.meta.category, info.relative_date, info.read_minutes
    )?;
    if !article.meta.tags.is_empty() {
        writeln!(out, "Tags: {}", article.meta.tags.join(", "))?;
    }
    if let Some(url) = &article.source_url {
        writeln!(out, "Source: {}", url)?;
    }
    writeln!(out)?;
    write!(out, "{}", article.content)?;

    Ok(())
}
