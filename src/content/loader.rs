//! Content loader - reads articles from the content directory

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use super::article::sort_by_date_desc;
use super::markdown::{self, MarkdownRenderer, Render};
use super::{toc, Article, ArticleMetadata, FrontMatter};
use crate::config::DEFAULT_EXCERPT_LENGTH;
use crate::error::{ContentError, Result};
use crate::TrendForge;

const ARTICLE_EXTENSION: &str = "md";

/// Loads articles from the content store
///
/// Every call reads the directory again; nothing is cached between calls.
#[derive(Clone)]
pub struct ContentLoader {
    content_dir: PathBuf,
    default_category: String,
    excerpt_length: usize,
    renderer: Arc<dyn Render>,
}

impl ContentLoader {
    /// Create a loader for a site, rendering with its highlight settings
    pub fn new(forge: &TrendForge) -> Self {
        let renderer =
            MarkdownRenderer::with_options(&forge.config.highlight, forge.config.allow_raw_html);
        Self {
            content_dir: forge.content_dir.clone(),
            default_category: forge.config.default_category.clone(),
            excerpt_length: forge.config.excerpt_length,
            renderer: Arc::new(renderer),
        }
    }

    /// Create a loader for a bare directory with the given fallback category
    pub fn from_dir<P: AsRef<Path>>(content_dir: P, default_category: &str) -> Self {
        Self {
            content_dir: content_dir.as_ref().to_path_buf(),
            default_category: default_category.to_string(),
            excerpt_length: DEFAULT_EXCERPT_LENGTH,
            renderer: Arc::new(MarkdownRenderer::new()),
        }
    }

    /// Swap the markdown renderer
    pub fn with_renderer(mut self, renderer: Arc<dyn Render>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    /// Slugs of every article file. A missing content directory is an empty store.
    pub fn list_slugs(&self) -> Vec<String> {
        self.article_files()
            .into_iter()
            .map(|(slug, _)| slug)
            .collect()
    }

    /// Metadata of every well-formed article, newest first.
    /// Bodies are not rendered; malformed files are logged and skipped.
    pub fn load_metadata_all(&self) -> Vec<ArticleMetadata> {
        let mut records: Vec<ArticleMetadata> = self
            .article_files()
            .into_iter()
            .filter_map(|(slug, path)| match self.read_metadata(&slug, &path) {
                Ok(meta) => Some(meta),
                Err(e) => {
                    tracing::warn!("Skipping article {}: {}", slug, e);
                    None
                }
            })
            .collect();

        sort_by_date_desc(&mut records);
        records
    }

    /// Load and render a single article. `None` when it does not exist or cannot be parsed.
    pub fn load_article(&self, slug: &str) -> Option<Article> {
        match self.try_load_article(slug) {
            Ok(article) => Some(article),
            Err(ContentError::NotFound(_)) => {
                tracing::debug!("Article not found: {}", slug);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to load article {}: {}", slug, e);
                None
            }
        }
    }

    /// Load and render a single article, reporting why it is unavailable
    pub fn try_load_article(&self, slug: &str) -> Result<Article> {
        let path = self
            .resolve(slug)
            .ok_or_else(|| ContentError::NotFound(slug.to_string()))?;
        let content = read_file(&path)?;
        let (fm, body) =
            FrontMatter::parse(&content).map_err(|e| ContentError::malformed(&path, e))?;

        let time = fm.time.clone();
        let source_url = fm.source_url.clone();
        let engagement_score = fm.engagement_score.unwrap_or(0.0);
        let body_excerpt = fm
            .excerpt
            .as_deref()
            .map_or(true, |e| e.trim().is_empty())
            .then(|| markdown::excerpt(body, self.excerpt_length));

        let mut meta = self.to_metadata(slug, fm);
        if let Some(excerpt) = body_excerpt {
            meta.excerpt = excerpt;
        }
        if meta.word_count.is_none() {
            meta.word_count = Some(crate::helpers::word_count(body));
        }

        let content = self
            .renderer
            .render(body)
            .map_err(|e| ContentError::malformed(&path, e))?;

        Ok(Article {
            meta,
            content,
            time,
            source_url,
            engagement_score,
            toc: toc::extract(body),
        })
    }

    /// Map a slug to its file, refusing anything that could leave the content directory
    fn resolve(&self, slug: &str) -> Option<PathBuf> {
        if slug.is_empty()
            || slug.contains(['/', '\\', '\0'])
            || slug == "."
            || slug == ".."
        {
            return None;
        }
        let path = self
            .content_dir
            .join(format!("{}.{}", slug, ARTICLE_EXTENSION));
        path.is_file().then_some(path)
    }

    /// `(slug, path)` of every article file, sorted by file name
    fn article_files(&self) -> Vec<(String, PathBuf)> {
        if !self.content_dir.is_dir() {
            tracing::debug!("Content directory {:?} does not exist", self.content_dir);
            return Vec::new();
        }

        WalkDir::new(&self.content_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let path = e.into_path();
                let slug = article_slug(&path)?;
                Some((slug, path))
            })
            .collect()
    }

    fn read_metadata(&self, slug: &str, path: &Path) -> Result<ArticleMetadata> {
        let content = read_file(path)?;
        let (fm, _) = FrontMatter::parse(&content).map_err(|e| ContentError::malformed(path, e))?;
        Ok(self.to_metadata(slug, fm))
    }

    /// Apply defaults for every field the front-matter leaves out
    fn to_metadata(&self, slug: &str, fm: FrontMatter) -> ArticleMetadata {
        ArticleMetadata {
            slug: slug.to_string(),
            title: non_blank(fm.title).unwrap_or_else(|| slug.to_string()),
            date: fm.date.map(|d| d.trim().to_string()).unwrap_or_default(),
            category: non_blank(fm.category).unwrap_or_else(|| self.default_category.clone()),
            tags: fm.tags,
            excerpt: fm.excerpt.unwrap_or_default(),
            source: non_blank(fm.source).unwrap_or_else(|| "unknown".to_string()),
            word_count: fm.word_count,
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|e| ContentError::malformed(path, e))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Slug of an article file, `None` for anything that is not markdown
fn article_slug(path: &Path) -> Option<String> {
    let is_article = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e == ARTICLE_EXTENSION)
        .unwrap_or(false);
    if !is_article {
        return None;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn article(title: &str, date: &str, category: &str) -> String {
        format!(
            "---\ntitle: {}\ndate: {}\nsource: hackernews\ncategory: {}\n---\n\n## Body\n\nText for {}.\n",
            title, date, category, title
        )
    }

    fn scenario_store() -> (tempfile::TempDir, ContentLoader) {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "jan.md", &article("January", "2024-01-01", "AI"));
        write(dir.path(), "mar.md", &article("March", "2024-03-01", "AI"));
        write(dir.path(), "feb.md", &article("February", "2024-02-01", "Security"));
        let loader = ContentLoader::from_dir(dir.path(), "科技");
        (dir, loader)
    }

    #[test]
    fn test_missing_store_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ContentLoader::from_dir(dir.path().join("missing"), "科技");
        assert!(loader.list_slugs().is_empty());
        assert!(loader.load_metadata_all().is_empty());
        assert!(loader.load_article("anything").is_none());
    }

    #[test]
    fn test_list_slugs_only_markdown() {
        let (dir, loader) = scenario_store();
        write(dir.path(), "notes.txt", "not an article");
        fs::create_dir(dir.path().join("drafts")).unwrap();
        write(&dir.path().join("drafts"), "nested.md", &article("Nested", "2024-01-01", "AI"));

        assert_eq!(loader.list_slugs(), vec!["feb", "jan", "mar"]);
    }

    #[test]
    fn test_metadata_sorted_newest_first() {
        let (_dir, loader) = scenario_store();
        let records = loader.load_metadata_all();
        let slugs: Vec<_> = records.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(slugs, vec!["mar", "feb", "jan"]);

        let unique: HashSet<_> = records.iter().map(|r| &r.slug).collect();
        assert_eq!(unique.len(), records.len());
        for pair in records.windows(2) {
            assert!(pair[0].published_at() >= pair[1].published_at());
        }
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bare.md", "---\ndate: 2024-05-01\n---\nJust a body.\n");
        let loader = ContentLoader::from_dir(dir.path(), "科技");

        let records = loader.load_metadata_all();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.category, "科技");
        assert_eq!(record.title, "bare");
        assert_eq!(record.source, "unknown");
        assert!(record.tags.is_empty());
        assert_eq!(record.excerpt, "");
    }

    #[test]
    fn test_note_starting_with_braces_is_listed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.md", "{curly} braces open this note.\n");
        let loader = ContentLoader::from_dir(dir.path(), "科技");
        assert_eq!(loader.excerpt_length, DEFAULT_EXCERPT_LENGTH);

        let records = loader.load_metadata_all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "a");

        let article = loader.try_load_article("a").unwrap();
        assert!(article.content.contains("{curly} braces"));
    }

    #[test]
    fn test_blank_category_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.md", "---\ntitle: A\ncategory: ''\n---\nbody\n");
        let loader = ContentLoader::from_dir(dir.path(), "General");
        assert_eq!(loader.load_metadata_all()[0].category, "General");
    }

    #[test]
    fn test_malformed_file_is_skipped() {
        let (dir, loader) = scenario_store();
        write(dir.path(), "broken.md", "---\ntitle: [oops\ndate: 2024-04-01\n---\nbody\n");
        fs::write(dir.path().join("binary.md"), [0xff, 0xfe, 0x00]).unwrap();

        let records = loader.load_metadata_all();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.slug != "broken" && r.slug != "binary"));

        assert!(loader.load_article("broken").is_none());
        assert!(matches!(
            loader.try_load_article("broken"),
            Err(ContentError::Malformed { .. })
        ));
    }

    #[test]
    fn test_load_article() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "deep-dive.md",
            r#"---
title: Deep Dive
date: 2024-06-01T09:00:00
time: "09:00"
source: github
url: https://github.com/trending
tags: [rust, wasm]
engagement_score: 512
---

## Overview

Some **text** here.

<script>alert(1)</script>
"#,
        );
        let loader = ContentLoader::from_dir(dir.path(), "科技");

        let article = loader.load_article("deep-dive").unwrap();
        assert_eq!(article.slug(), "deep-dive");
        assert_eq!(article.title(), "Deep Dive");
        assert_eq!(article.time.as_deref(), Some("09:00"));
        assert_eq!(article.source_url.as_deref(), Some("https://github.com/trending"));
        assert_eq!(article.engagement_score, 512.0);
        assert_eq!(article.meta.tags, vec!["rust", "wasm"]);
        assert_eq!(article.meta.category, "科技");
        assert!(article.content.contains(r#"<h2 id="overview">Overview</h2>"#));
        assert!(article.content.contains("<strong>text</strong>"));
        assert!(!article.content.contains("<script>"));
        assert_eq!(article.toc.len(), 1);
        assert_eq!(article.meta.word_count, Some(6));
        assert!(article.meta.excerpt.starts_with("Overview Some text here."));
    }

    #[test]
    fn test_metadata_matches_article_subset() {
        let (_dir, loader) = scenario_store();
        for meta in loader.load_metadata_all() {
            let article = loader.load_article(&meta.slug).unwrap();
            assert_eq!(article.meta.slug, meta.slug);
            assert_eq!(article.meta.title, meta.title);
            assert_eq!(article.meta.date, meta.date);
            assert_eq!(article.meta.category, meta.category);
            assert_eq!(article.meta.tags, meta.tags);
            assert_eq!(article.meta.source, meta.source);
        }
    }

    #[test]
    fn test_front_matter_excerpt_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.md", "---\ntitle: A\nexcerpt: Hand written\n---\n# Body\n");
        let loader = ContentLoader::from_dir(dir.path(), "科技");
        assert_eq!(loader.load_article("a").unwrap().meta.excerpt, "Hand written");
        assert_eq!(loader.load_metadata_all()[0].excerpt, "Hand written");
    }

    #[test]
    fn test_nonexistent_and_unsafe_slugs() {
        let root = tempfile::tempdir().unwrap();
        let store = root.path().join("blog");
        fs::create_dir(&store).unwrap();
        write(&store, "inside.md", &article("In", "2024-01-01", "AI"));
        write(root.path(), "outside.md", &article("Out", "2024-01-01", "AI"));
        let loader = ContentLoader::from_dir(&store, "科技");

        assert!(loader.load_article("inside").is_some());

        assert!(loader.load_article("nonexistent-slug").is_none());
        assert!(matches!(
            loader.try_load_article("nonexistent-slug"),
            Err(ContentError::NotFound(_))
        ));
        assert!(loader.load_article("../outside").is_none());
        assert!(loader.load_article("").is_none());
        assert!(loader.load_article("..").is_none());
    }

    #[test]
    fn test_custom_renderer() {
        struct Upper;
        impl Render for Upper {
            fn render(&self, markdown: &str) -> anyhow::Result<String> {
                Ok(markdown.to_uppercase())
            }
        }

        let (_dir, loader) = scenario_store();
        let loader = loader.with_renderer(Arc::new(Upper));
        let article = loader.load_article("jan").unwrap();
        assert!(article.content.contains("TEXT FOR JANUARY."));
    }
}
