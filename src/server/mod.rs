//! JSON API server over the article index

use anyhow::{bail, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::cache::ArticleIndex;
use crate::config::SiteConfig;
use crate::query::{ArticleQuery, Catalog};
use crate::TrendForge;

/// How often a missing content directory is checked for
const DIR_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Server state
pub struct ServerState {
    index: ArticleIndex,
    config: SiteConfig,
}

impl ServerState {
    pub fn new(forge: &TrendForge) -> Self {
        Self {
            index: ArticleIndex::new(forge.loader()),
            config: forge.config.clone(),
        }
    }

    pub fn index(&self) -> &ArticleIndex {
        &self.index
    }
}

/// Query string of `GET /api/articles`
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    q: Option<String>,
    category: Option<String>,
    page: Option<String>,
    page_size: Option<String>,
}

impl ListParams {
    /// Missing or invalid pages become page 1
    fn to_query(&self, per_page: usize) -> ArticleQuery {
        let page = parse_positive(self.page.as_deref()).unwrap_or(1);
        let page_size = parse_positive(self.page_size.as_deref()).unwrap_or(per_page);
        ArticleQuery::new(page_size)
            .query(self.q.clone().unwrap_or_default())
            .category(self.category.clone().unwrap_or_default())
            .page(page)
    }
}

fn parse_positive(value: Option<&str>) -> Option<usize> {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
}

#[derive(Debug, Serialize)]
struct TagCount {
    name: String,
    count: usize,
}

/// Build the API router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/articles", get(list_articles))
        .route("/api/articles/:slug", get(get_article))
        .route("/api/categories", get(list_categories))
        .route("/api/tags", get(list_tags))
        .route("/api/slugs", get(list_slugs))
        .route("/api/overview", get(overview))
        .fallback(|| async { (StatusCode::NOT_FOUND, "Not found") })
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the API server
pub async fn start(forge: &TrendForge, ip: &str, port: u16, watch: bool) -> Result<()> {
    let state = Arc::new(ServerState::new(forge));

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    if watch {
        let content_dir = forge.content_dir.clone();
        let watched = Arc::clone(&state);
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_invalidate(content_dir, watched) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let app = router(state);

    println!("Serving {:?} at http://{}:{}/api/articles", forge.content_dir, ip, port);
    if watch {
        println!("Watching for content changes...");
    }
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Watch the content directory and drop the index whenever an article changes.
/// A directory that is missing, or removed later, is polled for and watched once it exists.
fn watch_and_invalidate(content_dir: PathBuf, state: Arc<ServerState>) -> Result<()> {
    loop {
        if !content_dir.is_dir() {
            tracing::info!("Waiting for {:?} to be created", content_dir);
            while !content_dir.is_dir() {
                std::thread::sleep(DIR_POLL_INTERVAL);
            }
            state.index.invalidate();
        }
        watch_dir(&content_dir, &state)?;
    }
}

/// Invalidate on `.md` changes until the directory disappears
fn watch_dir(content_dir: &FsPath, state: &ServerState) -> Result<()> {
    let (tx, rx) = mpsc::channel::<DebounceEventResult>();

    // Create debouncer to collapse bursts of writes from the generator
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;
    debouncer
        .watcher()
        .watch(content_dir, RecursiveMode::NonRecursive)?;
    tracing::debug!("Watching: {:?}", content_dir);

    loop {
        match rx.recv_timeout(DIR_POLL_INTERVAL) {
            Ok(Ok(events)) => {
                let changed: Vec<_> = events
                    .iter()
                    .filter(|e| e.path.extension().is_some_and(|ext| ext == "md"))
                    .collect();
                for event in &changed {
                    tracing::info!("Content changed: {}", event.path.display());
                }
                if !changed.is_empty() {
                    state.index.invalidate();
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                bail!("watch channel closed");
            }
        }

        if !content_dir.is_dir() {
            tracing::info!("Content directory {:?} was removed", content_dir);
            state.index.invalidate();
            return Ok(());
        }
    }
}

/// Run a blocking read against the state off the async workers
async fn blocking<T, F>(state: Arc<ServerState>, f: F) -> Result<T, Response>
where
    T: Send + 'static,
    F: FnOnce(&ServerState) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            tracing::error!("Request task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        })
}

async fn list_articles(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<ListParams>,
) -> Response {
    let query = params.to_query(state.config.per_page);
    match blocking(state, move |s| Catalog::new(&s.index).query(&query)).await {
        Ok(page) => Json(page).into_response(),
        Err(resp) => resp,
    }
}

async fn get_article(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    match blocking(state, move |s| s.index.loader().load_article(&slug)).await {
        Ok(Some(article)) => Json(article).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        Err(resp) => resp,
    }
}

async fn list_categories(State(state): State<Arc<ServerState>>) -> Response {
    match blocking(state, |s| Catalog::new(&s.index).list_categories()).await {
        Ok(categories) => Json(categories).into_response(),
        Err(resp) => resp,
    }
}

async fn list_tags(State(state): State<Arc<ServerState>>) -> Response {
    let tags = blocking(state, |s| {
        Catalog::new(&s.index)
            .tag_counts()
            .into_iter()
            .map(|(name, count)| TagCount { name, count })
            .collect::<Vec<_>>()
    })
    .await;
    match tags {
        Ok(tags) => Json(tags).into_response(),
        Err(resp) => resp,
    }
}

async fn list_slugs(State(state): State<Arc<ServerState>>) -> Response {
    match blocking(state, |s| s.index.loader().list_slugs()).await {
        Ok(slugs) => Json(slugs).into_response(),
        Err(resp) => resp,
    }
}

async fn overview(State(state): State<Arc<ServerState>>) -> Response {
    let recent_count = state.config.recent_count;
    match blocking(state, move |s| Catalog::new(&s.index).overview(recent_count)).await {
        Ok(overview) => Json(overview).into_response(),
        Err(resp) => resp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use std::fs;
    use tower::ServiceExt;

    fn site() -> (tempfile::TempDir, Arc<ServerState>) {
        let dir = tempfile::tempdir().unwrap();
        let blog = dir.path().join("content/blog");
        fs::create_dir_all(&blog).unwrap();
        let articles = [
            ("jan", "January notes", "2024-01-01", "AI", "[llm]"),
            ("mar", "March notes", "2024-03-01", "AI", "[llm, agents]"),
            ("feb", "February notes", "2024-02-01", "Security", "[cve]"),
        ];
        for (slug, title, date, category, tags) in articles {
            let content = format!(
                "---\ntitle: {}\ndate: {}\nsource: hackernews\ncategory: {}\ntags: {}\n---\n\n## Heading\n\nBody\n",
                title, date, category, tags
            );
            fs::write(blog.join(format!("{}.md", slug)), content).unwrap();
        }
        let forge = TrendForge::new(dir.path()).unwrap();
        (dir, Arc::new(ServerState::new(&forge)))
    }

    async fn get_json(state: Arc<ServerState>, uri: &str) -> (StatusCode, Value) {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_list_articles() {
        let (_dir, state) = site();
        let (status, body) = get_json(state, "/api/articles").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["page"], 1);
        assert_eq!(body["page_size"], 12);
        assert_eq!(body["items"][0]["slug"], "mar");
    }

    #[tokio::test]
    async fn test_combined_query_params() {
        let (_dir, state) = site();
        let (_, body) =
            get_json(state, "/api/articles?q=LLM&category=AI&page=2&page_size=1").await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["total_pages"], 2);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["items"][0]["slug"], "jan");
    }

    #[tokio::test]
    async fn test_invalid_page_defaults_to_first() {
        let (_dir, state) = site();
        let (_, body) = get_json(state, "/api/articles?page=abc&page_size=0").await;
        assert_eq!(body["page"], 1);
        assert_eq!(body["page_size"], 12);
    }

    #[tokio::test]
    async fn test_get_article() {
        let (_dir, state) = site();
        let (status, body) = get_json(Arc::clone(&state), "/api/articles/feb").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "February notes");
        assert_eq!(body["toc"][0]["id"], "heading");
        assert_eq!(body["engagement_score"], 0.0);

        let (status, _) = get_json(state, "/api/articles/nonexistent-slug").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_categories_tags_slugs() {
        let (_dir, state) = site();
        let (_, categories) = get_json(Arc::clone(&state), "/api/categories").await;
        assert_eq!(categories, serde_json::json!(["AI", "Security"]));

        let (_, tags) = get_json(Arc::clone(&state), "/api/tags").await;
        assert_eq!(tags[0]["name"], "llm");
        assert_eq!(tags[0]["count"], 2);

        let (_, slugs) = get_json(state, "/api/slugs").await;
        assert_eq!(slugs, serde_json::json!(["feb", "jan", "mar"]));
    }

    #[tokio::test]
    async fn test_overview() {
        let (_dir, state) = site();
        let (_, body) = get_json(state, "/api/overview").await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["last_updated"], "2024-03-01");
        assert_eq!(body["recent"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_index_refreshes_after_invalidate() {
        let (dir, state) = site();
        let (_, before) = get_json(Arc::clone(&state), "/api/articles").await;
        assert_eq!(before["total"], 3);

        fs::write(
            dir.path().join("content/blog/apr.md"),
            "---\ntitle: April\ndate: 2024-04-01\n---\nBody\n",
        )
        .unwrap();
        state.index().invalidate();

        let (_, after) = get_json(state, "/api/articles").await;
        assert_eq!(after["total"], 4);
        assert_eq!(after["items"][0]["slug"], "apr");
    }

    #[tokio::test]
    async fn test_store_created_after_start() {
        let dir = tempfile::tempdir().unwrap();
        let forge = TrendForge::new(dir.path()).unwrap();
        let state = Arc::new(ServerState::new(&forge));

        let (_, before) = get_json(Arc::clone(&state), "/api/articles").await;
        assert_eq!(before["total"], 0);

        let blog = dir.path().join("content/blog");
        fs::create_dir_all(&blog).unwrap();
        fs::write(blog.join("first.md"), "---\ntitle: First\ndate: 2024-05-01\n---\nBody\n").unwrap();

        let (_, after) = get_json(state, "/api/articles").await;
        assert_eq!(after["total"], 1);
        assert_eq!(after["items"][0]["slug"], "first");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (_dir, state) = site();
        let (status, _) = get_json(state, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
