//! In-memory article index for long-running processes
//!
//! The loader reads the content directory on every call. A server that
//! answers many requests keeps an [`ArticleIndex`] instead: the metadata
//! listing is built once, keyed by slug, and rebuilt on the next read after
//! [`ArticleIndex::invalidate`] is called (the server does this from its
//! file watcher).

use indexmap::IndexMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::content::{ArticleMetadata, ContentLoader};
use crate::query::MetadataSource;

/// Metadata keyed by slug, in recency order
pub type Snapshot = IndexMap<String, ArticleMetadata>;

/// Lazily built, invalidatable index over a loader
pub struct ArticleIndex {
    loader: ContentLoader,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    builds: AtomicU64,
}

impl ArticleIndex {
    pub fn new(loader: ContentLoader) -> Self {
        Self {
            loader,
            snapshot: RwLock::new(None),
            builds: AtomicU64::new(0),
        }
    }

    pub fn loader(&self) -> &ContentLoader {
        &self.loader
    }

    /// Current snapshot, building it from disk if it was invalidated
    pub fn snapshot(&self) -> Arc<Snapshot> {
        if let Some(snapshot) = self
            .snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Arc::clone(snapshot);
        }

        // A store that does not exist yet is never cached, so it shows up once created
        if !self.loader.content_dir().is_dir() {
            return Arc::new(Snapshot::new());
        }

        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Another reader may have rebuilt it while we waited for the lock
        if let Some(snapshot) = guard.as_ref() {
            return Arc::clone(snapshot);
        }

        let snapshot: Snapshot = self
            .loader
            .load_metadata_all()
            .into_iter()
            .map(|meta| (meta.slug.clone(), meta))
            .collect();
        let snapshot = Arc::new(snapshot);
        let builds = self.builds.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!("Built article index: {} articles (build #{})", snapshot.len(), builds);

        *guard = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Drop the snapshot; the next read rebuilds it
    pub fn invalidate(&self) {
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        tracing::debug!("Article index invalidated");
    }

    /// Metadata for one slug
    pub fn get(&self, slug: &str) -> Option<ArticleMetadata> {
        self.snapshot().get(slug).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// How many times the index has been built from disk
    pub fn build_count(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }
}

impl MetadataSource for ArticleIndex {
    fn load_metadata_all(&self) -> Vec<ArticleMetadata> {
        self.snapshot().values().cloned().collect()
    }
}
