//! Shared application state: the pipeline and a per-document index cache.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use policyqa_core::{ChunkIndex, DocumentSource, RagError, RagPipeline};
use tokio::sync::Mutex;
use tracing::info;

/// Default number of document indexes kept in memory
pub const DEFAULT_CACHE_CAPACITY: usize = 4;

pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
    /// Chunk indexes keyed by document source, least-recently-used out
    indexes: Mutex<LruCache<String, Arc<ChunkIndex>>>,
}

impl AppState {
    pub fn new(pipeline: RagPipeline, cache_capacity: usize) -> Self {
        let capacity =
            NonZeroUsize::new(cache_capacity).unwrap_or_else(|| {
                NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).expect("default capacity is non-zero")
            });
        Self {
            pipeline: Arc::new(pipeline),
            indexes: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return the cached index for a source, building it on a miss.
    ///
    /// The expensive build runs outside the lock; two concurrent misses on
    /// the same source may both build, and the later insert wins.
    pub async fn index_for(&self, source: &DocumentSource) -> Result<Arc<ChunkIndex>, RagError> {
        let key = source.key();

        if let Some(index) = self.indexes.lock().await.get(&key) {
            return Ok(Arc::clone(index));
        }

        info!(source = %source, "building chunk index");
        let index = Arc::new(self.pipeline.process_document(source).await?);
        self.indexes
            .lock()
            .await
            .put(key, Arc::clone(&index));
        Ok(index)
    }

    /// Sources currently cached, most recently used first.
    pub async fn cached_sources(&self) -> Vec<String> {
        self.indexes
            .lock()
            .await
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }
}
