use std::sync::Arc;

use moka::sync::Cache;
use tracing::debug;

use super::{Embedder, EmbeddingError};
use crate::hashing::hash_text;

/// Memoises embeddings by exact text (BLAKE3 key, LRU-bounded).
///
/// Admin corrections re-embed the same question text the engine already
/// embedded during lookup; this keeps that to one service call.
pub struct CachingEmbedder<E> {
    inner: E,
    entries: Cache<[u8; 32], Arc<Vec<f32>>>,
}

impl<E> CachingEmbedder<E> {
    pub fn new(inner: E, capacity: u64) -> Self {
        Self {
            inner,
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Number of memoised vectors (approximate until pending tasks run).
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs any pending maintenance tasks in the underlying cache.
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

impl<E> std::fmt::Debug for CachingEmbedder<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingEmbedder")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl<E: Embedder> Embedder for CachingEmbedder<E> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let key = hash_text(text);
        if let Some(hit) = self.entries.get(&key) {
            debug!("Embedding cache hit");
            return Ok(hit.as_ref().clone());
        }

        let vector = self.inner.embed(text).await?;
        self.entries.insert(key, Arc::new(vector.clone()));
        Ok(vector)
    }

    fn is_stub(&self) -> bool {
        self.inner.is_stub()
    }
}
