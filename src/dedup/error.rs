use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum DedupError {
    #[error("question text is empty")]
    EmptyQuestion,

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("embedding timed out after {timeout_ms}ms")]
    EmbeddingTimeout { timeout_ms: u64 },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl DedupError {
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, DedupError::Store(e) if e.is_not_found())
    }
}

pub type DedupResult<T> = Result<T, DedupError>;
