use thiserror::Error;

/// Store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The targeted row does not exist (or vanished concurrently).
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The interaction lost its cache link and no replacement entry was supplied.
    #[error("interaction {id} has no cache link to update")]
    Unlinked { id: i64 },

    #[error("failed to encode/decode column '{column}': {reason}")]
    Corrupt { column: &'static str, reason: String },

    #[error("blocking store task failed: {0}")]
    Task(String),
}

impl StoreError {
    pub(crate) fn cached_question(id: i64) -> Self {
        StoreError::NotFound {
            entity: "cached question",
            id,
        }
    }

    pub(crate) fn interaction(id: i64) -> Self {
        StoreError::NotFound {
            entity: "interaction",
            id,
        }
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
