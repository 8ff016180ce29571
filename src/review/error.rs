use thiserror::Error;

use crate::dedup::DedupError;
use crate::store::StoreError;

/// Errors surfaced to administrators by the review workflow.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Rejected before touching the store.
    #[error("invalid request: {reason}")]
    Validation { reason: String },

    #[error("interaction {id} not found")]
    InteractionNotFound { id: i64 },

    #[error("cached question {id} not found")]
    CachedQuestionNotFound { id: i64 },

    #[error("no cached question matches the given text")]
    NoSimilarQuestion,

    #[error(transparent)]
    Dedup(DedupError),

    #[error(transparent)]
    Store(StoreError),
}

impl ReviewError {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        ReviewError::Validation {
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ReviewError::InteractionNotFound { .. }
                | ReviewError::CachedQuestionNotFound { .. }
                | ReviewError::NoSimilarQuestion
        )
    }
}

impl From<StoreError> for ReviewError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound {
                entity: "interaction",
                id,
            } => ReviewError::InteractionNotFound { id },
            StoreError::NotFound { id, .. } => ReviewError::CachedQuestionNotFound { id },
            other => ReviewError::Store(other),
        }
    }
}

impl From<DedupError> for ReviewError {
    fn from(err: DedupError) -> Self {
        match err {
            DedupError::Store(store) => store.into(),
            DedupError::EmptyQuestion => ReviewError::validation("question text is empty"),
            other => ReviewError::Dedup(other),
        }
    }
}

pub type ReviewResult<T> = Result<T, ReviewError>;
