use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("cannot embed empty text")]
    EmptyInput,

    #[error("embedding request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("embedding service returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("malformed embedding response: {reason}")]
    InvalidResponse { reason: String },

    #[error("embedding service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("invalid embedder configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl EmbeddingError {
    /// Returns `true` for failures worth retrying on a later request.
    pub fn is_transient(&self) -> bool {
        match self {
            EmbeddingError::RequestFailed { .. }
            | EmbeddingError::Unavailable { .. } => true,
            EmbeddingError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            EmbeddingError::EmptyInput
            | EmbeddingError::InvalidResponse { .. }
            | EmbeddingError::InvalidConfig { .. } => false,
        }
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            EmbeddingError::InvalidResponse {
                reason: err.to_string(),
            }
        } else {
            EmbeddingError::RequestFailed {
                reason: err.to_string(),
            }
        }
    }
}
