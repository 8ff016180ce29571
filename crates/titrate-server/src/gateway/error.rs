use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use titrate::{DedupError, ReviewError, TITRATE_STATUS_HEADER};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl From<ReviewError> for GatewayError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::Validation { reason } => GatewayError::InvalidRequest(reason),
            ReviewError::Dedup(dedup) => dedup.into(),
            ReviewError::Store(store) => GatewayError::StorageError(store.to_string()),
            not_found => GatewayError::NotFound(not_found.to_string()),
        }
    }
}

impl From<DedupError> for GatewayError {
    fn from(err: DedupError) -> Self {
        match err {
            DedupError::EmptyQuestion => GatewayError::InvalidRequest(err.to_string()),
            DedupError::Embedding(_) | DedupError::EmbeddingTimeout { .. } => {
                GatewayError::EmbeddingFailed(err.to_string())
            }
            DedupError::Store(store) if store.is_not_found() => {
                GatewayError::NotFound(store.to_string())
            }
            DedupError::Store(store) => GatewayError::StorageError(store.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, titrate_status) = match &self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            GatewayError::StorageError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            GatewayError::EmbeddingFailed(_) => (StatusCode::BAD_GATEWAY, "embedding_error"),
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            TITRATE_STATUS_HEADER,
            HeaderValue::from_static(titrate_status),
        );

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
