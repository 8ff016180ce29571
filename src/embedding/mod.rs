//! Embedding service clients.
//!
//! - [`HttpEmbedder`] talks to an OpenAI-compatible `/embeddings` endpoint.
//! - [`StubEmbedder`] hashes fingerprint tokens locally (no service needed).
//! - [`CachingEmbedder`] memoises any embedder by text.
//!
//! A mock with scripted vectors and call counting is available behind
//! `#[cfg(any(test, feature = "mock"))]`.

mod cached;
mod error;
mod http;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod stub;

#[cfg(test)]
mod tests;

use std::future::Future;
use std::sync::Arc;

pub use cached::CachingEmbedder;
pub use error::EmbeddingError;
pub use http::{HttpEmbedder, HttpEmbedderConfig};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
pub use stub::{STUB_EMBEDDING_DIM, StubEmbedder};

/// Turns question text into a dense vector.
pub trait Embedder: Send + Sync {
    /// Embeds one piece of text.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, EmbeddingError>> + Send;

    /// Returns `true` when vectors are not produced by a real model.
    fn is_stub(&self) -> bool {
        false
    }
}

impl<E: Embedder> Embedder for Arc<E> {
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, EmbeddingError>> + Send {
        (**self).embed(text)
    }

    fn is_stub(&self) -> bool {
        (**self).is_stub()
    }
}

/// Runtime-selected embedder used by the server binary.
#[derive(Debug)]
pub enum EmbedderBackend {
    Http(HttpEmbedder),
    Stub(StubEmbedder),
}

impl EmbedderBackend {
    /// Picks the HTTP client when a URL is configured, else the stub.
    pub fn from_config(config: &crate::config::Config) -> Result<Self, EmbeddingError> {
        match HttpEmbedderConfig::from_config(config) {
            Some(http) => Ok(Self::Http(HttpEmbedder::new(http)?)),
            None => {
                tracing::warn!(
                    "No TITRATE_EMBEDDING_URL configured, running embedder in stub mode"
                );
                Ok(Self::Stub(StubEmbedder::default()))
            }
        }
    }
}

impl Embedder for EmbedderBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match self {
            EmbedderBackend::Http(embedder) => embedder.embed(text).await,
            EmbedderBackend::Stub(embedder) => embedder.embed(text).await,
        }
    }

    fn is_stub(&self) -> bool {
        matches!(self, EmbedderBackend::Stub(_))
    }
}
