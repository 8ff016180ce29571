use tracing::debug;

use super::{Embedder, EmbeddingError};
use crate::signature::fingerprint;

/// Default output dimension of [`StubEmbedder`].
pub const STUB_EMBEDDING_DIM: usize = 256;

/// Deterministic local embedder: signed feature hashing of fingerprint tokens.
///
/// Texts that share fingerprint tokens get a positive cosine similarity, so
/// the semantic layer still behaves sensibly without an embedding service.
#[derive(Debug, Clone, Copy)]
pub struct StubEmbedder {
    dim: usize,
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self::new(STUB_EMBEDDING_DIM)
    }
}

impl StubEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn embedding_dim(&self) -> usize {
        self.dim
    }

    /// Synchronous form of [`Embedder::embed`].
    pub fn embed_sync(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let normalized = fingerprint(text);
        if normalized.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let mut vector = vec![0.0f32; self.dim];
        for token in normalized.split_whitespace() {
            let digest = blake3::hash(token.as_bytes());
            let bytes = digest.as_bytes();
            let mut index_bytes = [0u8; 8];
            index_bytes.copy_from_slice(&bytes[..8]);
            let index = (u64::from_le_bytes(index_bytes) % self.dim as u64) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }

        debug!(dim = self.dim, "Generated stub embedding");
        Ok(vector)
    }
}

impl Embedder for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_sync(text)
    }

    fn is_stub(&self) -> bool {
        true
    }
}
