use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::RwLock;

use super::{Embedder, EmbeddingError, StubEmbedder};

/// Scriptable embedder for tests.
///
/// Texts registered with [`with_vector`](Self::with_vector) return that exact
/// vector; anything else falls back to [`StubEmbedder`]. Every call is counted,
/// including failed and delayed ones.
#[derive(Default)]
pub struct MockEmbedder {
    scripted: RwLock<HashMap<String, Vec<f32>>>,
    fallback: StubEmbedder,
    calls: AtomicUsize,
    failing: AtomicBool,
    delay: RwLock<Option<Duration>>,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vector(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.set_vector(text, vector);
        self
    }

    pub fn set_vector(&self, text: impl Into<String>, vector: Vec<f32>) {
        self.scripted.write().insert(text.into(), vector);
    }

    /// Makes every following call fail with [`EmbeddingError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Sleeps this long inside every following call.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write() = delay;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for MockEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockEmbedder")
            .field("scripted", &self.scripted.read().len())
            .field("calls", &self.call_count())
            .finish()
    }
}

impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(EmbeddingError::Unavailable {
                reason: "mock embedder set to fail".to_string(),
            });
        }

        let scripted = self.scripted.read().get(text).cloned();
        match scripted {
            Some(vector) => Ok(vector),
            None => self.fallback.embed_sync(text),
        }
    }

    fn is_stub(&self) -> bool {
        true
    }
}
