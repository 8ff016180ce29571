use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{Embedder, EmbeddingError};
use crate::config::Config;

#[derive(Debug, Clone)]
/// Connection settings for [`HttpEmbedder`].
pub struct HttpEmbedderConfig {
    /// API base, e.g. `https://api.openai.com/v1`. `/embeddings` is appended.
    pub base_url: String,
    /// Model name sent with each request.
    pub model: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Client-side request timeout.
    pub timeout: Duration,
}

impl HttpEmbedderConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            timeout: Duration::from_millis(crate::constants::DEFAULT_EMBEDDING_TIMEOUT_MS),
        }
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Derives HTTP settings from [`Config`]; `None` when no URL is set.
    pub fn from_config(config: &Config) -> Option<Self> {
        let base_url = config.embedding_url.clone()?;
        let mut http = Self::new(base_url, config.embedding_model.clone())
            .timeout(config.embedding_timeout());
        http.api_key = config.embedding_api_key.clone();
        Some(http)
    }

    /// Full URL of the embeddings endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }

    fn validate(&self) -> Result<(), EmbeddingError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(EmbeddingError::InvalidConfig {
                reason: format!("base URL must be http(s): '{}'", self.base_url),
            });
        }
        if self.model.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "model name is empty".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible embeddings API.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    config: HttpEmbedderConfig,
}

impl std::fmt::Debug for HttpEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbedder")
            .field("endpoint", &self.endpoint)
            .field("model", &self.config.model)
            .field("has_api_key", &self.config.api_key.is_some())
            .finish()
    }
}

impl HttpEmbedder {
    pub fn new(config: HttpEmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbeddingError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            config,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Embedder for HttpEmbedder {
    #[instrument(skip(self, text), fields(model = %self.config.model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let mut request = self.client.post(&self.endpoint).json(&EmbeddingRequest {
            model: &self.config.model,
            input: text,
        });
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = response.json().await?;
        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| EmbeddingError::InvalidResponse {
                reason: "response contained no embedding".to_string(),
            })?;

        debug!(dim = embedding.len(), "Embedding received");
        Ok(embedding)
    }
}
