//! Titrate library crate (used by the server and integration tests).
//!
//! Question deduplication and answer caching for a chemistry tutoring bot.
//! Incoming questions are matched against previously answered ones so an
//! approved answer can be served again instead of regenerated.
//!
//! # Public API Surface
//!
//! ## Matching
//! - [`signature`] / [`fingerprint`] - Normalised question signatures
//! - [`scoring`] - Block-matching text similarity, Jaccard overlap, cosine similarity
//! - [`QuestionDeduplicator`], [`LookupOutcome`] - The three-layer lookup cascade
//!
//! ## Persistence
//! - [`QuestionStore`] - Store contract
//! - [`MemoryStore`], [`SqliteStore`] - Implementations
//!
//! ## Review
//! - [`ReviewWorkflow`] - Approval, correction and deletion
//!
//! ## Embedding
//! - [`Embedder`], [`EmbedderBackend`], [`HttpEmbedder`], [`StubEmbedder`], [`CachingEmbedder`]
//!
//! ## Test/Mock Support
//! [`MockEmbedder`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod dedup;
pub mod embedding;
pub mod hashing;
pub mod review;
pub mod scoring;
pub mod signature;
pub mod store;

pub use config::{Config, ConfigError};
pub use constants::{MatchThresholds, ThresholdError};
pub use dedup::{
    DedupConfig, DedupError, DedupResult, LookupOutcome, MatchLayer, MatchReport,
    QuestionDeduplicator, QuestionMatch, TITRATE_STATUS_HEADER, TITRATE_STATUS_MISS,
};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use embedding::{
    CachingEmbedder, Embedder, EmbedderBackend, EmbeddingError, HttpEmbedder, HttpEmbedderConfig,
    StubEmbedder,
};
pub use hashing::{hash_image_bytes, hash_image_file, is_image_hash};
pub use review::{
    BulkCorrected, BulkCorrectionReport, BulkFailure, DeletionReport, ReviewError, ReviewResult,
    ReviewWorkflow,
};
pub use scoring::MatchConfidence;
pub use signature::{QuestionSignature, fingerprint};
pub use store::{
    ApprovalState, CacheStatistics, CachedQuestion, CachedQuestionId, ChatType, CorrectionSource,
    Feedback, Interaction, InteractionId, MemoryStore, Metadata, NewCachedQuestion,
    NewInteraction, QuestionStore, ReviewState, SqliteStore, StoreError, StoreResult, TopQuestion,
};
