use std::time::Duration;

use serde::Serialize;

use crate::config::Config;
use crate::constants::{DEFAULT_EMBEDDING_TIMEOUT_MS, DEFAULT_RECENT_POOL_SIZE, MatchThresholds};
use crate::scoring::{MatchConfidence, SignatureScores};
use crate::signature::QuestionSignature;
use crate::store::{CachedQuestion, CachedQuestionId};

pub const TITRATE_STATUS_HEADER: &str = "x-titrate-status";
pub const TITRATE_STATUS_MISS: &str = "MISS";

/// Tuning for one [`QuestionDeduplicator`](super::QuestionDeduplicator).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DedupConfig {
    pub thresholds: MatchThresholds,
    /// Entries scanned by the signature and semantic layers.
    pub pool_size: usize,
    /// Upper bound on one embedding call.
    pub embed_timeout: Duration,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            thresholds: MatchThresholds::default(),
            pool_size: DEFAULT_RECENT_POOL_SIZE,
            embed_timeout: Duration::from_millis(DEFAULT_EMBEDDING_TIMEOUT_MS),
        }
    }
}

impl DedupConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            thresholds: config.thresholds,
            pool_size: config.recent_pool_size,
            embed_timeout: config.embedding_timeout(),
        }
    }
}

/// The cascade layer that produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLayer {
    ImageHash,
    Signature(MatchConfidence),
    Semantic,
}

impl MatchLayer {
    #[inline]
    pub fn as_header_value(&self) -> &'static str {
        match self {
            MatchLayer::ImageHash => "HIT_IMAGE_HASH",
            MatchLayer::Signature(MatchConfidence::Exact) => "HIT_SIGNATURE_EXACT",
            MatchLayer::Signature(MatchConfidence::High) => "HIT_SIGNATURE_HIGH",
            MatchLayer::Signature(MatchConfidence::Medium) => "HIT_SIGNATURE_MEDIUM",
            MatchLayer::Semantic => "HIT_SEMANTIC",
        }
    }

    /// Whether the hit came through the low-confidence signature band.
    #[inline]
    pub fn is_medium_confidence(&self) -> bool {
        matches!(self, MatchLayer::Signature(MatchConfidence::Medium))
    }
}

impl std::fmt::Display for MatchLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_header_value())
    }
}

/// An approved cache entry judged to be the same question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionMatch {
    pub entry: CachedQuestion,
    pub layer: MatchLayer,
    /// Layer-specific similarity: `1.0` for hash and fingerprint equality,
    /// combined signature score, or embedding cosine similarity.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LookupOutcome {
    Hit(QuestionMatch),
    /// Nothing servable. `pending_duplicate` names an unapproved entry that
    /// looked like the same question, so callers can avoid caching it twice.
    Miss {
        pending_duplicate: Option<CachedQuestionId>,
    },
}

impl LookupOutcome {
    pub fn miss() -> Self {
        LookupOutcome::Miss {
            pending_duplicate: None,
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        matches!(self, LookupOutcome::Hit(_))
    }

    pub fn as_match(&self) -> Option<&QuestionMatch> {
        match self {
            LookupOutcome::Hit(found) => Some(found),
            LookupOutcome::Miss { .. } => None,
        }
    }

    pub fn into_match(self) -> Option<QuestionMatch> {
        match self {
            LookupOutcome::Hit(found) => Some(found),
            LookupOutcome::Miss { .. } => None,
        }
    }

    pub fn pending_duplicate(&self) -> Option<CachedQuestionId> {
        match self {
            LookupOutcome::Hit(_) => None,
            LookupOutcome::Miss { pending_duplicate } => *pending_duplicate,
        }
    }

    pub fn as_header_value(&self) -> &'static str {
        match self {
            LookupOutcome::Hit(found) => found.layer.as_header_value(),
            LookupOutcome::Miss { .. } => TITRATE_STATUS_MISS,
        }
    }
}

/// One pool entry with its signature scores, for match explanations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateScore {
    pub id: CachedQuestionId,
    pub question_text: String,
    pub approved: bool,
    pub scores: SignatureScores,
}

/// Why a question did or did not match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    pub signature: QuestionSignature,
    pub outcome: LookupOutcome,
    /// Closest pool entries by combined signature score.
    pub candidates: Vec<CandidateScore>,
}
