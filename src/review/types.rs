use serde::Serialize;

use crate::store::{CachedQuestionId, InteractionId};

/// Max interactions returned by a similarity search.
pub const SIMILAR_INTERACTIONS_LIMIT: usize = 20;
/// Leading words of an interaction used as search terms.
pub const SIMILAR_SEARCH_TERMS: usize = 5;
/// Words shorter than this are not used as search terms.
pub const SIMILAR_MIN_WORD_CHARS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub cached_question_id: CachedQuestionId,
    /// Interactions that were un-corrected and unlinked.
    pub affected_interactions: Vec<InteractionId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkCorrected {
    pub interaction_id: InteractionId,
    pub cached_question_id: CachedQuestionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub interaction_id: InteractionId,
    pub error: String,
}

/// Per-interaction outcome of a bulk correction. Successes are kept even when
/// other interactions fail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkCorrectionReport {
    pub updated: Vec<BulkCorrected>,
    pub failed: Vec<BulkFailure>,
}

impl BulkCorrectionReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Search terms for finding interactions that ask the same thing: the first
/// few words long enough to be distinctive.
pub fn similarity_terms(user_input: &str) -> Vec<String> {
    user_input
        .split_whitespace()
        .filter(|word| word.chars().count() >= SIMILAR_MIN_WORD_CHARS)
        .take(SIMILAR_SEARCH_TERMS)
        .map(str::to_string)
        .collect()
}
