use crate::constants::MatchThresholds;
use crate::scoring::{MatchConfidence, SignatureScores, cosine_similarity, signature_similarity};
use crate::signature::{QuestionSignature, signature};
use crate::store::{CachedQuestion, CachedQuestionId, QuestionStore, StoreResult};

/// Snapshot of the most recently used cache entries, newest first.
///
/// Loaded fresh for every lookup; this is the only set the signature and
/// semantic layers scan.
#[derive(Debug, Clone, Default)]
pub struct RecencyPool {
    entries: Vec<CachedQuestion>,
}

/// Best candidate from one scan of the pool.
#[derive(Debug, Clone, Copy)]
pub struct PoolCandidate<'a, T> {
    pub entry: &'a CachedQuestion,
    pub score: T,
}

/// Result of scoring every pool entry against one signature.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureScan<'a> {
    /// Highest-scoring approved entry, regardless of threshold.
    pub best: Option<PoolCandidate<'a, SignatureScores>>,
    /// Highest-scoring pending entry at or above the high-confidence band.
    pub pending_duplicate: Option<CachedQuestionId>,
}

impl<'a> SignatureScan<'a> {
    /// The best approved match, if it clears the medium band.
    pub fn confident_match(
        &self,
        thresholds: &MatchThresholds,
    ) -> Option<(PoolCandidate<'a, SignatureScores>, MatchConfidence)> {
        let best = self.best?;
        best.score.confidence(thresholds).map(|band| (best, band))
    }
}

impl RecencyPool {
    pub async fn load<S: QuestionStore>(store: &S, capacity: usize) -> StoreResult<Self> {
        Ok(Self::from_entries(store.recent(capacity).await?))
    }

    pub fn from_entries(entries: Vec<CachedQuestion>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CachedQuestion> {
        self.entries.iter()
    }

    /// Entries that may be served.
    pub fn approved(&self) -> impl Iterator<Item = &CachedQuestion> {
        self.entries.iter().filter(|entry| entry.is_servable())
    }

    pub fn scan_signatures(
        &self,
        query: &QuestionSignature,
        thresholds: &MatchThresholds,
    ) -> SignatureScan<'_> {
        let mut scan = SignatureScan::default();
        let mut best_pending: Option<f64> = None;

        for entry in &self.entries {
            let scores = signature_similarity(query, &signature(&entry.question_text));

            if entry.is_servable() {
                let better = scan
                    .best
                    .is_none_or(|best| scores.combined > best.score.combined);
                if better {
                    scan.best = Some(PoolCandidate {
                        entry,
                        score: scores,
                    });
                }
            } else if scores.combined >= thresholds.high_confidence
                && best_pending.is_none_or(|best| scores.combined > best)
            {
                best_pending = Some(scores.combined);
                scan.pending_duplicate = Some(entry.id);
            }
        }

        scan
    }

    /// Closest approved entry by embedding cosine similarity.
    pub fn nearest_embedding(&self, query: &[f32]) -> Option<PoolCandidate<'_, f64>> {
        self.approved()
            .filter_map(|entry| {
                let embedding = entry.embedding.as_deref()?;
                Some(PoolCandidate {
                    entry,
                    score: cosine_similarity(query, embedding),
                })
            })
            .fold(None, |best: Option<PoolCandidate<'_, f64>>, candidate| match best {
                Some(best) if best.score >= candidate.score => Some(best),
                _ => Some(candidate),
            })
    }

    /// Every entry scored against `query`, best first. Used for match explanations.
    pub fn ranked_by_signature(
        &self,
        query: &QuestionSignature,
    ) -> Vec<PoolCandidate<'_, SignatureScores>> {
        let mut ranked: Vec<_> = self
            .entries
            .iter()
            .map(|entry| PoolCandidate {
                entry,
                score: signature_similarity(query, &signature(&entry.question_text)),
            })
            .collect();
        ranked.sort_by(|a, b| b.score.combined.total_cmp(&a.score.combined));
        ranked
    }
}
