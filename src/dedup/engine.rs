use tracing::{debug, info, instrument, warn};

use super::pool::RecencyPool;
use super::{
    CandidateScore, DedupConfig, DedupError, DedupResult, LookupOutcome, MatchLayer, MatchReport,
    QuestionMatch,
};
use crate::constants::DEFAULT_TOP_QUESTIONS;
use crate::embedding::Embedder;
use crate::scoring::MatchConfidence;
use crate::signature::{QuestionSignature, fingerprint, signature};
use crate::store::{
    ApprovalState, CacheStatistics, CachedQuestion, CachedQuestionId, CorrectionSource, Metadata,
    NewCachedQuestion, QuestionStore,
};

const EXPLAIN_CANDIDATES: usize = 5;

/// Whether a lookup serves its hit (and counts the use) or only reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupMode {
    Serve,
    Preview,
}

/// Three-layer question matcher in front of a [`QuestionStore`].
///
/// Holds no state besides its collaborators, so one instance can be shared
/// behind an `Arc` by every request handler. Concurrent `cache_question` calls
/// for the same text may both insert; duplicates are reconciled at review.
pub struct QuestionDeduplicator<E: Embedder, S: QuestionStore> {
    embedder: E,
    store: S,
    config: DedupConfig,
}

impl<E: Embedder, S: QuestionStore> std::fmt::Debug for QuestionDeduplicator<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionDeduplicator")
            .field("config", &self.config)
            .field("stub_embedder", &self.embedder.is_stub())
            .finish_non_exhaustive()
    }
}

impl<E: Embedder, S: QuestionStore> QuestionDeduplicator<E, S> {
    pub fn new(embedder: E, store: S, config: DedupConfig) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Finds an approved cache entry asking the same question.
    ///
    /// Layers run in order and stop at the first hit:
    /// 1. image hash equality
    /// 2. question signature (exact fingerprint, then the recency pool)
    /// 3. embedding similarity over the recency pool
    ///
    /// Store and embedding failures are logged and treated as "no match from
    /// this layer"; lookups never fail.
    #[instrument(skip(self, text, image_hash), fields(text_len = text.len(), has_image = image_hash.is_some()))]
    pub async fn find_similar_question(
        &self,
        text: &str,
        image_hash: Option<&str>,
    ) -> LookupOutcome {
        self.lookup(text, &signature(text), image_hash, LookupMode::Serve)
            .await
    }

    async fn lookup(
        &self,
        text: &str,
        query: &QuestionSignature,
        image_hash: Option<&str>,
        mode: LookupMode,
    ) -> LookupOutcome {
        let mut pending_duplicate = None;

        if let Some(hash) = image_hash {
            let found = match mode {
                LookupMode::Serve => self.store.find_by_image_hash(hash).await,
                LookupMode::Preview => self.store.peek_by_image_hash(hash).await,
            };
            match found {
                Ok(Some(entry)) if entry.is_servable() => {
                    info!(id = entry.id, layer = "image_hash", "Cache hit");
                    return LookupOutcome::Hit(QuestionMatch {
                        entry,
                        layer: MatchLayer::ImageHash,
                        score: 1.0,
                    });
                }
                Ok(Some(entry)) => {
                    debug!(id = entry.id, "Image matches an entry pending review");
                    pending_duplicate = Some(entry.id);
                }
                Ok(None) => debug!("No entry with this image hash"),
                Err(e) => warn!(error = %e, "Image hash lookup failed"),
            }
        }

        if !query.fingerprint.is_empty() {
            let found = match mode {
                LookupMode::Serve => self.store.find_by_fingerprint(&query.fingerprint).await,
                LookupMode::Preview => self.store.peek_by_fingerprint(&query.fingerprint).await,
            };
            match found {
                Ok(Some(entry)) if entry.is_servable() => {
                    info!(id = entry.id, layer = "signature", confidence = "exact", "Cache hit");
                    return LookupOutcome::Hit(QuestionMatch {
                        entry,
                        layer: MatchLayer::Signature(MatchConfidence::Exact),
                        score: 1.0,
                    });
                }
                Ok(Some(entry)) => {
                    debug!(id = entry.id, "Fingerprint matches an entry pending review");
                    pending_duplicate.get_or_insert(entry.id);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Fingerprint lookup failed"),
            }
        }

        let pool = match RecencyPool::load(&self.store, self.config.pool_size).await {
            Ok(pool) => pool,
            Err(e) => {
                warn!(error = %e, "Failed to load recency pool");
                return LookupOutcome::Miss { pending_duplicate };
            }
        };
        debug!(pool_size = pool.len(), "Loaded recency pool");

        let scan = pool.scan_signatures(query, &self.config.thresholds);
        if let Some((candidate, band)) = scan.confident_match(&self.config.thresholds) {
            let score = candidate.score.combined;
            if band == MatchConfidence::Medium {
                info!(
                    id = candidate.entry.id,
                    score,
                    layer = "signature",
                    confidence = "medium",
                    "Serving low-confidence signature match"
                );
            } else {
                info!(
                    id = candidate.entry.id,
                    score,
                    layer = "signature",
                    confidence = band.as_str(),
                    "Cache hit"
                );
            }
            let entry = self.touch(candidate.entry.clone(), mode).await;
            return LookupOutcome::Hit(QuestionMatch {
                entry,
                layer: MatchLayer::Signature(band),
                score,
            });
        }
        if pending_duplicate.is_none() {
            pending_duplicate = scan.pending_duplicate;
        }

        let embedding = match self.embed(text).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(error = %e, "Skipping semantic layer");
                return LookupOutcome::Miss { pending_duplicate };
            }
        };

        if let Some(candidate) = pool.nearest_embedding(&embedding) {
            if candidate.score >= self.config.thresholds.semantic {
                info!(
                    id = candidate.entry.id,
                    score = candidate.score,
                    layer = "semantic",
                    "Cache hit"
                );
                let entry = self.touch(candidate.entry.clone(), mode).await;
                return LookupOutcome::Hit(QuestionMatch {
                    entry,
                    layer: MatchLayer::Semantic,
                    score: candidate.score,
                });
            }
            debug!(best_score = candidate.score, "Semantic layer below threshold");
        }

        debug!(pending_duplicate, "Cache miss");
        LookupOutcome::Miss { pending_duplicate }
    }

    /// Bumps usage of an entry about to be served. Failure only costs the count.
    async fn touch(&self, mut entry: CachedQuestion, mode: LookupMode) -> CachedQuestion {
        if mode == LookupMode::Preview {
            return entry;
        }
        match self.store.record_hit(entry.id).await {
            Ok(()) => entry.times_used += 1,
            Err(e) => warn!(id = entry.id, error = %e, "Failed to record cache hit"),
        }
        entry
    }

    async fn embed(&self, text: &str) -> DedupResult<Vec<f32>> {
        let timeout = self.config.embed_timeout;
        match tokio::time::timeout(timeout, self.embedder.embed(text)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(DedupError::EmbeddingTimeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Builds a complete entry for `text`, embedding it first.
    ///
    /// Nothing is written; callers insert the result once every fallible step
    /// has succeeded.
    pub async fn prepare_entry(
        &self,
        text: &str,
        answer: &str,
        image_hash: Option<String>,
        metadata: Metadata,
        approval: ApprovalState,
    ) -> DedupResult<NewCachedQuestion> {
        if text.trim().is_empty() {
            return Err(DedupError::EmptyQuestion);
        }
        let embedding = self.embed(text).await?;
        Ok(NewCachedQuestion {
            question_text: text.to_string(),
            fingerprint: fingerprint(text),
            answer: answer.to_string(),
            embedding: Some(embedding),
            image_hash,
            metadata,
            approval,
        })
    }

    /// Stores a freshly generated answer as pending review.
    ///
    /// Embedding happens before the insert, so a failed, timed out or
    /// cancelled call leaves the store untouched.
    #[instrument(skip(self, text, answer, image_hash, metadata), fields(text_len = text.len()))]
    pub async fn cache_question(
        &self,
        text: &str,
        answer: &str,
        image_hash: Option<&str>,
        metadata: Option<Metadata>,
    ) -> DedupResult<CachedQuestionId> {
        let entry = self
            .prepare_entry(
                text,
                answer,
                image_hash.map(str::to_string),
                metadata.unwrap_or_default(),
                ApprovalState::Pending,
            )
            .await?;
        let id = self.store.insert(entry).await?;
        info!(id, "Cached question pending review");
        Ok(id)
    }

    /// Overwrites an entry's answer and marks it approved.
    #[instrument(skip(self, answer))]
    pub async fn update_cached_answer(
        &self,
        id: CachedQuestionId,
        answer: &str,
        source: CorrectionSource,
    ) -> DedupResult<()> {
        self.store.update_answer(id, answer, source).await?;
        info!(id, %source, "Updated cached answer");
        Ok(())
    }

    pub async fn get_statistics(&self) -> DedupResult<CacheStatistics> {
        Ok(self.store.statistics(DEFAULT_TOP_QUESTIONS).await?)
    }

    /// Reports what a lookup would return, with the signature and closest pool
    /// entries. Nothing is served, so usage counters stay untouched.
    #[instrument(skip(self, text, image_hash), fields(text_len = text.len()))]
    pub async fn explain_match(&self, text: &str, image_hash: Option<&str>) -> MatchReport {
        let query = signature(text);
        let outcome = self
            .lookup(text, &query, image_hash, LookupMode::Preview)
            .await;

        let candidates = match RecencyPool::load(&self.store, self.config.pool_size).await {
            Ok(pool) => pool
                .ranked_by_signature(&query)
                .into_iter()
                .take(EXPLAIN_CANDIDATES)
                .map(|candidate| CandidateScore {
                    id: candidate.entry.id,
                    question_text: candidate.entry.question_text.clone(),
                    approved: candidate.entry.is_servable(),
                    scores: candidate.score,
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, "Failed to load recency pool for explanation");
                Vec::new()
            }
        };

        MatchReport {
            signature: query,
            outcome,
            candidates,
        }
    }
}
