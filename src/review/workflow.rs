use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, instrument, warn};

use super::types::{
    BulkCorrected, BulkCorrectionReport, BulkFailure, DeletionReport, SIMILAR_INTERACTIONS_LIMIT,
    similarity_terms,
};
use super::{ReviewError, ReviewResult};
use crate::dedup::{LookupOutcome, QuestionDeduplicator};
use crate::embedding::Embedder;
use crate::hashing::hash_image_file;
use crate::store::{
    ApprovalState, CachedQuestion, CachedQuestionId, CorrectionSource, Feedback, Interaction,
    InteractionId, Metadata, NewCachedQuestion, NewInteraction, QuestionStore, Resolution,
    StoreError,
};

/// Administrator actions on interactions and cache entries.
///
/// Every approval or correction updates the cache entry and the interaction
/// in one store transaction.
pub struct ReviewWorkflow<E: Embedder, S: QuestionStore> {
    engine: Arc<QuestionDeduplicator<E, S>>,
    assets_dir: Option<PathBuf>,
}

impl<E: Embedder, S: QuestionStore> std::fmt::Debug for ReviewWorkflow<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewWorkflow")
            .field("engine", &self.engine)
            .field("assets_dir", &self.assets_dir)
            .finish()
    }
}

impl<E: Embedder, S: QuestionStore> ReviewWorkflow<E, S> {
    pub fn new(engine: Arc<QuestionDeduplicator<E, S>>) -> Self {
        Self {
            engine,
            assets_dir: None,
        }
    }

    /// Resolves relative interaction image paths against `dir`.
    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = Some(dir.into());
        self
    }

    pub fn engine(&self) -> &Arc<QuestionDeduplicator<E, S>> {
        &self.engine
    }

    fn store(&self) -> &S {
        self.engine.store()
    }

    #[instrument(skip(self, interaction), fields(user_id = interaction.user_id))]
    pub async fn record_interaction(&self, interaction: NewInteraction) -> ReviewResult<InteractionId> {
        if interaction.user_input.trim().is_empty() {
            return Err(ReviewError::validation("user input is empty"));
        }
        if interaction.bot_response.trim().is_empty() {
            return Err(ReviewError::validation("bot response is empty"));
        }
        let id = self.store().insert_interaction(interaction).await?;
        debug!(id, "Recorded interaction");
        Ok(id)
    }

    pub async fn interaction(&self, id: InteractionId) -> ReviewResult<Interaction> {
        self.store()
            .interaction(id)
            .await?
            .ok_or(ReviewError::InteractionNotFound { id })
    }

    pub async fn cached_question(&self, id: CachedQuestionId) -> ReviewResult<CachedQuestion> {
        self.store()
            .get(id)
            .await?
            .ok_or(ReviewError::CachedQuestionNotFound { id })
    }

    pub async fn list_cached(&self, limit: usize, offset: usize) -> ReviewResult<Vec<CachedQuestion>> {
        Ok(self.store().list(limit, offset).await?)
    }

    /// Accepts the bot's own answer as correct.
    #[instrument(skip(self))]
    pub async fn approve(&self, id: InteractionId) -> ReviewResult<CachedQuestionId> {
        let interaction = self.interaction(id).await?;
        let answer = interaction.bot_response.clone();
        let cached_id = self
            .resolve(
                &interaction,
                answer,
                CorrectionSource::AdminApproval,
                Feedback::Positive,
            )
            .await?;
        info!(interaction_id = id, cached_id, "Approved interaction");
        Ok(cached_id)
    }

    /// Replaces the bot's answer with `text`.
    #[instrument(skip(self, text))]
    pub async fn correct(
        &self,
        id: InteractionId,
        text: &str,
        with_faq: bool,
    ) -> ReviewResult<CachedQuestionId> {
        let text = non_empty(text, "correction text")?;
        let source = if with_faq {
            CorrectionSource::ManualWithFaq
        } else {
            CorrectionSource::ManualCorrection
        };
        let interaction = self.interaction(id).await?;
        let cached_id = self
            .resolve(&interaction, text.to_string(), source, Feedback::Neutral)
            .await?;
        info!(interaction_id = id, cached_id, %source, "Corrected interaction");
        Ok(cached_id)
    }

    /// Applies one correction to many interactions. Each interaction is
    /// resolved atomically on its own; failures do not undo earlier successes.
    #[instrument(skip(self, ids, text), fields(count = ids.len()))]
    pub async fn bulk_correct(
        &self,
        ids: &[InteractionId],
        text: &str,
    ) -> ReviewResult<BulkCorrectionReport> {
        if ids.is_empty() {
            return Err(ReviewError::validation("no interactions selected"));
        }
        let text = non_empty(text, "correction text")?;

        let mut report = BulkCorrectionReport::default();
        for &interaction_id in ids {
            let result = match self.interaction(interaction_id).await {
                Ok(interaction) => {
                    self.resolve(
                        &interaction,
                        text.to_string(),
                        CorrectionSource::BulkCorrection,
                        Feedback::Neutral,
                    )
                    .await
                }
                Err(e) => Err(e),
            };
            match result {
                Ok(cached_question_id) => report.updated.push(BulkCorrected {
                    interaction_id,
                    cached_question_id,
                }),
                Err(e) => {
                    warn!(interaction_id, error = %e, "Bulk correction failed for interaction");
                    report.failed.push(BulkFailure {
                        interaction_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            updated = report.updated.len(),
            failed = report.failed.len(),
            "Bulk correction finished"
        );
        Ok(report)
    }

    async fn resolve(
        &self,
        interaction: &Interaction,
        answer: String,
        source: CorrectionSource,
        feedback: Feedback,
    ) -> ReviewResult<CachedQuestionId> {
        let new_entry = match interaction.cached_question_id {
            Some(_) => None,
            None => Some(self.approved_entry(interaction, &answer, source).await?),
        };
        let resolution = |new_entry| Resolution {
            answer: answer.clone(),
            source,
            feedback,
            new_entry,
        };

        match self
            .store()
            .resolve_interaction(interaction.id, resolution(new_entry))
            .await
        {
            // The link was severed after the interaction was read.
            Err(StoreError::Unlinked { .. }) => {
                debug!(interaction_id = interaction.id, "Cache link severed, inserting new entry");
                let entry = self.approved_entry(interaction, &answer, source).await?;
                Ok(self
                    .store()
                    .resolve_interaction(interaction.id, resolution(Some(entry)))
                    .await?)
            }
            result => Ok(result?),
        }
    }

    async fn approved_entry(
        &self,
        interaction: &Interaction,
        answer: &str,
        source: CorrectionSource,
    ) -> ReviewResult<NewCachedQuestion> {
        let image_hash = self.image_hash_for(interaction).await;
        Ok(self
            .engine
            .prepare_entry(
                &interaction.user_input,
                answer,
                image_hash,
                correction_metadata(source),
                ApprovalState::approved_now(source),
            )
            .await?)
    }

    /// Hash of the interaction's image, if it has one and it is readable.
    async fn image_hash_for(&self, interaction: &Interaction) -> Option<String> {
        let path = Path::new(interaction.image_path.as_deref()?);
        let resolved = match &self.assets_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        };
        match hash_image_file(&resolved).await {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!(path = %resolved.display(), error = %e, "Could not hash interaction image");
                None
            }
        }
    }

    /// Deletes a cache entry. Interactions that pointed at it lose their
    /// correction and show up for review again.
    #[instrument(skip(self))]
    pub async fn delete_cached(&self, id: CachedQuestionId) -> ReviewResult<DeletionReport> {
        let affected_interactions = self.store().delete(id).await?;
        info!(
            id,
            affected = affected_interactions.len(),
            "Deleted cached question"
        );
        Ok(DeletionReport {
            cached_question_id: id,
            affected_interactions,
        })
    }

    #[instrument(skip(self))]
    pub async fn delete_interaction(&self, id: InteractionId) -> ReviewResult<()> {
        self.store().delete_interaction(id).await?;
        info!(id, "Deleted interaction");
        Ok(())
    }

    /// Clears a user's feedback on an interaction.
    pub async fn dismiss_feedback(&self, id: InteractionId) -> ReviewResult<()> {
        self.store().set_feedback(id, Feedback::Neutral).await?;
        debug!(id, "Dismissed feedback");
        Ok(())
    }

    /// Overwrites the answer of whichever approved entry the cascade matches
    /// for `question_text`.
    #[instrument(skip(self, question_text, answer))]
    pub async fn force_update(
        &self,
        question_text: &str,
        answer: &str,
    ) -> ReviewResult<CachedQuestionId> {
        let question_text = non_empty(question_text, "question text")?;
        let answer = non_empty(answer, "answer")?;

        let found = match self.engine.find_similar_question(question_text, None).await {
            LookupOutcome::Hit(found) => found,
            LookupOutcome::Miss { .. } => return Err(ReviewError::NoSimilarQuestion),
        };
        self.engine
            .update_cached_answer(found.entry.id, answer, CorrectionSource::ManualForceUpdate)
            .await?;
        info!(id = found.entry.id, layer = %found.layer, "Force-updated cached answer");
        Ok(found.entry.id)
    }

    /// Deletes entries unused for `older_than_days` with fewer than `min_usage` uses.
    #[instrument(skip(self))]
    pub async fn purge_stale(
        &self,
        older_than_days: u32,
        min_usage: i64,
    ) -> ReviewResult<Vec<CachedQuestionId>> {
        let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
        let purged = self.store().purge_stale(cutoff, min_usage).await?;
        info!(count = purged.len(), "Purged stale cached questions");
        Ok(purged)
    }

    pub async fn unapproved(&self, limit: usize) -> ReviewResult<Vec<Interaction>> {
        Ok(self.store().unapproved_interactions(limit).await?)
    }

    /// Uncorrected interactions that share the leading distinctive words of `id`.
    pub async fn similar_uncorrected(&self, id: InteractionId) -> ReviewResult<Vec<Interaction>> {
        let interaction = self.interaction(id).await?;
        let terms = similarity_terms(&interaction.user_input);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .store()
            .search_uncorrected(&terms, Some(id), SIMILAR_INTERACTIONS_LIMIT)
            .await?)
    }

    pub async fn linked_interactions(&self, cached_id: CachedQuestionId) -> ReviewResult<Vec<Interaction>> {
        self.cached_question(cached_id).await?;
        Ok(self.store().linked_interactions(cached_id).await?)
    }
}

/// Marks an entry created by an administrator with where its answer came from.
fn correction_metadata(source: CorrectionSource) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("corrected".to_string(), true.into());
    metadata.insert("source".to_string(), source.as_str().into());
    if source == CorrectionSource::BulkCorrection {
        metadata.insert("bulk_corrected".to_string(), true.into());
    }
    metadata
}

fn non_empty<'a>(value: &'a str, what: &str) -> ReviewResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ReviewError::validation(format!("{what} is empty")));
    }
    Ok(trimmed)
}
