use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{
    ApprovalState, CacheStatistics, CachedQuestion, CachedQuestionId, ChatType, CorrectionSource,
    Feedback, Interaction, InteractionId, MonotonicClock, NewCachedQuestion, NewInteraction,
    QuestionStore, Resolution, StoreError, StoreResult, TopQuestion,
};

#[derive(Debug, Default)]
struct Tables {
    questions: BTreeMap<CachedQuestionId, CachedQuestion>,
    interactions: BTreeMap<InteractionId, Interaction>,
    next_question_id: CachedQuestionId,
    next_interaction_id: InteractionId,
}

impl Tables {
    fn insert_question(&mut self, entry: NewCachedQuestion, now: DateTime<Utc>) -> CachedQuestionId {
        self.next_question_id += 1;
        let id = self.next_question_id;
        self.questions.insert(
            id,
            CachedQuestion {
                id,
                question_text: entry.question_text,
                fingerprint: entry.fingerprint,
                answer: entry.answer,
                embedding: entry.embedding,
                image_hash: entry.image_hash,
                times_used: 1,
                last_used: now,
                created_at: now,
                approval: entry.approval,
                metadata: entry.metadata,
            },
        );
        id
    }

    fn latest(&self, matches: impl Fn(&CachedQuestion) -> bool) -> Option<&CachedQuestion> {
        self.questions
            .values()
            .filter(|q| matches(q))
            .max_by_key(|q| (q.last_used, q.id))
    }

    fn bump_latest(
        &mut self,
        now: DateTime<Utc>,
        matches: impl Fn(&CachedQuestion) -> bool,
    ) -> Option<CachedQuestion> {
        let id = self.latest(matches)?.id;
        let entry = self.questions.get_mut(&id)?;
        entry.times_used += 1;
        entry.last_used = now;
        Some(entry.clone())
    }

    fn cascade_delete(&mut self, id: CachedQuestionId) -> StoreResult<Vec<InteractionId>> {
        self.questions
            .remove(&id)
            .ok_or_else(|| StoreError::cached_question(id))?;

        let mut affected = Vec::new();
        for interaction in self.interactions.values_mut() {
            if interaction.cached_question_id == Some(id) {
                interaction.cached_question_id = None;
                interaction.is_corrected = false;
                interaction.corrected_text = None;
                interaction.cache_link_severed = true;
                affected.push(interaction.id);
            }
        }
        Ok(affected)
    }

    fn newest_interactions(
        &self,
        filter: impl Fn(&Interaction) -> bool,
        limit: usize,
    ) -> Vec<Interaction> {
        let mut rows: Vec<&Interaction> = self.interactions.values().filter(|i| filter(i)).collect();
        rows.sort_by_key(|i| Reverse((i.created_at, i.id)));
        rows.into_iter().take(limit).cloned().collect()
    }
}

/// Volatile [`QuestionStore`] guarded by a single lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    clock: MonotonicClock,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrites an entry's `last_used`. Only for tests exercising stale purges.
    #[cfg(any(test, feature = "mock"))]
    pub fn set_last_used(&self, id: CachedQuestionId, last_used: DateTime<Utc>) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let entry = tables
            .questions
            .get_mut(&id)
            .ok_or_else(|| StoreError::cached_question(id))?;
        entry.last_used = last_used;
        Ok(())
    }
}

impl QuestionStore for MemoryStore {
    async fn find_by_image_hash(&self, image_hash: &str) -> StoreResult<Option<CachedQuestion>> {
        let now = self.clock.now();
        let mut tables = self.tables.write();
        Ok(tables.bump_latest(now, |q| q.image_hash.as_deref() == Some(image_hash)))
    }

    async fn find_by_fingerprint(&self, fingerprint: &str) -> StoreResult<Option<CachedQuestion>> {
        let now = self.clock.now();
        let mut tables = self.tables.write();
        Ok(tables.bump_latest(now, |q| q.fingerprint == fingerprint))
    }

    async fn peek_by_image_hash(&self, image_hash: &str) -> StoreResult<Option<CachedQuestion>> {
        let tables = self.tables.read();
        Ok(tables
            .latest(|q| q.image_hash.as_deref() == Some(image_hash))
            .cloned())
    }

    async fn peek_by_fingerprint(&self, fingerprint: &str) -> StoreResult<Option<CachedQuestion>> {
        let tables = self.tables.read();
        Ok(tables.latest(|q| q.fingerprint == fingerprint).cloned())
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<CachedQuestion>> {
        self.list(limit, 0).await
    }

    async fn get(&self, id: CachedQuestionId) -> StoreResult<Option<CachedQuestion>> {
        Ok(self.tables.read().questions.get(&id).cloned())
    }

    async fn list(&self, limit: usize, offset: usize) -> StoreResult<Vec<CachedQuestion>> {
        let tables = self.tables.read();
        let mut rows: Vec<&CachedQuestion> = tables.questions.values().collect();
        rows.sort_by_key(|q| Reverse((q.last_used, q.id)));
        Ok(rows.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn insert(&self, entry: NewCachedQuestion) -> StoreResult<CachedQuestionId> {
        let now = self.clock.now();
        Ok(self.tables.write().insert_question(entry, now))
    }

    async fn record_hit(&self, id: CachedQuestionId) -> StoreResult<()> {
        let now = self.clock.now();
        let mut tables = self.tables.write();
        let entry = tables
            .questions
            .get_mut(&id)
            .ok_or_else(|| StoreError::cached_question(id))?;
        entry.times_used += 1;
        entry.last_used = now;
        Ok(())
    }

    async fn update_answer(
        &self,
        id: CachedQuestionId,
        answer: &str,
        source: CorrectionSource,
    ) -> StoreResult<()> {
        let now = self.clock.now();
        let mut tables = self.tables.write();
        let entry = tables
            .questions
            .get_mut(&id)
            .ok_or_else(|| StoreError::cached_question(id))?;
        entry.answer = answer.to_string();
        entry.approval = ApprovalState::Approved {
            corrected_at: now,
            source,
        };
        Ok(())
    }

    async fn delete(&self, id: CachedQuestionId) -> StoreResult<Vec<InteractionId>> {
        self.tables.write().cascade_delete(id)
    }

    async fn purge_stale(
        &self,
        cutoff: DateTime<Utc>,
        min_usage: i64,
    ) -> StoreResult<Vec<CachedQuestionId>> {
        let mut tables = self.tables.write();
        let stale: Vec<CachedQuestionId> = tables
            .questions
            .values()
            .filter(|q| q.last_used < cutoff && q.times_used < min_usage)
            .map(|q| q.id)
            .collect();
        for id in &stale {
            tables.cascade_delete(*id)?;
        }
        Ok(stale)
    }

    async fn statistics(&self, top_n: usize) -> StoreResult<CacheStatistics> {
        let tables = self.tables.read();
        let total_cached = tables.questions.len() as i64;
        let total_hits = tables.questions.values().map(|q| q.times_used).sum();
        let corrected_count = tables
            .questions
            .values()
            .filter(|q| q.approval.is_approved())
            .count() as i64;

        let mut ranked: Vec<&CachedQuestion> = tables.questions.values().collect();
        ranked.sort_by_key(|q| (Reverse(q.times_used), q.id));
        let top_questions = ranked
            .into_iter()
            .take(top_n)
            .map(|q| TopQuestion {
                question_text: q.question_text.clone(),
                times_used: q.times_used,
            })
            .collect();

        Ok(CacheStatistics::from_totals(
            total_cached,
            total_hits,
            corrected_count,
            top_questions,
        ))
    }

    async fn insert_interaction(&self, interaction: NewInteraction) -> StoreResult<InteractionId> {
        let now = self.clock.now();
        let mut tables = self.tables.write();
        if let Some(cached_id) = interaction.cached_question_id
            && !tables.questions.contains_key(&cached_id)
        {
            return Err(StoreError::cached_question(cached_id));
        }

        tables.next_interaction_id += 1;
        let id = tables.next_interaction_id;
        tables.interactions.insert(
            id,
            Interaction {
                id,
                user_id: interaction.user_id,
                created_at: now,
                user_input: interaction.user_input,
                bot_response: interaction.bot_response,
                is_corrected: false,
                corrected_text: None,
                feedback: Feedback::Neutral,
                chat_type: interaction.chat_type,
                image_path: interaction.image_path,
                cached_question_id: interaction.cached_question_id,
                cache_link_severed: false,
            },
        );
        Ok(id)
    }

    async fn interaction(&self, id: InteractionId) -> StoreResult<Option<Interaction>> {
        Ok(self.tables.read().interactions.get(&id).cloned())
    }

    async fn linked_interactions(&self, cached_id: CachedQuestionId) -> StoreResult<Vec<Interaction>> {
        Ok(self
            .tables
            .read()
            .interactions
            .values()
            .filter(|i| i.cached_question_id == Some(cached_id))
            .cloned()
            .collect())
    }

    async fn unapproved_interactions(&self, limit: usize) -> StoreResult<Vec<Interaction>> {
        let tables = self.tables.read();
        Ok(tables.newest_interactions(
            |i| {
                i.chat_type == ChatType::Scientific
                    && !i.is_corrected
                    && i.cached_question_id.is_none()
            },
            limit,
        ))
    }

    async fn search_uncorrected(
        &self,
        terms: &[String],
        exclude: Option<InteractionId>,
        limit: usize,
    ) -> StoreResult<Vec<Interaction>> {
        let terms: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();
        let tables = self.tables.read();
        Ok(tables.newest_interactions(
            |i| {
                let input = i.user_input.to_lowercase();
                !i.is_corrected
                    && i.feedback != Feedback::Positive
                    && Some(i.id) != exclude
                    && terms.iter().all(|t| input.contains(t.as_str()))
            },
            limit,
        ))
    }

    async fn set_feedback(&self, id: InteractionId, feedback: Feedback) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let interaction = tables
            .interactions
            .get_mut(&id)
            .ok_or_else(|| StoreError::interaction(id))?;
        interaction.feedback = feedback;
        Ok(())
    }

    async fn resolve_interaction(
        &self,
        id: InteractionId,
        resolution: Resolution,
    ) -> StoreResult<CachedQuestionId> {
        let now = self.clock.now();
        let mut tables = self.tables.write();

        let link = tables
            .interactions
            .get(&id)
            .ok_or_else(|| StoreError::interaction(id))?
            .cached_question_id;

        let cached_id = match link {
            Some(cached_id) => {
                let entry = tables
                    .questions
                    .get_mut(&cached_id)
                    .ok_or_else(|| StoreError::cached_question(cached_id))?;
                entry.answer = resolution.answer.clone();
                entry.approval = ApprovalState::Approved {
                    corrected_at: now,
                    source: resolution.source,
                };
                cached_id
            }
            None => {
                let entry = resolution.new_entry.ok_or(StoreError::Unlinked { id })?;
                tables.insert_question(entry, now)
            }
        };

        let interaction = tables
            .interactions
            .get_mut(&id)
            .ok_or_else(|| StoreError::interaction(id))?;
        interaction.is_corrected = true;
        interaction.corrected_text = Some(resolution.answer);
        interaction.feedback = resolution.feedback;
        interaction.cached_question_id = Some(cached_id);
        interaction.cache_link_severed = false;
        Ok(cached_id)
    }

    async fn delete_interaction(&self, id: InteractionId) -> StoreResult<()> {
        self.tables
            .write()
            .interactions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::interaction(id))
    }
}
