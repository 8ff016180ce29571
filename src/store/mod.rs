//! Question cache store.
//!
//! [`QuestionStore`] is the access contract the deduplication engine and the
//! review workflow depend on. Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: one lock per operation, nothing persisted. Used in tests
//!   and when no database path is configured.
//! - [`SqliteStore`]: durable. Every multi-row mutation runs in one
//!   transaction and blocking work is moved off the async runtime.
//!
//! # Bump-on-read
//!
//! `find_by_image_hash` and `find_by_fingerprint` increment `times_used` and
//! stamp `last_used` on the row they return, whether or not it is approved.
//! That keeps a pending duplicate inside the recency pool until it is reviewed.

mod error;
mod memory;
pub mod model;
mod sqlite;


use std::future::Future;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use model::{
    ApprovalState, CacheStatistics, CachedQuestion, CachedQuestionId, ChatType, CorrectionSource,
    Feedback, Interaction, InteractionId, Metadata, NewCachedQuestion, NewInteraction, Resolution,
    ReviewState, TopQuestion,
};
pub use sqlite::SqliteStore;

/// Persistence contract for cached questions and the interactions that reference them.
pub trait QuestionStore: Send + Sync {
    /// Latest entry (by `last_used`) with this image hash; bumps its usage.
    fn find_by_image_hash(
        &self,
        image_hash: &str,
    ) -> impl Future<Output = StoreResult<Option<CachedQuestion>>> + Send;

    /// Latest entry (by `last_used`) with this exact fingerprint; bumps its usage.
    fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> impl Future<Output = StoreResult<Option<CachedQuestion>>> + Send;

    /// Same entry [`find_by_image_hash`](Self::find_by_image_hash) would
    /// return, without touching its usage.
    fn peek_by_image_hash(
        &self,
        image_hash: &str,
    ) -> impl Future<Output = StoreResult<Option<CachedQuestion>>> + Send;

    /// Same entry [`find_by_fingerprint`](Self::find_by_fingerprint) would
    /// return, without touching its usage.
    fn peek_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> impl Future<Output = StoreResult<Option<CachedQuestion>>> + Send;

    /// The `limit` most recently used entries, newest first.
    fn recent(&self, limit: usize)
    -> impl Future<Output = StoreResult<Vec<CachedQuestion>>> + Send;

    fn get(
        &self,
        id: CachedQuestionId,
    ) -> impl Future<Output = StoreResult<Option<CachedQuestion>>> + Send;

    /// Page through entries, most recently used first.
    fn list(
        &self,
        limit: usize,
        offset: usize,
    ) -> impl Future<Output = StoreResult<Vec<CachedQuestion>>> + Send;

    /// Inserts with `times_used = 1` and exactly the approval state supplied.
    fn insert(
        &self,
        entry: NewCachedQuestion,
    ) -> impl Future<Output = StoreResult<CachedQuestionId>> + Send;

    /// Bumps usage of an entry that was just served.
    fn record_hit(&self, id: CachedQuestionId) -> impl Future<Output = StoreResult<()>> + Send;

    /// Overwrites the answer and marks the entry approved by `source`.
    fn update_answer(
        &self,
        id: CachedQuestionId,
        answer: &str,
        source: CorrectionSource,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Deletes an entry, un-correcting and unlinking every interaction that
    /// referenced it. Returns the affected interaction ids.
    fn delete(
        &self,
        id: CachedQuestionId,
    ) -> impl Future<Output = StoreResult<Vec<InteractionId>>> + Send;

    /// Deletes entries last used before `cutoff` with fewer than `min_usage`
    /// uses, with the same cascade as [`delete`](Self::delete).
    fn purge_stale(
        &self,
        cutoff: DateTime<Utc>,
        min_usage: i64,
    ) -> impl Future<Output = StoreResult<Vec<CachedQuestionId>>> + Send;

    fn statistics(&self, top_n: usize)
    -> impl Future<Output = StoreResult<CacheStatistics>> + Send;

    /// Records an exchange. A supplied cache link must point at an existing entry.
    fn insert_interaction(
        &self,
        interaction: NewInteraction,
    ) -> impl Future<Output = StoreResult<InteractionId>> + Send;

    fn interaction(
        &self,
        id: InteractionId,
    ) -> impl Future<Output = StoreResult<Option<Interaction>>> + Send;

    fn linked_interactions(
        &self,
        cached_id: CachedQuestionId,
    ) -> impl Future<Output = StoreResult<Vec<Interaction>>> + Send;

    /// Scientific interactions that are neither corrected nor linked, newest first.
    fn unapproved_interactions(
        &self,
        limit: usize,
    ) -> impl Future<Output = StoreResult<Vec<Interaction>>> + Send;

    /// Uncorrected interactions without positive feedback whose input contains
    /// every term (case-insensitive), newest first.
    fn search_uncorrected(
        &self,
        terms: &[String],
        exclude: Option<InteractionId>,
        limit: usize,
    ) -> impl Future<Output = StoreResult<Vec<Interaction>>> + Send;

    fn set_feedback(
        &self,
        id: InteractionId,
        feedback: Feedback,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Applies an approval/correction to one interaction and its cache entry
    /// in one atomic step. Returns the id of the entry now linked.
    fn resolve_interaction(
        &self,
        id: InteractionId,
        resolution: Resolution,
    ) -> impl Future<Output = StoreResult<CachedQuestionId>> + Send;

    fn delete_interaction(&self, id: InteractionId) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Microsecond wall clock that never repeats or goes backwards, so
/// `last_used` ordering is total within one process.
#[derive(Debug, Default)]
pub(crate) struct MonotonicClock {
    last_micros: AtomicI64,
}

impl MonotonicClock {
    pub(crate) fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let mut prev = self.last_micros.load(Ordering::SeqCst);
        loop {
            let next = wall.max(prev + 1);
            match self.last_micros.compare_exchange(
                prev,
                next,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return DateTime::from_timestamp_micros(next).unwrap_or_else(Utc::now),
                Err(actual) => prev = actual,
            }
        }
    }
}
