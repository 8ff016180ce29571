//! Question deduplication.
//!
//! [`QuestionDeduplicator`] decides whether an incoming question was already
//! answered and, if not, stores the new answer for review. Only approved
//! entries are ever served; a pending entry that looks like the same question
//! is reported through [`LookupOutcome::Miss`] instead.

mod engine;
mod error;
mod pool;
mod types;

#[cfg(test)]
mod tests;

pub use engine::QuestionDeduplicator;
pub use error::{DedupError, DedupResult};
pub use pool::{PoolCandidate, RecencyPool, SignatureScan};
pub use types::{
    CandidateScore, DedupConfig, LookupOutcome, MatchLayer, MatchReport, QuestionMatch,
    TITRATE_STATUS_HEADER, TITRATE_STATUS_MISS,
};
