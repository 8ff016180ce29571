//! Approval and correction of cached answers.
//!
//! Entries move `Pending -> Approved` when an administrator approves or
//! corrects an interaction, stay `Approved` through later corrections, and
//! deleting an approved entry hands its interactions back for review.

mod error;
mod types;
mod workflow;


pub use error::{ReviewError, ReviewResult};
pub use types::{
    BulkCorrected, BulkCorrectionReport, BulkFailure, DeletionReport, SIMILAR_INTERACTIONS_LIMIT,
    similarity_terms,
};
pub use workflow::ReviewWorkflow;
