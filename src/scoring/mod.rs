//! Similarity between question signatures and between embedding vectors.
//!
//! Text similarity is a longest-matching-block ratio rather than an edit
//! distance, so reordered OCR lines still share long blocks. Token sets use
//! Jaccard overlap, and the four signature scores fold into one weighted
//! `combined` value that the deduplication cascade compares against
//! [`MatchThresholds`](crate::constants::MatchThresholds).

pub mod sequence;
pub mod similarity;
pub mod types;

#[cfg(test)]
mod tests;

pub use sequence::sequence_ratio;
pub use similarity::{
    combine_scores, cosine_similarity, fuzzy_text_similarity, set_overlap, signature_similarity,
};
pub use types::{MatchConfidence, SignatureScores};
