use std::collections::BTreeSet;

use super::sequence::sequence_ratio;
use super::types::SignatureScores;
use crate::constants::{FINGERPRINT_WEIGHT, FORMULA_WEIGHT, KEYWORD_WEIGHT, NUMBER_WEIGHT};
use crate::signature::QuestionSignature;

/// Character-level block-matching ratio between two fingerprints.
#[inline]
pub fn fuzzy_text_similarity(a: &str, b: &str) -> f64 {
    sequence_ratio(a, b)
}

/// Jaccard overlap. An empty side carries no signal and scores `0.0`.
pub fn set_overlap(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    shared as f64 / union as f64
}

/// Weighted sum of the four component scores.
#[inline]
pub fn combine_scores(fingerprint: f64, formulas: f64, keywords: f64, numbers: f64) -> f64 {
    FINGERPRINT_WEIGHT * fingerprint
        + FORMULA_WEIGHT * formulas
        + KEYWORD_WEIGHT * keywords
        + NUMBER_WEIGHT * numbers
}

/// Scores every component of two signatures and their weighted combination.
pub fn signature_similarity(a: &QuestionSignature, b: &QuestionSignature) -> SignatureScores {
    SignatureScores::new(
        fuzzy_text_similarity(&a.fingerprint, &b.fingerprint),
        set_overlap(&a.formulas, &b.formulas),
        set_overlap(&a.numbers, &b.numbers),
        set_overlap(&a.keywords, &b.keywords),
    )
}

/// Cosine similarity of two embeddings.
///
/// Returns `0.0` when either vector has zero norm or the dimensions differ.
/// The result may be negative; callers treat anything below their threshold
/// as no match.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}
