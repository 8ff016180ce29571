use std::collections::BTreeSet;

use super::*;
use crate::constants::MatchThresholds;
use crate::signature::signature;

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_sequence_ratio_known_values() {
    assert_close(sequence_ratio("abcd", "bcde"), 0.75);
    assert_close(sequence_ratio("abc", "abc"), 1.0);
    assert_close(sequence_ratio("", "abc"), 0.0);
    assert_close(sequence_ratio("", ""), 1.0);
    assert_close(sequence_ratio("nacl", "lcan"), 0.25);
    assert_close(sequence_ratio("qabxcd", "abycdf"), 2.0 / 3.0);
}

#[test]
fn test_fuzzy_similarity_tolerates_ocr_noise() {
    let score = fuzzy_text_similarity(
        "what oxidation state fe fe2o3",
        "wnat oxidafion state fe fe2o3",
    );
    assert_close(score, 54.0 / 58.0);
}

#[test]
fn test_fuzzy_similarity_is_symmetric_on_paraphrase() {
    let a = "what oxidation state fe fe2o3";
    let b = "find oxidation number fe compound fe2o3";
    assert_close(fuzzy_text_similarity(a, b), 0.6176470588235294);
}

#[test]
fn test_set_overlap_boundaries() {
    assert_eq!(set_overlap(&set(&[]), &set(&["X"])), 0.0);
    assert_eq!(set_overlap(&set(&["X"]), &set(&[])), 0.0);
    assert_eq!(set_overlap(&set(&[]), &set(&[])), 0.0);
    assert_eq!(set_overlap(&set(&["X"]), &set(&["X"])), 1.0);
}

#[test]
fn test_set_overlap_partial() {
    let a = set(&["ion", "oxidation", "state"]);
    let b = set(&["compound", "ion", "number", "oxidation"]);
    assert_close(set_overlap(&a, &b), 2.0 / 5.0);
}

#[test]
fn test_combined_weights() {
    assert_close(combine_scores(1.0, 0.0, 0.0, 0.0), 0.40);
    assert_close(combine_scores(0.0, 1.0, 0.0, 0.0), 0.35);
    assert_close(combine_scores(0.0, 0.0, 1.0, 0.0), 0.15);
    assert_close(combine_scores(0.0, 0.0, 0.0, 1.0), 0.10);
    assert_close(combine_scores(1.0, 1.0, 1.0, 1.0), 1.0);
}

#[test]
fn test_combined_score_is_monotonic_in_each_component() {
    let steps = [0.0, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0];
    for &base in &steps {
        for &bumped in steps.iter().filter(|&&s| s >= base) {
            let others = [0.3, 0.6, 0.9];
            for &o in &others {
                assert!(combine_scores(bumped, o, o, o) >= combine_scores(base, o, o, o));
                assert!(combine_scores(o, bumped, o, o) >= combine_scores(o, base, o, o));
                assert!(combine_scores(o, o, bumped, o) >= combine_scores(o, o, base, o));
                assert!(combine_scores(o, o, o, bumped) >= combine_scores(o, o, o, base));
            }
        }
    }
}

#[test]
fn test_signature_similarity_identical_question() {
    let a = signature("What is the oxidation state of Fe in Fe2O3? (a) +2 (b) +3");
    let b = signature("What is the oxidation state of Fe in Fe2O3? a. +2 b. +3");
    let scores = signature_similarity(&a, &b);
    assert_close(scores.combined, 1.0);
    assert_eq!(
        scores.confidence(&MatchThresholds::default()),
        Some(MatchConfidence::Exact)
    );
}

#[test]
fn test_signature_similarity_numbered_variant_is_high() {
    let a = signature("What is the oxidation state of Fe in Fe2O3?");
    let b = signature("Question 3: what is the oxidation state of Fe in Fe2O3");
    let scores = signature_similarity(&a, &b);

    // the question number leaks into the number set only
    assert_close(scores.fingerprint, 1.0);
    assert_close(scores.numbers, 0.0);
    assert_close(scores.combined, 0.90);
    assert_eq!(
        scores.confidence(&MatchThresholds::default()),
        Some(MatchConfidence::High)
    );
}

#[test]
fn test_signature_similarity_reworded_is_medium() {
    let a = signature("Calculate the molar mass of H2SO4");
    let b = signature("Determine the molar mass of H2SO4 in grams");
    let scores = signature_similarity(&a, &b);
    assert!(scores.combined >= 0.75 && scores.combined < 0.85, "{scores:?}");
    assert_eq!(
        scores.confidence(&MatchThresholds::default()),
        Some(MatchConfidence::Medium)
    );
}

#[test]
fn test_signature_similarity_distinct_questions() {
    let a = signature("What is the oxidation state of Fe in Fe2O3?");
    let c = signature("How soluble is NaCl in water at 25 °C?");
    let scores = signature_similarity(&a, &c);
    assert_eq!(scores.formulas, 0.0);
    assert_eq!(scores.keywords, 0.0);
    assert!(scores.combined < 0.75);
    assert_eq!(scores.confidence(&MatchThresholds::default()), None);
}

#[test]
fn test_confidence_respects_custom_thresholds() {
    let strict = MatchThresholds {
        exact: 0.99,
        high_confidence: 0.95,
        medium_confidence: 0.92,
        semantic: 0.9,
    };
    assert_eq!(MatchConfidence::classify(0.90, &strict), None);
    assert_eq!(
        MatchConfidence::classify(0.93, &strict),
        Some(MatchConfidence::Medium)
    );
    assert!(!MatchConfidence::Medium.is_confident());
    assert!(MatchConfidence::High.is_confident());
}

#[test]
fn test_cosine_similarity() {
    assert_close(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
    assert_close(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    assert_close(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), -1.0);
    assert_close(cosine_similarity(&[3.0, 4.0], &[6.0, 8.0]), 1.0);
}

#[test]
fn test_cosine_similarity_degenerate_inputs() {
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
    assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
}
