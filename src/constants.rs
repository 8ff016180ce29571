//! Matching thresholds, score weights and pool sizing.
//!
//! The bare constants are the defaults. Anything that is tuned at runtime goes
//! through [`MatchThresholds`], which callers can override and must
//! [`validate`](MatchThresholds::validate) before use.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Combined signature score treated as an exact duplicate.
pub const EXACT_MATCH_THRESHOLD: f64 = 0.95;
/// Combined signature score served as a confident hit.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.85;
/// Combined signature score served as a low-confidence hit (logged separately).
pub const MEDIUM_CONFIDENCE_THRESHOLD: f64 = 0.75;
/// Cosine similarity required for a semantic-layer hit.
pub const SEMANTIC_MATCH_THRESHOLD: f64 = 0.82;

pub const FINGERPRINT_WEIGHT: f64 = 0.40;
pub const FORMULA_WEIGHT: f64 = 0.35;
pub const KEYWORD_WEIGHT: f64 = 0.15;
pub const NUMBER_WEIGHT: f64 = 0.10;

/// Number of most-recently-used entries scanned per lookup.
pub const DEFAULT_RECENT_POOL_SIZE: usize = 200;

/// Upper bound on how long a single embedding call may take.
pub const DEFAULT_EMBEDDING_TIMEOUT_MS: u64 = 10_000;

/// Entries in the embedding memoisation cache.
pub const DEFAULT_EMBEDDING_CACHE_CAPACITY: u64 = 1_024;

pub const DEFAULT_STALE_AFTER_DAYS: u32 = 90;
pub const DEFAULT_STALE_MIN_USAGE: i64 = 3;

pub const DEFAULT_TOP_QUESTIONS: usize = 5;

/// Runtime-overridable matching thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchThresholds {
    /// Signature score logged as an exact duplicate.
    pub exact: f64,
    /// Signature score for a confident hit.
    pub high_confidence: f64,
    /// Signature score for a low-confidence hit.
    pub medium_confidence: f64,
    /// Embedding cosine similarity for a semantic hit.
    pub semantic: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            exact: EXACT_MATCH_THRESHOLD,
            high_confidence: HIGH_CONFIDENCE_THRESHOLD,
            medium_confidence: MEDIUM_CONFIDENCE_THRESHOLD,
            semantic: SEMANTIC_MATCH_THRESHOLD,
        }
    }
}

impl MatchThresholds {
    /// Checks that every threshold is a probability and the signature bands are ordered.
    ///
    /// Returns an error if:
    /// - any value lies outside `[0, 1]` (or is NaN)
    /// - `medium_confidence > high_confidence` or `high_confidence > exact`
    pub fn validate(&self) -> Result<(), ThresholdError> {
        for (name, value) in [
            ("exact", self.exact),
            ("high_confidence", self.high_confidence),
            ("medium_confidence", self.medium_confidence),
            ("semantic", self.semantic),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ThresholdError::OutOfRange { name, value });
            }
        }

        if self.medium_confidence > self.high_confidence || self.high_confidence > self.exact {
            return Err(ThresholdError::Unordered {
                medium: self.medium_confidence,
                high: self.high_confidence,
                exact: self.exact,
            });
        }

        Ok(())
    }
}

/// Error returned by [`MatchThresholds::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("threshold '{name}' must be within [0, 1], got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("thresholds must satisfy medium ({medium}) <= high ({high}) <= exact ({exact})")]
    Unordered { medium: f64, high: f64, exact: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds_validate() {
        MatchThresholds::default()
            .validate()
            .expect("defaults should validate");
    }

    #[test]
    fn test_weights_sum_to_one() {
        let sum = FINGERPRINT_WEIGHT + FORMULA_WEIGHT + KEYWORD_WEIGHT + NUMBER_WEIGHT;
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let thresholds = MatchThresholds {
            semantic: 1.2,
            ..Default::default()
        };
        assert_eq!(
            thresholds.validate(),
            Err(ThresholdError::OutOfRange {
                name: "semantic",
                value: 1.2
            })
        );
    }

    #[test]
    fn test_nan_rejected() {
        let thresholds = MatchThresholds {
            exact: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            thresholds.validate(),
            Err(ThresholdError::OutOfRange { name: "exact", .. })
        ));
    }

    #[test]
    fn test_unordered_bands_rejected() {
        let thresholds = MatchThresholds {
            medium_confidence: 0.9,
            ..Default::default()
        };
        assert!(matches!(
            thresholds.validate(),
            Err(ThresholdError::Unordered { .. })
        ));
    }
}
