use serde::{Deserialize, Serialize};

use super::similarity::combine_scores;
use crate::constants::MatchThresholds;

/// Per-component similarity of two signatures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignatureScores {
    pub fingerprint: f64,
    pub formulas: f64,
    pub numbers: f64,
    pub keywords: f64,
    /// Weighted combination of the four components.
    pub combined: f64,
}

impl SignatureScores {
    /// Builds scores from components, computing `combined`.
    pub fn new(fingerprint: f64, formulas: f64, numbers: f64, keywords: f64) -> Self {
        Self {
            fingerprint,
            formulas,
            numbers,
            keywords,
            combined: combine_scores(fingerprint, formulas, keywords, numbers),
        }
    }

    /// Confidence band of the combined score, if it clears the medium threshold.
    #[inline]
    pub fn confidence(&self, thresholds: &MatchThresholds) -> Option<MatchConfidence> {
        MatchConfidence::classify(self.combined, thresholds)
    }
}

/// How sure a signature-layer match is.
///
/// `Exact` and `High` are served without comment; `Medium` is served but
/// logged separately so the policy can be audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchConfidence {
    Medium,
    High,
    Exact,
}

impl MatchConfidence {
    /// Maps a combined score to its band, or `None` below the medium threshold.
    pub fn classify(score: f64, thresholds: &MatchThresholds) -> Option<Self> {
        if score >= thresholds.exact {
            Some(Self::Exact)
        } else if score >= thresholds.high_confidence {
            Some(Self::High)
        } else if score >= thresholds.medium_confidence {
            Some(Self::Medium)
        } else {
            None
        }
    }

    /// Returns `true` for the exact and high bands.
    #[inline]
    pub fn is_confident(&self) -> bool {
        matches!(self, Self::High | Self::Exact)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::High => "high",
            Self::Medium => "medium",
        }
    }
}

impl std::fmt::Display for MatchConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
