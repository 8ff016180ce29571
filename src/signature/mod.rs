//! Question signatures.
//!
//! A signature is what two questions are compared on: a noise-reduced
//! [`fingerprint`] of the text plus three token sets pulled from the raw text
//! (chemical formulas, numeric quantities, topic keywords). Formulas and
//! numbers are precise but sparse; the fingerprint absorbs OCR and phrasing
//! noise; keywords only group by topic.

mod fingerprint;
mod tokens;


use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use fingerprint::fingerprint;
pub use tokens::{
    FORMULA_DENYLIST, KEYWORD_VOCABULARY, UNIT_WHITELIST, extract_formulas, extract_keywords,
    extract_numbers,
};

/// Comparable summary of one question. Computed per lookup, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestionSignature {
    pub fingerprint: String,
    pub formulas: BTreeSet<String>,
    pub numbers: BTreeSet<String>,
    pub keywords: BTreeSet<String>,
}

impl QuestionSignature {
    /// Returns `true` if no domain tokens were found (only the fingerprint can match).
    pub fn has_no_tokens(&self) -> bool {
        self.formulas.is_empty() && self.numbers.is_empty() && self.keywords.is_empty()
    }
}

/// Builds the full signature of `text`.
pub fn signature(text: &str) -> QuestionSignature {
    QuestionSignature {
        fingerprint: fingerprint(text),
        formulas: extract_formulas(text),
        numbers: extract_numbers(text),
        keywords: extract_keywords(text),
    }
}
