use once_cell::sync::Lazy;
use regex::Regex;

const FILLER_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "of", "in", "at", "to", "from", "with",
];

// "Fe 2" -> "Fe2". Needs original casing.
static SYMBOL_NUMBER_GAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z][a-z]?)[ \t]+(\d)").expect("valid symbol gap regex"));

// "question 5:", "q5:", "5)", "5." at the very start.
static LEADING_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:question|q)\s*\d+\s*[:).\-]?|\d+\s*[:).\-])(?:\s+|$)")
        .expect("valid leading marker regex")
});

static PAREN_CHOICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([a-d])\)").expect("valid paren choice regex"));
static BRACKET_CHOICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([a-d])\]").expect("valid bracket choice regex"));
static SUFFIX_CHOICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([a-d])[.\-](?:\s+|$)").expect("valid suffix choice regex"));

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s+\-=()\[\]]").expect("valid punctuation regex"));

/// Normalises question text so photo, OCR and formatting variants of the same
/// question collapse to one string.
///
/// Re-applying it to its own output is a no-op.
pub fn fingerprint(text: &str) -> String {
    // After the first pass the text is lowercase and every rewrite either
    // deletes characters or swaps `.`/`-` for `)`, so this terminates.
    let mut current = normalize_once(text);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_once(text: &str) -> String {
    let text = SYMBOL_NUMBER_GAP.replace_all(text, "${1}${2}");
    let mut text = text.to_lowercase();

    loop {
        let trimmed = text.trim_start();
        let stripped = LEADING_MARKER.replace(trimmed, "");
        if stripped.len() == trimmed.len() {
            break;
        }
        text = stripped.into_owned();
    }

    // Matches never overlap, so nested markers unwrap one level per replace.
    loop {
        let unwrapped = BRACKET_CHOICE
            .replace_all(&PAREN_CHOICE.replace_all(&text, "${1})"), "${1})")
            .into_owned();
        if unwrapped.len() == text.len() {
            break;
        }
        text = unwrapped;
    }
    let text = SUFFIX_CHOICE.replace_all(&text, "${1}) ");

    let text = text
        .split_whitespace()
        .filter(|token| !FILLER_WORDS.contains(token))
        .collect::<Vec<_>>()
        .join(" ");

    let text = PUNCTUATION.replace_all(&text, "");

    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
