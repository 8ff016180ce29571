use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Short English words that have the shape of an element symbol.
pub const FORMULA_DENYLIST: &[&str] = &["A", "I", "In", "On", "As", "At", "An", "Is", "It", "To", "Be"];

/// Units recognised directly after a number (matched case-insensitively).
pub const UNIT_WHITELIST: &[&str] = &[
    "mol", "g", "kg", "L", "mL", "M", "atm", "Pa", "K", "°C", "J", "kJ", "eV",
];

/// Topic vocabulary, stored lowercase.
pub const KEYWORD_VOCABULARY: &[&str] = &[
    // reactions and particles
    "oxidation",
    "reduction",
    "electron",
    "atom",
    "molecule",
    "ion",
    "compound",
    "element",
    "reaction",
    "bond",
    "orbital",
    "configuration",
    "valence",
    "charge",
    "state",
    "number",
    "mass",
    "molar",
    "concentration",
    // acids, bases, kinetics
    "acid",
    "base",
    "salt",
    "ph",
    "buffer",
    "equilibrium",
    "catalyst",
    // periodic table
    "transition",
    "metal",
    "nonmetal",
    "periodic",
    "table",
    "group",
    "period",
    "alkali",
    "halogen",
    "noble",
    // phases and solutions
    "gas",
    "solid",
    "liquid",
    "solution",
    "solvent",
    "solute",
    "dissolve",
    "precipitate",
    // thermodynamics
    "exothermic",
    "endothermic",
    "energy",
    "enthalpy",
    "entropy",
];

static FORMULA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-z]?\d*(?:[A-Z][a-z]?\d*)*\b").expect("valid formula regex")
});

// Longest units first so "kJ" is not cut short at "K".
static NUMBER_WITH_UNIT: Lazy<Regex> = Lazy::new(|| {
    let mut units = UNIT_WHITELIST.to_vec();
    units.sort_by_key(|u| std::cmp::Reverse(u.chars().count()));
    let units = units
        .iter()
        .map(|u| regex::escape(u))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\d+\.?\d*\s*(?:{units})")).expect("valid unit regex")
});

static BARE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d+\.?\d*\b").expect("valid number regex"));

/// Collects formula-shaped tokens ("Fe2O3", "NaCl", "H2SO4"), uppercased.
///
/// Single letters and the [`FORMULA_DENYLIST`] words are skipped.
pub fn extract_formulas(text: &str) -> BTreeSet<String> {
    FORMULA
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|token| token.chars().count() > 1 && !FORMULA_DENYLIST.contains(token))
        .map(str::to_uppercase)
        .collect()
}

/// Collects quantities with units ("2.5 mol" is stored as "2.5mol") and bare
/// numeric literals into one set.
pub fn extract_numbers(text: &str) -> BTreeSet<String> {
    let with_unit = NUMBER_WITH_UNIT
        .find_iter(text)
        .map(|m| m.as_str().split_whitespace().collect::<String>());
    let bare = BARE_NUMBER.find_iter(text).map(|m| m.as_str().to_string());

    with_unit.chain(bare).collect()
}

/// Returns every vocabulary term contained in the lowercased text.
pub fn extract_keywords(text: &str) -> BTreeSet<String> {
    let lowered = text.to_lowercase();
    KEYWORD_VOCABULARY
        .iter()
        .filter(|term| lowered.contains(*term))
        .map(|term| term.to_string())
        .collect()
}
