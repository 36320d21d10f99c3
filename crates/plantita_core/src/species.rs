//! crates/plantita_core/src/species.rs
//!
//! Canonical comparison keys for free-text species labels.

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Maps a species label to its comparison form: lowercased, with diacritics
/// removed and surrounding whitespace trimmed.
pub fn normalize_species(label: &str) -> String {
    let folded: String = label
        .nfd()
        .flat_map(char::to_lowercase)
        .filter(|c| !is_combining_mark(*c))
        .collect();
    folded.trim().to_string()
}

/// A normalized species label. Two labels name the same species iff their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpeciesKey(String);

impl SpeciesKey {
    pub fn from_label(label: &str) -> Self {
        Self(normalize_species(label))
    }
}
