//! crates/plantita_core/src/matcher.rs
//!
//! Finds a user's existing plants that share a detected species.

use crate::domain::{DetectedSpecies, Plant};
use crate::species::SpeciesKey;

/// Returns the plants whose normalized species equals `target`.
///
/// Plants without a species are never candidates.
pub fn plants_with_species<'a>(target: &SpeciesKey, plants: &'a [Plant]) -> Vec<&'a Plant> {
    plants
        .iter()
        .filter(|plant| {
            plant
                .species
                .as_deref()
                .is_some_and(|species| SpeciesKey::from_label(species) == *target)
        })
        .collect()
}

/// Matches against a detected species; the sentinel never matches anything.
pub fn find_candidates<'a>(detected: &DetectedSpecies, plants: &'a [Plant]) -> Vec<&'a Plant> {
    match detected.key() {
        Some(key) => plants_with_species(&key, plants),
        None => Vec::new(),
    }
}
