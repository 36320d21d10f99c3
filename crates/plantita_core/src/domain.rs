//! crates/plantita_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

use crate::species::SpeciesKey;

/// The literal phrase used when no species could be read from a diagnosis.
pub const NOT_IDENTIFIED: &str = "No identificada";

/// A tracked plant owned by exactly one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Plant {
    pub id: Uuid,
    pub user_id: String,
    pub name: Option<String>,
    /// Free-text species label. `None` means the species was never identified.
    pub species: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The fields needed to create a new `Plant`; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlant {
    pub user_id: String,
    pub name: Option<String>,
    pub species: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// One immutable inference result attached to a plant.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnosis {
    pub id: Uuid,
    pub plant_id: Uuid,
    pub user_id: String,
    pub diagnosis_text: String,
    pub care_suggestions: Option<String>,
    pub confidence_score: f32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDiagnosis {
    pub plant_id: Uuid,
    pub user_id: String,
    pub diagnosis_text: String,
    pub care_suggestions: Option<String>,
    pub confidence_score: f32,
}

/// The species read out of a diagnosis text, or the "not identified" sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectedSpecies {
    Identified(String),
    NotIdentified,
}

impl DetectedSpecies {
    /// Builds a `DetectedSpecies` from a raw label, folding blanks and the
    /// literal not-identified phrase into the sentinel.
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        let bare = trimmed.trim_end_matches('.').trim();
        if bare.is_empty() || bare.eq_ignore_ascii_case(NOT_IDENTIFIED) {
            DetectedSpecies::NotIdentified
        } else {
            DetectedSpecies::Identified(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DetectedSpecies::Identified(label) => label,
            DetectedSpecies::NotIdentified => NOT_IDENTIFIED,
        }
    }

    /// The label to store on a plant. The sentinel is never stored.
    pub fn label(&self) -> Option<&str> {
        match self {
            DetectedSpecies::Identified(label) => Some(label),
            DetectedSpecies::NotIdentified => None,
        }
    }

    /// The comparison key, absent for the sentinel.
    pub fn key(&self) -> Option<SpeciesKey> {
        self.label().map(SpeciesKey::from_label)
    }

    pub fn is_identified(&self) -> bool {
        matches!(self, DetectedSpecies::Identified(_))
    }
}

impl fmt::Display for DetectedSpecies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An existing plant offered back to the caller as a possible match.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupingCandidate {
    pub id: Uuid,
    pub name: Option<String>,
    pub species: Option<String>,
    pub image_url: Option<String>,
}

impl From<&Plant> for GroupingCandidate {
    fn from(plant: &Plant) -> Self {
        Self {
            id: plant.id,
            name: plant.name.clone(),
            species: plant.species.clone(),
            image_url: plant.image_url.clone(),
        }
    }
}
