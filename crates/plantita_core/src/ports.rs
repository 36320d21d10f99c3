//! crates/plantita_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Diagnosis, NewDiagnosis, NewPlant, Plant};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Storage for plants and their diagnoses.
///
/// Every read is scoped to the owning user; a plant owned by someone else is `NotFound`.
#[async_trait]
pub trait PlantStore: Send + Sync {
    // --- Plants ---
    /// All plants owned by `user_id`, most recent first.
    async fn list_plants_for_user(&self, user_id: &str) -> PortResult<Vec<Plant>>;

    async fn get_plant(&self, plant_id: Uuid, user_id: &str) -> PortResult<Plant>;

    async fn create_plant(&self, plant: NewPlant) -> PortResult<Plant>;

    async fn rename_plant(&self, plant_id: Uuid, user_id: &str, name: &str) -> PortResult<Plant>;

    // --- Diagnoses ---
    async fn create_diagnosis(&self, diagnosis: NewDiagnosis) -> PortResult<Diagnosis>;

    /// Diagnoses of one plant, most recent first.
    async fn list_diagnoses_for_plant(
        &self,
        plant_id: Uuid,
        user_id: &str,
    ) -> PortResult<Vec<Diagnosis>>;

    /// Every diagnosis owned by `user_id`, most recent first.
    async fn list_diagnoses_for_user(&self, user_id: &str) -> PortResult<Vec<Diagnosis>>;
}

#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Asks the model about an image and returns its free-text answer.
    ///
    /// `image_url` is passed through untouched, typically a `data:` URI.
    async fn describe_image(
        &self,
        instructions: &str,
        user_text: &str,
        image_url: &str,
    ) -> PortResult<String>;
}
