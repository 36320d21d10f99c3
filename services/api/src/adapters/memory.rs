//! services/api/src/adapters/memory.rs
//!
//! An in-process `PlantStore`, used when no database is configured and in tests.
//! Nothing survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use plantita_core::domain::{Diagnosis, NewDiagnosis, NewPlant, Plant};
use plantita_core::ports::{PlantStore, PortError, PortResult};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    plants: Vec<Plant>,
    diagnoses: Vec<Diagnosis>,
}

/// A `PlantStore` backed by two vectors behind a lock.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// Records are kept in insertion order; reversing before a stable sort keeps
// "most recent first" even when two timestamps tie.
fn newest_first<T>(
    rows: impl DoubleEndedIterator<Item = T>,
    created_at: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut rows: Vec<T> = rows.rev().collect();
    rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    rows
}

#[async_trait]
impl PlantStore for InMemoryStore {
    async fn list_plants_for_user(&self, user_id: &str) -> PortResult<Vec<Plant>> {
        let tables = self.tables.read().await;
        let owned = tables.plants.iter().filter(|p| p.user_id == user_id).cloned();
        Ok(newest_first(owned, |p| p.created_at))
    }

    async fn get_plant(&self, plant_id: Uuid, user_id: &str) -> PortResult<Plant> {
        let tables = self.tables.read().await;
        tables
            .plants
            .iter()
            .find(|p| p.id == plant_id && p.user_id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Plant {} not found", plant_id)))
    }

    async fn create_plant(&self, plant: NewPlant) -> PortResult<Plant> {
        let plant = Plant {
            id: Uuid::new_v4(),
            user_id: plant.user_id,
            name: plant.name,
            species: plant.species,
            description: plant.description,
            image_url: plant.image_url,
            created_at: Utc::now(),
        };
        self.tables.write().await.plants.push(plant.clone());
        Ok(plant)
    }

    async fn rename_plant(&self, plant_id: Uuid, user_id: &str, name: &str) -> PortResult<Plant> {
        let mut tables = self.tables.write().await;
        let plant = tables
            .plants
            .iter_mut()
            .find(|p| p.id == plant_id && p.user_id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("Plant {} not found", plant_id)))?;
        plant.name = Some(name.to_string());
        Ok(plant.clone())
    }

    async fn create_diagnosis(&self, diagnosis: NewDiagnosis) -> PortResult<Diagnosis> {
        let mut tables = self.tables.write().await;
        // Mirrors the foreign key on `diagnoses.plant_id`.
        if !tables.plants.iter().any(|p| p.id == diagnosis.plant_id) {
            return Err(PortError::Unexpected(format!(
                "Plant {} does not exist",
                diagnosis.plant_id
            )));
        }
        let diagnosis = Diagnosis {
            id: Uuid::new_v4(),
            plant_id: diagnosis.plant_id,
            user_id: diagnosis.user_id,
            diagnosis_text: diagnosis.diagnosis_text,
            care_suggestions: diagnosis.care_suggestions,
            confidence_score: diagnosis.confidence_score,
            created_at: Utc::now(),
        };
        tables.diagnoses.push(diagnosis.clone());
        Ok(diagnosis)
    }

    async fn list_diagnoses_for_plant(
        &self,
        plant_id: Uuid,
        user_id: &str,
    ) -> PortResult<Vec<Diagnosis>> {
        let tables = self.tables.read().await;
        let rows = tables
            .diagnoses
            .iter()
            .filter(|d| d.plant_id == plant_id && d.user_id == user_id)
            .cloned();
        Ok(newest_first(rows, |d| d.created_at))
    }

    async fn list_diagnoses_for_user(&self, user_id: &str) -> PortResult<Vec<Diagnosis>> {
        let tables = self.tables.read().await;
        let rows = tables.diagnoses.iter().filter(|d| d.user_id == user_id).cloned();
        Ok(newest_first(rows, |d| d.created_at))
    }
}
