//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `PlantStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use plantita_core::domain::{Diagnosis, NewDiagnosis, NewPlant, Plant};
use plantita_core::ports::{PlantStore, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const PLANT_COLUMNS: &str = "id, user_id, name, species, description, image_url, created_at";
const DIAGNOSIS_COLUMNS: &str =
    "id, plant_id, user_id, diagnosis_text, care_suggestions, confidence_score, created_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `PlantStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn port_error(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound("Row not found".to_string()),
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            PortError::Unavailable(e.to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct PlantRecord {
    id: Uuid,
    user_id: String,
    name: Option<String>,
    species: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}
impl PlantRecord {
    fn to_domain(self) -> Plant {
        Plant {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            species: self.species,
            description: self.description,
            image_url: self.image_url,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct DiagnosisRecord {
    id: Uuid,
    plant_id: Uuid,
    user_id: String,
    diagnosis_text: String,
    care_suggestions: Option<String>,
    confidence_score: f32,
    created_at: DateTime<Utc>,
}
impl DiagnosisRecord {
    fn to_domain(self) -> Diagnosis {
        Diagnosis {
            id: self.id,
            plant_id: self.plant_id,
            user_id: self.user_id,
            diagnosis_text: self.diagnosis_text,
            care_suggestions: self.care_suggestions,
            confidence_score: self.confidence_score,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `PlantStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl PlantStore for DbAdapter {
    async fn list_plants_for_user(&self, user_id: &str) -> PortResult<Vec<Plant>> {
        let records = sqlx::query_as::<_, PlantRecord>(&format!(
            "SELECT {PLANT_COLUMNS} FROM plants WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(port_error)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_plant(&self, plant_id: Uuid, user_id: &str) -> PortResult<Plant> {
        let record = sqlx::query_as::<_, PlantRecord>(&format!(
            "SELECT {PLANT_COLUMNS} FROM plants WHERE id = $1 AND user_id = $2"
        ))
        .bind(plant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(port_error)?
        .ok_or_else(|| PortError::NotFound(format!("Plant {} not found", plant_id)))?;

        Ok(record.to_domain())
    }

    async fn create_plant(&self, plant: NewPlant) -> PortResult<Plant> {
        let record = sqlx::query_as::<_, PlantRecord>(&format!(
            "INSERT INTO plants (id, user_id, name, species, description, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {PLANT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&plant.user_id)
        .bind(&plant.name)
        .bind(&plant.species)
        .bind(&plant.description)
        .bind(&plant.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(port_error)?;

        Ok(record.to_domain())
    }

    async fn rename_plant(&self, plant_id: Uuid, user_id: &str, name: &str) -> PortResult<Plant> {
        let record = sqlx::query_as::<_, PlantRecord>(&format!(
            "UPDATE plants SET name = $1 WHERE id = $2 AND user_id = $3 RETURNING {PLANT_COLUMNS}"
        ))
        .bind(name)
        .bind(plant_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(port_error)?
        .ok_or_else(|| PortError::NotFound(format!("Plant {} not found", plant_id)))?;

        Ok(record.to_domain())
    }

    async fn create_diagnosis(&self, diagnosis: NewDiagnosis) -> PortResult<Diagnosis> {
        let record = sqlx::query_as::<_, DiagnosisRecord>(&format!(
            "INSERT INTO diagnoses (id, plant_id, user_id, diagnosis_text, care_suggestions, confidence_score) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {DIAGNOSIS_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(diagnosis.plant_id)
        .bind(&diagnosis.user_id)
        .bind(&diagnosis.diagnosis_text)
        .bind(&diagnosis.care_suggestions)
        .bind(diagnosis.confidence_score)
        .fetch_one(&self.pool)
        .await
        .map_err(port_error)?;

        Ok(record.to_domain())
    }

    async fn list_diagnoses_for_plant(
        &self,
        plant_id: Uuid,
        user_id: &str,
    ) -> PortResult<Vec<Diagnosis>> {
        let records = sqlx::query_as::<_, DiagnosisRecord>(&format!(
            "SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses \
             WHERE plant_id = $1 AND user_id = $2 ORDER BY created_at DESC"
        ))
        .bind(plant_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(port_error)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn list_diagnoses_for_user(&self, user_id: &str) -> PortResult<Vec<Diagnosis>> {
        let records = sqlx::query_as::<_, DiagnosisRecord>(&format!(
            "SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(port_error)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
