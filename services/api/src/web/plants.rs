//! services/api/src/web/plants.rs
//!
//! Handlers for the requester's plant history: listing, detail and renaming.

use crate::web::{
    identity::requester_id,
    rest::{handler_error, ErrorBody, HandlerError},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
};
use chrono::{DateTime, Utc};
use plantita_core::{
    domain::{Diagnosis, Plant},
    ports::PortError,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Payload Structs
//=========================================================================================

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisView {
    pub id: Uuid,
    pub diagnosis_text: String,
    pub care_suggestions: Option<String>,
    pub confidence_score: f32,
    pub created_at: DateTime<Utc>,
}

impl From<Diagnosis> for DiagnosisView {
    fn from(d: Diagnosis) -> Self {
        Self {
            id: d.id,
            diagnosis_text: d.diagnosis_text,
            care_suggestions: d.care_suggestions,
            confidence_score: d.confidence_score,
            created_at: d.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PlantSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub species: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Plant> for PlantSummary {
    fn from(p: Plant) -> Self {
        Self {
            id: p.id,
            name: p.name,
            species: p.species,
            description: p.description,
            image_url: p.image_url,
            created_at: p.created_at,
        }
    }
}

/// A plant with its diagnoses, most recent first.
#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PlantWithDiagnoses {
    pub id: Uuid,
    pub name: Option<String>,
    pub species: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub diagnoses: Vec<DiagnosisView>,
}

impl PlantWithDiagnoses {
    fn new(plant: Plant, diagnoses: Vec<Diagnosis>) -> Self {
        Self {
            id: plant.id,
            name: plant.name,
            species: plant.species,
            description: plant.description,
            image_url: plant.image_url,
            created_at: plant.created_at,
            diagnoses: diagnoses.into_iter().map(DiagnosisView::from).collect(),
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct RenamePlantRequest {
    pub name: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn require_requester(headers: &HeaderMap) -> Result<String, HandlerError> {
    requester_id(headers).ok_or_else(|| {
        handler_error(
            StatusCode::BAD_REQUEST,
            "Necesitás iniciar sesión para ver tus plantas",
            Some("x-user-id header is required".to_string()),
        )
    })
}

fn store_error(e: PortError, context: &str) -> HandlerError {
    match e {
        PortError::NotFound(_) => handler_error(StatusCode::NOT_FOUND, "Planta no encontrada", None),
        other => {
            error!(error = %other, "{}", context);
            handler_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error al cargar tus plantas",
                Some(other.to_string()),
            )
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the requester's plants, newest first, each with its diagnoses.
#[utoipa::path(
    get,
    path = "/api/plants",
    responses(
        (status = 200, description = "The requester's plants", body = Vec<PlantWithDiagnoses>),
        (status = 400, description = "Missing requester identity", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    ),
    params(
        ("x-user-id" = String, Header, description = "Opaque user id from the identity provider.")
    )
)]
pub async fn list_plants_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<PlantWithDiagnoses>>, HandlerError> {
    let user_id = require_requester(&headers)?;
    let store = &app_state.store;

    let plants = store
        .list_plants_for_user(&user_id)
        .await
        .map_err(|e| store_error(e, "Failed to list plants"))?;
    let diagnoses = store
        .list_diagnoses_for_user(&user_id)
        .await
        .map_err(|e| store_error(e, "Failed to list diagnoses"))?;

    // Diagnoses arrive newest first; grouping keeps that order per plant.
    let mut by_plant: HashMap<Uuid, Vec<Diagnosis>> = HashMap::new();
    for diagnosis in diagnoses {
        by_plant.entry(diagnosis.plant_id).or_default().push(diagnosis);
    }

    let body = plants
        .into_iter()
        .map(|plant| {
            let diagnoses = by_plant.remove(&plant.id).unwrap_or_default();
            PlantWithDiagnoses::new(plant, diagnoses)
        })
        .collect();
    Ok(Json(body))
}

/// Get one of the requester's plants with its diagnoses, newest first.
#[utoipa::path(
    get,
    path = "/api/plants/{id}",
    responses(
        (status = 200, description = "The plant and its diagnoses", body = PlantWithDiagnoses),
        (status = 400, description = "Missing requester identity", body = ErrorBody),
        (status = 404, description = "No such plant for this requester", body = ErrorBody)
    ),
    params(
        ("id" = Uuid, Path, description = "Plant id."),
        ("x-user-id" = String, Header, description = "Opaque user id from the identity provider.")
    )
)]
pub async fn get_plant_handler(
    State(app_state): State<Arc<AppState>>,
    Path(plant_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<PlantWithDiagnoses>, HandlerError> {
    let user_id = require_requester(&headers)?;
    let store = &app_state.store;

    let plant = store
        .get_plant(plant_id, &user_id)
        .await
        .map_err(|e| store_error(e, "Failed to load plant"))?;
    let diagnoses = store
        .list_diagnoses_for_plant(plant_id, &user_id)
        .await
        .map_err(|e| store_error(e, "Failed to load diagnoses"))?;

    Ok(Json(PlantWithDiagnoses::new(plant, diagnoses)))
}

/// Rename one of the requester's plants.
#[utoipa::path(
    patch,
    path = "/api/plants/{id}",
    request_body = RenamePlantRequest,
    responses(
        (status = 200, description = "Plant renamed", body = PlantSummary),
        (status = 400, description = "Missing identity or blank name", body = ErrorBody),
        (status = 404, description = "No such plant for this requester", body = ErrorBody)
    ),
    params(
        ("id" = Uuid, Path, description = "Plant id."),
        ("x-user-id" = String, Header, description = "Opaque user id from the identity provider.")
    )
)]
pub async fn rename_plant_handler(
    State(app_state): State<Arc<AppState>>,
    Path(plant_id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<RenamePlantRequest>,
) -> Result<Json<PlantSummary>, HandlerError> {
    let user_id = require_requester(&headers)?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(handler_error(
            StatusCode::BAD_REQUEST,
            "El nombre no puede estar vacío",
            None,
        ));
    }

    let plant = app_state
        .store
        .rename_plant(plant_id, &user_id, name)
        .await
        .map_err(|e| store_error(e, "Failed to rename plant"))?;

    Ok(Json(PlantSummary::from(plant)))
}
