//! services/api/src/web/rest.rs
//!
//! Contains the Axum handler for the diagnosis endpoint, the shared error body,
//! and the master definition for the OpenAPI specification.

use crate::web::{plants, state::AppState};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use plantita_core::{
    diagnosis::{DiagnoseError, DiagnosisOutcome, DiagnosisRequest},
    domain::GroupingCandidate,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        diagnose_handler,
        plants::list_plants_handler,
        plants::get_plant_handler,
        plants::rename_plant_handler,
    ),
    components(
        schemas(
            DiagnoseRequest,
            DiagnoseResponse,
            GroupingSuggestion,
            ErrorBody,
            plants::PlantSummary,
            plants::PlantWithDiagnoses,
            plants::DiagnosisView,
            plants::RenamePlantRequest,
        )
    ),
    tags(
        (name = "Plantita API", description = "Plant health diagnosis from photos, with a per-user plant history.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The body of every error response.
#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A handler error: status code plus JSON body.
pub type HandlerError = (StatusCode, Json<ErrorBody>);

pub fn handler_error(status: StatusCode, message: &str, details: Option<String>) -> HandlerError {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
            details,
        }),
    )
}

/// The payload sent by the client to request a diagnosis.
#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct DiagnoseRequest {
    /// The photo as a `data:` URI.
    pub base64_image: Option<String>,
    /// What the user noticed about the plant.
    pub user_input: Option<String>,
    /// Opaque id from the identity provider; omitted for anonymous use.
    pub user_id: Option<String>,
    /// An existing plant to attach the diagnosis to.
    pub plant_id: Option<Uuid>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GroupingSuggestion {
    pub id: Uuid,
    pub name: Option<String>,
    pub species: Option<String>,
    pub image_url: Option<String>,
}

impl From<GroupingCandidate> for GroupingSuggestion {
    fn from(candidate: GroupingCandidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name,
            species: candidate.species,
            image_url: candidate.image_url,
        }
    }
}

/// The response payload of a successful diagnosis.
#[derive(Serialize, Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DiagnoseResponse {
    /// The model's markdown answer.
    pub diagnosis: String,
    /// The species read from the answer, or "No identificada".
    pub detected_species: String,
    pub is_authenticated: bool,
    /// Existing plants of the same species. Resubmit with `plantId` to attach to one.
    pub grouping_suggestions: Vec<GroupingSuggestion>,
}

impl From<DiagnosisOutcome> for DiagnoseResponse {
    fn from(outcome: DiagnosisOutcome) -> Self {
        Self {
            detected_species: outcome.detected_species.to_string(),
            diagnosis: outcome.diagnosis_text,
            is_authenticated: outcome.is_authenticated,
            grouping_suggestions: outcome
                .grouping_suggestions
                .into_iter()
                .map(GroupingSuggestion::from)
                .collect(),
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Diagnose a plant from a photo.
///
/// Signed-in requests are saved to the user's plant history unless existing
/// plants of the same species are found and no `plantId` was given; in that
/// case the matches come back in `groupingSuggestions` and nothing is saved.
#[utoipa::path(
    post,
    path = "/api/diagnose",
    request_body = DiagnoseRequest,
    responses(
        (status = 200, description = "Diagnosis produced", body = DiagnoseResponse),
        (status = 400, description = "The image is missing", body = ErrorBody),
        (status = 500, description = "The vision model failed", body = ErrorBody)
    )
)]
pub async fn diagnose_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<DiagnoseRequest>,
) -> Result<Json<DiagnoseResponse>, HandlerError> {
    let request = DiagnosisRequest {
        image: payload.base64_image,
        description: payload.user_input,
        user_id: payload.user_id,
        plant_id: payload.plant_id,
    };

    match app_state.diagnosis.diagnose(request).await {
        Ok(outcome) => {
            info!(
                species = %outcome.detected_species,
                action = ?outcome.action,
                suggestions = outcome.grouping_suggestions.len(),
                "Diagnosis completed"
            );
            Ok(Json(DiagnoseResponse::from(outcome)))
        }
        Err(DiagnoseError::MissingInput) => Err(handler_error(
            StatusCode::BAD_REQUEST,
            "Falta la imagen",
            None,
        )),
        // Already logged by the diagnosis service.
        Err(DiagnoseError::InferenceFailure(detail)) => Err(handler_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error al procesar la imagen con IA",
            Some(detail),
        )),
    }
}
