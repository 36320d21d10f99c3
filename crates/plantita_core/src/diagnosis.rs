//! crates/plantita_core/src/diagnosis.rs
//!
//! The diagnosis pipeline: inference, species extraction, grouping lookup and
//! best-effort persistence for a single request.

use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{DetectedSpecies, Diagnosis, GroupingCandidate, NewDiagnosis, NewPlant};
use crate::format::ResponseFormat;
use crate::matcher::find_candidates;
use crate::policy::{decide, PersistenceAction};
use crate::ports::{InferenceService, PlantStore, PortResult};

/// Confidence stored with every diagnosis. The model does not report one.
pub const PLACEHOLDER_CONFIDENCE: f32 = 0.8;

/// The errors that abort a diagnosis request.
#[derive(Debug, thiserror::Error)]
pub enum DiagnoseError {
    #[error("An image is required to diagnose a plant")]
    MissingInput,
    #[error("Inference failed: {0}")]
    InferenceFailure(String),
}

/// One diagnosis request as received from the caller.
#[derive(Debug, Clone, Default)]
pub struct DiagnosisRequest {
    /// The photo, usually as a `data:` URI.
    pub image: Option<String>,
    pub description: Option<String>,
    /// Opaque id from the identity provider; `None` for anonymous use.
    pub user_id: Option<String>,
    /// A plant the caller already chose to attach this diagnosis to.
    pub plant_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct DiagnosisOutcome {
    pub diagnosis_text: String,
    pub detected_species: DetectedSpecies,
    pub is_authenticated: bool,
    pub grouping_suggestions: Vec<GroupingCandidate>,
    pub action: PersistenceAction,
    /// The stored record, when persistence ran and succeeded.
    pub saved: Option<Diagnosis>,
}

/// Coordinates one diagnosis request. Holds no per-request state.
#[derive(Clone)]
pub struct DiagnosisService {
    inference: Arc<dyn InferenceService>,
    store: Arc<dyn PlantStore>,
    format: Arc<dyn ResponseFormat>,
}

impl DiagnosisService {
    pub fn new(
        inference: Arc<dyn InferenceService>,
        store: Arc<dyn PlantStore>,
        format: Arc<dyn ResponseFormat>,
    ) -> Self {
        Self {
            inference,
            store,
            format,
        }
    }

    pub async fn diagnose(&self, request: DiagnosisRequest) -> Result<DiagnosisOutcome, DiagnoseError> {
        let image = non_blank(request.image.as_deref()).ok_or(DiagnoseError::MissingInput)?;
        let description = non_blank(request.description.as_deref());
        let user_id = non_blank(request.user_id.as_deref());
        let target = request.plant_id;

        // --- 1. Inference (the only fatal step) ---
        let prompt = self.format.user_prompt(description);
        let diagnosis_text = self
            .inference
            .describe_image(self.format.instructions(), &prompt, image)
            .await
            .map_err(|e| {
                error!(error = %e, "Inference call failed");
                DiagnoseError::InferenceFailure(e.to_string())
            })?;

        // --- 2. Species extraction ---
        let detected_species = self.format.detected_species(&diagnosis_text);
        info!(species = %detected_species, authenticated = user_id.is_some(), "Diagnosis received");

        // --- 3. Grouping suggestions (read-only) ---
        let grouping_suggestions = match user_id {
            Some(user_id) if target.is_none() && detected_species.is_identified() => {
                self.grouping_candidates(user_id, &detected_species).await
            }
            _ => Vec::new(),
        };

        // --- 4. Persistence (best effort) ---
        let action = decide(user_id.is_some(), target.is_some(), grouping_suggestions.len());
        let saved = match (action, user_id) {
            (PersistenceAction::Skip, _) | (_, None) => None,
            (_, Some(user_id)) => {
                let record = RecordDraft {
                    user_id,
                    target,
                    image,
                    description,
                    detected_species: &detected_species,
                    diagnosis_text: &diagnosis_text,
                };
                match self.persist(record).await {
                    Ok(saved) => {
                        info!(plant_id = %saved.plant_id, diagnosis_id = %saved.id, "Diagnosis saved");
                        Some(saved)
                    }
                    Err(e) => {
                        error!(error = %e, user_id, ?target, "Failed to save diagnosis; returning it unsaved");
                        None
                    }
                }
            }
        };

        Ok(DiagnosisOutcome {
            diagnosis_text,
            detected_species,
            is_authenticated: user_id.is_some(),
            grouping_suggestions,
            action,
            saved,
        })
    }

    /// Existing plants of the same species. A failed lookup counts as no candidates.
    async fn grouping_candidates(
        &self,
        user_id: &str,
        detected: &DetectedSpecies,
    ) -> Vec<GroupingCandidate> {
        match self.store.list_plants_for_user(user_id).await {
            Ok(plants) => find_candidates(detected, &plants)
                .into_iter()
                .map(GroupingCandidate::from)
                .collect(),
            Err(e) => {
                warn!(error = %e, user_id, "Could not load plants for grouping suggestions");
                Vec::new()
            }
        }
    }

    async fn persist(&self, record: RecordDraft<'_>) -> PortResult<Diagnosis> {
        let plant_id = match record.target {
            // The target must belong to the requester, so the diagnosis stays with its plant's owner.
            Some(plant_id) => self.store.get_plant(plant_id, record.user_id).await?.id,
            None => {
                let plant = self
                    .store
                    .create_plant(NewPlant {
                        user_id: record.user_id.to_string(),
                        name: None,
                        species: record.detected_species.label().map(str::to_string),
                        description: record.description.map(str::to_string),
                        image_url: Some(record.image.to_string()),
                    })
                    .await?;
                info!(plant_id = %plant.id, "Created plant for new species");
                plant.id
            }
        };

        self.store
            .create_diagnosis(NewDiagnosis {
                plant_id,
                user_id: record.user_id.to_string(),
                diagnosis_text: record.diagnosis_text.to_string(),
                care_suggestions: self.format.care_suggestions(record.diagnosis_text),
                confidence_score: PLACEHOLDER_CONFIDENCE,
            })
            .await
    }
}

struct RecordDraft<'a> {
    user_id: &'a str,
    target: Option<Uuid>,
    image: &'a str,
    description: Option<&'a str>,
    detected_species: &'a DetectedSpecies,
    diagnosis_text: &'a str,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
