//! services/api/src/web/state.rs
//!
//! Defines the application state shared by every handler.

use crate::config::Config;
use plantita_core::{
    diagnosis::DiagnosisService,
    format::SectionedFormat,
    ports::{InferenceService, PlantStore},
};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn PlantStore>,
    pub diagnosis: DiagnosisService,
}

impl AppState {
    /// Wires the diagnosis pipeline to the given store and inference adapter.
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn PlantStore>,
        inference: Arc<dyn InferenceService>,
    ) -> Self {
        let diagnosis = DiagnosisService::new(inference, store.clone(), Arc::new(SectionedFormat));
        Self {
            config,
            store,
            diagnosis,
        }
    }
}
