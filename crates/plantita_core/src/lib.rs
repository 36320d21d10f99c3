pub mod diagnosis;
pub mod domain;
pub mod format;
pub mod matcher;
pub mod policy;
pub mod ports;
pub mod species;

pub use diagnosis::{
    DiagnoseError, DiagnosisOutcome, DiagnosisRequest, DiagnosisService, PLACEHOLDER_CONFIDENCE,
};
pub use domain::{
    DetectedSpecies, Diagnosis, GroupingCandidate, NewDiagnosis, NewPlant, Plant, NOT_IDENTIFIED,
};
pub use format::{ResponseFormat, SectionedFormat};
pub use policy::PersistenceAction;
pub use ports::{InferenceService, PlantStore, PortError, PortResult};
pub use species::{normalize_species, SpeciesKey};
