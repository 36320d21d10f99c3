//! crates/plantita_core/src/format.rs
//!
//! The textual contract between the orchestrator and the inference model.
//!
//! A `ResponseFormat` owns both sides of that contract: the instructions that
//! ask the model for a given layout, and the parsing that reads fields back out
//! of the free text it returns. Swapping the layout (or moving to structured
//! output) only means providing another implementation.

use regex::Regex;
use std::sync::LazyLock;

use crate::domain::DetectedSpecies;

const SYSTEM_INSTRUCTIONS: &str = r#"Sos un bot experto en botánica. Vas a diagnosticar enfermedades o problemas en plantas a partir de imágenes y contexto textual.

Respondé SIEMPRE en markdown y con esta estructura exacta de tres secciones:

**Especie detectada:** <nombre de la especie, o "No identificada" si no podés determinarla>

**Diagnóstico:**
<qué problema de salud ves en la planta, sus causas probables y su gravedad>

**Sugerencias de cuidado:**
<pasos concretos de cuidado y tratamiento>

No agregues otras secciones ni texto antes de la primera sección."#;

// Captures the rest of the marker line and, separately, the line after it.
static SPECIES_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\*\*[^\S\n]*especie detectada[^\S\n]*:?[^\S\n]*\*\*[^\S\n]*:?([^\n]*)(?:\n([^\n]*))?",
    )
    .expect("species marker pattern is valid")
});

static CARE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*\*\s*sugerencias de cuidado\s*:?\s*\*\*\s*:?")
        .expect("care marker pattern is valid")
});

// A bold label at the start of a line, e.g. "**Notas:**".
static SECTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*\*\*[^*\n]+:\s*\*\*|^\s*\*\*[^*\n]+\*\*\s*:")
        .expect("section header pattern is valid")
});

// Markdown bold/italic around the value, e.g. "**Ficus lyrata**".
fn strip_emphasis(value: &str) -> &str {
    value.trim_matches('*').trim()
}

/// Describes how diagnoses are requested from and read back out of the model.
pub trait ResponseFormat: Send + Sync {
    /// The system persona and layout instructions sent with every request.
    fn instructions(&self) -> &str;

    /// The user turn built from the optional description.
    fn user_prompt(&self, description: Option<&str>) -> String;

    /// Reads the detected species. Never fails: a missing marker yields the sentinel.
    fn detected_species(&self, text: &str) -> DetectedSpecies;

    /// Reads the care-suggestion section, if the model wrote one.
    fn care_suggestions(&self, text: &str) -> Option<String>;
}

/// The three-section bold-label layout: species, diagnosis, care suggestions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionedFormat;

impl ResponseFormat for SectionedFormat {
    fn instructions(&self) -> &str {
        SYSTEM_INSTRUCTIONS
    }

    fn user_prompt(&self, description: Option<&str>) -> String {
        format!(
            "Descripción del usuario: \"{}\"",
            description.unwrap_or("sin descripción")
        )
    }

    fn detected_species(&self, text: &str) -> DetectedSpecies {
        let Some(captures) = SPECIES_MARKER.captures(text) else {
            return DetectedSpecies::NotIdentified;
        };
        let same_line = captures.get(1).map_or("", |m| m.as_str()).trim();
        if !same_line.is_empty() {
            return DetectedSpecies::from_label(strip_emphasis(same_line));
        }
        // Only the very next line may carry the value; a blank line or another
        // section header means the model left the label empty.
        let next_line = captures.get(2).map_or("", |m| m.as_str()).trim();
        if SECTION_HEADER.is_match(next_line) {
            return DetectedSpecies::NotIdentified;
        }
        DetectedSpecies::from_label(strip_emphasis(next_line))
    }

    fn care_suggestions(&self, text: &str) -> Option<String> {
        let marker = CARE_MARKER.find(text)?;
        let rest = &text[marker.end()..];
        let section = match SECTION_HEADER.find(rest) {
            Some(next) => &rest[..next.start()],
            None => rest,
        };
        let section = section.trim();
        (!section.is_empty()).then(|| section.to_string())
    }
}
