//! crates/plantita_core/src/policy.rs
//!
//! The single decision that says whether a diagnosis gets written, and where.

/// What the orchestrator does with a diagnosis after inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceAction {
    /// Nothing is written: the requester is anonymous, or grouping candidates
    /// exist and the caller has to pick one first.
    Skip,
    /// Create a plant for the detected species and attach the diagnosis to it.
    CreateNew,
    /// Attach the diagnosis to the plant the caller named.
    AttachExisting,
}

pub fn decide(has_user: bool, has_target: bool, candidate_count: usize) -> PersistenceAction {
    match (has_user, has_target, candidate_count) {
        (false, _, _) => PersistenceAction::Skip,
        (true, true, _) => PersistenceAction::AttachExisting,
        (true, false, 0) => PersistenceAction::CreateNew,
        (true, false, _) => PersistenceAction::Skip,
    }
}
