use super::state::{Stage, WorkflowState};
use crate::domain::{DomainError, DomainResult};

/// Validates all WorkflowState invariants
pub fn validate_workflow_state(state: &WorkflowState) -> DomainResult<()> {
    validate_derivations(state)?;
    validate_stage_contents(state)?;
    Ok(())
}

/// Derived data never outlives its source:
/// 1. A score requires the image it was computed from
/// 2. An outcome requires both a score and an opponent
fn validate_derivations(state: &WorkflowState) -> DomainResult<()> {
    if state.score().is_some() && state.artifact().is_none() {
        return Err(DomainError::InvariantViolation(
            "Score present without an image".to_string(),
        ));
    }

    if state.outcome().is_some() && (state.score().is_none() || state.opponent().is_none()) {
        return Err(DomainError::InvariantViolation(
            "Match outcome present without a score and an opponent".to_string(),
        ));
    }

    if state.progress() > 100 {
        return Err(DomainError::InvariantViolation(format!(
            "Progress {} exceeds 100",
            state.progress()
        )));
    }

    Ok(())
}

/// Each stage carries exactly the data it promises
fn validate_stage_contents(state: &WorkflowState) -> DomainResult<()> {
    let ok = match state.stage() {
        Stage::Empty => state.artifact().is_none() && state.score().is_none(),
        Stage::ImageReady => {
            state.artifact().is_some() && state.score().is_none() && state.outcome().is_none()
        }
        Stage::Scored => state.score().is_some(),
        Stage::Matching => state.score().is_some() && state.opponent().is_some(),
        Stage::Resolved => state.outcome().is_some(),
    };

    if !ok {
        return Err(DomainError::InvariantViolation(format!(
            "Stage {} does not match the data held",
            state.stage()
        )));
    }

    if state.is_scoring() && state.stage() != Stage::ImageReady {
        return Err(DomainError::InvariantViolation(format!(
            "Scoring flagged as in flight during {}",
            state.stage()
        )));
    }

    Ok(())
}
