// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file declares all domain modules and re-exports their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod artifact;
pub mod opponent;
pub mod outcome;
pub mod score;
pub mod workflow;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Image Artifact
pub use artifact::{validate_artifact, ImageArtifact, ImageMime, ImageOrigin};

// Score
pub use score::{validate_face_score, validate_score_result, ScoreDetail, ScoreId, ScoreResult};

// Opponent
pub use opponent::{validate_opponent, Opponent, OpponentId, OpponentRefinement};

// Outcome
pub use outcome::{MatchOutcome, MatchResult};

// Workflow State
pub use workflow::{
    validate_workflow_state, ImageSummary, LastError, Stage, WorkflowSnapshot, WorkflowState,
};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of workflow rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
