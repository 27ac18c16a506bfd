// src/events/types.rs
//
// All workflow events in the system.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are immutable
// - Events carry only the data needed to react
// - No business logic in event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{ImageOrigin, MatchResult, OpponentId, ScoreId, Stage};
use crate::error::ErrorKind;

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

macro_rules! domain_event {
    ($name:ident) => {
        impl DomainEvent for $name {
            fn event_id(&self) -> Uuid {
                self.event_id
            }
            fn occurred_at(&self) -> DateTime<Utc> {
                self.occurred_at
            }
            fn event_type(&self) -> &'static str {
                stringify!($name)
            }
        }
    };
}

// ============================================================================
// ACQUISITION EVENTS
// ============================================================================

/// Emitted when a new image replaces whatever the workflow held
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAcquired {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub artifact_id: Uuid,
    pub origin: ImageOrigin,
    pub size: u64,

    /// True when score or outcome data was discarded
    pub cleared_derived: bool,
}

impl ImageAcquired {
    pub fn new(artifact_id: Uuid, origin: ImageOrigin, size: u64, cleared_derived: bool) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            artifact_id,
            origin,
            size,
            cleared_derived,
        }
    }
}

domain_event!(ImageAcquired);

// ============================================================================
// SCORING EVENTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringStarted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub artifact_id: Uuid,
}

impl ScoringStarted {
    pub fn new(artifact_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            artifact_id,
        }
    }
}

domain_event!(ScoringStarted);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringCompleted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub artifact_id: Uuid,
    pub score_id: ScoreId,
    pub face_score: f64,
}

impl ScoringCompleted {
    pub fn new(artifact_id: Uuid, score_id: ScoreId, face_score: f64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            artifact_id,
            score_id,
            face_score,
        }
    }
}

domain_event!(ScoringCompleted);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringFailed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub artifact_id: Uuid,
    pub kind: Option<ErrorKind>,
    pub message: String,
}

impl ScoringFailed {
    pub fn new(artifact_id: Uuid, kind: Option<ErrorKind>, message: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            artifact_id,
            kind,
            message,
        }
    }
}

domain_event!(ScoringFailed);

// ============================================================================
// MATCH EVENTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpponentSelected {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub opponent_id: OpponentId,

    /// True when a previous outcome against another opponent was dropped
    pub cleared_outcome: bool,
}

impl OpponentSelected {
    pub fn new(opponent_id: OpponentId, cleared_outcome: bool) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            opponent_id,
            cleared_outcome,
        }
    }
}

domain_event!(OpponentSelected);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchStarted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub score_id: ScoreId,
    pub opponent_id: OpponentId,
}

impl MatchStarted {
    pub fn new(score_id: ScoreId, opponent_id: OpponentId) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            score_id,
            opponent_id,
        }
    }
}

domain_event!(MatchStarted);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResolved {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub opponent_id: OpponentId,
    pub result: MatchResult,
    pub rating_delta: Option<i64>,
    pub new_rating: Option<i64>,
}

impl MatchResolved {
    pub fn new(
        opponent_id: OpponentId,
        result: MatchResult,
        rating_delta: Option<i64>,
        new_rating: Option<i64>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            opponent_id,
            result,
            rating_delta,
            new_rating,
        }
    }
}

domain_event!(MatchResolved);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchFailed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub opponent_id: OpponentId,
    pub message: String,
}

impl MatchFailed {
    pub fn new(opponent_id: OpponentId, message: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            opponent_id,
            message,
        }
    }
}

domain_event!(MatchFailed);

// ============================================================================
// WORKFLOW EVENTS
// ============================================================================

/// Emitted whenever the visible progress percentage moves
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub stage: Stage,
    pub percent: u8,
}

impl ProgressUpdated {
    pub fn new(stage: Stage, percent: u8) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            stage,
            percent,
        }
    }
}

domain_event!(ProgressUpdated);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowReset {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

impl WorkflowReset {
    pub fn new() -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
        }
    }
}

impl Default for WorkflowReset {
    fn default() -> Self {
        Self::new()
    }
}

domain_event!(WorkflowReset);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoring_failed_survives_json() {
        let event = ScoringFailed::new(
            Uuid::new_v4(),
            Some(ErrorKind::ScoringUnavailable),
            "timeout".to_string(),
        );

        let json = serde_json::to_string(&event).unwrap();
        let decoded: ScoringFailed = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.event_id, event.event_id);
        assert_eq!(decoded.kind, Some(ErrorKind::ScoringUnavailable));
        assert_eq!(decoded.event_type(), "ScoringFailed");
    }
}
