// src/application/dto/mod.rs
//
// Data Transfer Objects
//
// CRITICAL PRINCIPLES:
// - DTOs are presentation-friendly representations
// - DTOs NEVER leak domain invariants
// - DTOs are simple, serializable structs
// - Conversion FROM domain entities only, except ChooseOpponentDto

use serde::{Deserialize, Serialize};

use crate::domain::{
    ImageSummary, LastError, MatchOutcome, Opponent, OpponentId, ScoreId, ScoreResult,
    WorkflowSnapshot,
};

// ============================================================================
// IMAGE DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageDto {
    pub id: String,
    pub file_name: String,
    pub mime: String,
    pub origin: String,
    pub size: u64,
    pub preview_uri: String,
}

// ============================================================================
// SCORE DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreDetailDto {
    pub category: String,
    pub score: f64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreDto {
    pub score_id: i64,
    pub face_score: f64,
    pub image_url: String,
    pub feature_highlights: serde_json::Value,
    pub score_details: Vec<ScoreDetailDto>,
    pub is_public: Option<bool>,
    pub received_at: String,
}

// ============================================================================
// OPPONENT / MATCH DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpponentDto {
    pub opponent_id: i64,
    pub display_name: String,
    pub avatar_ref: Option<String>,
    pub image_url: Option<String>,
    pub score: f64,
    pub rank: u32,
    pub score_id: i64,
}

/// Ranking list entry the user picked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChooseOpponentDto {
    pub opponent_id: i64,
    pub display_name: String,
    pub score: f64,
    pub rank: u32,
    pub score_id: i64,
    pub avatar_ref: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcomeDto {
    pub match_id: Option<i64>,
    pub result: String,
    pub rating_delta: Option<i64>,
    pub new_rating: Option<i64>,
    pub opponent: OpponentDto,
    pub resolved_at: String,
}

// ============================================================================
// WORKFLOW DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDto {
    pub kind: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSnapshotDto {
    pub stage: String,
    pub scoring_in_flight: bool,
    pub progress: u8,
    pub image: Option<ImageDto>,
    pub score: Option<ScoreDto>,
    pub opponent: Option<OpponentDto>,
    pub outcome: Option<MatchOutcomeDto>,
    pub last_error: Option<ErrorDto>,
}

// ============================================================================
// CONVERSION IMPLEMENTATIONS (Domain → DTO)
// ============================================================================

impl From<ImageSummary> for ImageDto {
    fn from(image: ImageSummary) -> Self {
        Self {
            id: image.id.to_string(),
            file_name: image.file_name,
            mime: image.mime.as_str().to_string(),
            origin: match image.origin {
                crate::domain::ImageOrigin::FileSelection => "file_selection".to_string(),
                crate::domain::ImageOrigin::CameraCapture => "camera_capture".to_string(),
            },
            size: image.size,
            preview_uri: image.preview_uri,
        }
    }
}

impl From<ScoreResult> for ScoreDto {
    fn from(score: ScoreResult) -> Self {
        Self {
            score_id: score.score_id.0,
            face_score: score.face_score,
            image_url: score.image_url,
            feature_highlights: serde_json::Value::Object(
                score.feature_highlights.into_iter().collect(),
            ),
            score_details: score
                .score_details
                .into_iter()
                .map(|d| ScoreDetailDto {
                    category: d.category,
                    score: d.score,
                    description: d.description,
                })
                .collect(),
            is_public: score.is_public,
            received_at: score.received_at.to_rfc3339(),
        }
    }
}

impl From<Opponent> for OpponentDto {
    fn from(opponent: Opponent) -> Self {
        Self {
            opponent_id: opponent.opponent_id.0,
            display_name: opponent.display_name,
            avatar_ref: opponent.avatar_ref,
            image_url: opponent.image_url,
            score: opponent.score,
            rank: opponent.rank,
            score_id: opponent.score_id.0,
        }
    }
}

impl From<ChooseOpponentDto> for Opponent {
    fn from(dto: ChooseOpponentDto) -> Self {
        let mut opponent = Opponent::new(
            OpponentId(dto.opponent_id),
            dto.display_name,
            dto.score,
            dto.rank,
            ScoreId(dto.score_id),
        );
        opponent.avatar_ref = dto.avatar_ref;
        opponent.image_url = dto.image_url;
        opponent
    }
}

impl From<MatchOutcome> for MatchOutcomeDto {
    fn from(outcome: MatchOutcome) -> Self {
        Self {
            match_id: outcome.match_id,
            result: outcome.result.to_string(),
            rating_delta: outcome.rating_delta,
            new_rating: outcome.new_rating,
            opponent: OpponentDto::from(outcome.updated_opponent),
            resolved_at: outcome.resolved_at.to_rfc3339(),
        }
    }
}

impl From<LastError> for ErrorDto {
    fn from(error: LastError) -> Self {
        Self {
            kind: error.kind.map(|k| k.to_string()),
            message: error.message,
        }
    }
}

impl From<WorkflowSnapshot> for WorkflowSnapshotDto {
    fn from(snapshot: WorkflowSnapshot) -> Self {
        Self {
            stage: snapshot.stage.to_string(),
            scoring_in_flight: snapshot.scoring_in_flight,
            progress: snapshot.progress,
            image: snapshot.image.map(ImageDto::from),
            score: snapshot.score.map(ScoreDto::from),
            opponent: snapshot.opponent.map(OpponentDto::from),
            outcome: snapshot.outcome.map(MatchOutcomeDto::from),
            last_error: snapshot.last_error.map(ErrorDto::from),
        }
    }
}
