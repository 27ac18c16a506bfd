use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-side identifier of a score record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreId(pub i64);

impl std::fmt::Display for ScoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One scored category (e.g. symmetry) with its explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDetail {
    pub category: String,
    pub score: f64,
    pub description: String,
}

/// Normalized result of one successful scoring run.
///
/// Immutable: a new upload produces a new ScoreResult, it never edits this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score_id: ScoreId,

    /// Overall face score, 0 to 100
    pub face_score: f64,

    /// Named attributes reported by the scoring model
    pub feature_highlights: BTreeMap<String, serde_json::Value>,

    /// Absolute URL of the stored image
    pub image_url: String,

    pub score_details: Vec<ScoreDetail>,

    pub is_public: Option<bool>,

    /// When the client received the result
    pub received_at: DateTime<Utc>,
}

impl ScoreResult {
    pub fn new(score_id: ScoreId, face_score: f64, image_url: String) -> Self {
        Self {
            score_id,
            face_score,
            feature_highlights: BTreeMap::new(),
            image_url,
            score_details: Vec::new(),
            is_public: None,
            received_at: Utc::now(),
        }
    }
}
