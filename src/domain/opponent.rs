// src/domain/opponent.rs
//
// Opponent Entity
//
// A previously scored user picked from the ranking list.
// Read-only to the workflow except for server-side refinements
// that arrive with a resolved match.

use serde::{Deserialize, Serialize};

use crate::domain::score::ScoreId;
use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpponentId(pub i64);

impl std::fmt::Display for OpponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The chosen opponent of a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opponent {
    pub opponent_id: OpponentId,
    pub display_name: String,
    pub avatar_ref: Option<String>,

    /// Image the opponent was scored with
    pub image_url: Option<String>,

    pub score: f64,
    pub rank: u32,

    /// Score record the ranking list showed for this opponent
    pub score_id: ScoreId,
}

/// Attributes only known once the server has resolved a match.
///
/// Every field is optional: absent fields keep the previously known value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpponentRefinement {
    pub opponent_id: Option<OpponentId>,
    pub display_name: Option<String>,
    pub avatar_ref: Option<String>,
    pub image_url: Option<String>,
    pub score: Option<f64>,
}

impl Opponent {
    pub fn new(
        opponent_id: OpponentId,
        display_name: String,
        score: f64,
        rank: u32,
        score_id: ScoreId,
    ) -> Self {
        Self {
            opponent_id,
            display_name,
            avatar_ref: None,
            image_url: None,
            score,
            rank,
            score_id,
        }
    }

    /// Merge server refinements into a copy of this record.
    ///
    /// A refinement for a different opponent is ignored.
    pub fn refined(&self, refinement: &OpponentRefinement) -> Opponent {
        if let Some(id) = refinement.opponent_id {
            if id != self.opponent_id {
                log::warn!(
                    "Ignoring refinement for opponent {} while matching {}",
                    id,
                    self.opponent_id
                );
                return self.clone();
            }
        }

        let mut merged = self.clone();
        if let Some(name) = refinement
            .display_name
            .as_ref()
            .filter(|n| !n.trim().is_empty())
        {
            merged.display_name = name.clone();
        }
        if let Some(avatar) = &refinement.avatar_ref {
            merged.avatar_ref = Some(avatar.clone());
        }
        if let Some(image_url) = &refinement.image_url {
            merged.image_url = Some(image_url.clone());
        }
        if let Some(score) = refinement.score.filter(|s| s.is_finite()) {
            merged.score = score;
        }
        merged
    }
}

/// Validates Opponent invariants
pub fn validate_opponent(opponent: &Opponent) -> DomainResult<()> {
    if opponent.display_name.trim().is_empty() {
        return Err(DomainError::InvariantViolation(
            "Opponent display name cannot be empty".to_string(),
        ));
    }

    if !opponent.score.is_finite() {
        return Err(DomainError::InvariantViolation(format!(
            "Opponent {} has a non-finite score",
            opponent.opponent_id
        )));
    }

    Ok(())
}
