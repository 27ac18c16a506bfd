// src/domain/outcome.rs
//
// Match Outcome
//
// The resolved result of one match attempt. Created once, never edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::opponent::Opponent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    Win,
    Lose,
    Tie,
}

impl MatchResult {
    /// Parse the server's result string.
    ///
    /// Only the three known values are accepted (case-insensitive).
    /// Anything else returns `None` instead of defaulting to a tie.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "win" => Some(MatchResult::Win),
            "lose" => Some(MatchResult::Lose),
            "tie" => Some(MatchResult::Tie),
            _ => None,
        }
    }
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchResult::Win => write!(f, "Win"),
            MatchResult::Lose => write!(f, "Lose"),
            MatchResult::Tie => write!(f, "Tie"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub match_id: Option<i64>,
    pub result: MatchResult,

    /// Rating points gained or lost by the challenger
    pub rating_delta: Option<i64>,

    /// Challenger rating after the match
    pub new_rating: Option<i64>,

    /// Opponent record with server refinements merged in
    pub updated_opponent: Opponent,

    pub resolved_at: DateTime<Utc>,
}

impl MatchOutcome {
    pub fn new(result: MatchResult, updated_opponent: Opponent) -> Self {
        Self {
            match_id: None,
            result,
            rating_delta: None,
            new_rating: None,
            updated_opponent,
            resolved_at: Utc::now(),
        }
    }
}
