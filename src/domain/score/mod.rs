pub mod entity;
pub mod invariants;

pub use entity::{ScoreDetail, ScoreId, ScoreResult};
pub use invariants::{validate_face_score, validate_score_result};
