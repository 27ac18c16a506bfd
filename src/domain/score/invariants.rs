use super::entity::ScoreResult;
use crate::domain::{DomainError, DomainResult};

pub const MIN_FACE_SCORE: f64 = 0.0;
pub const MAX_FACE_SCORE: f64 = 100.0;

/// Validates all ScoreResult invariants
pub fn validate_score_result(result: &ScoreResult) -> DomainResult<()> {
    validate_face_score(result.face_score)?;
    Ok(())
}

/// Face score must be a finite number within 0..=100
pub fn validate_face_score(face_score: f64) -> DomainResult<()> {
    if !face_score.is_finite() {
        return Err(DomainError::InvariantViolation(format!(
            "Face score must be finite, got {}",
            face_score
        )));
    }

    if !(MIN_FACE_SCORE..=MAX_FACE_SCORE).contains(&face_score) {
        return Err(DomainError::InvariantViolation(format!(
            "Face score {} is outside {}..={}",
            face_score, MIN_FACE_SCORE, MAX_FACE_SCORE
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::score::{ScoreId, ScoreResult};

    #[test]
    fn test_valid_score() {
        let result = ScoreResult::new(ScoreId(42), 91.5, "http://x/a.jpg".to_string());
        assert!(validate_score_result(&result).is_ok());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(validate_face_score(0.0).is_ok());
        assert!(validate_face_score(100.0).is_ok());
    }

    #[test]
    fn test_out_of_range_fails() {
        assert!(validate_face_score(100.5).is_err());
        assert!(validate_face_score(-1.0).is_err());
        assert!(validate_face_score(f64::NAN).is_err());
    }
}
