// src/error/types.rs
use crate::domain::DomainError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every failure the workflow can surface.
///
/// The first eight variants are the user-facing taxonomy and map onto
/// [`ErrorKind`]. The remaining ones are plumbing.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Image is {size} bytes, the limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Scoring service unavailable: {0}")]
    ScoringUnavailable(String),

    #[error("Incomplete score response: {0}")]
    IncompleteScoreResponse(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Match creation failed: {0}")]
    MatchCreationFailed(String),

    /// A response arrived for a request that is no longer the latest one.
    #[error("Superseded by a newer request")]
    Superseded,

    #[error("Domain error: {0}")]
    Domain(DomainError),

    #[error("Image codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(String),
}

/// The user-facing error taxonomy, without payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    UnsupportedType,
    TooLarge,
    DeviceUnavailable,
    PermissionDenied,
    ScoringUnavailable,
    IncompleteScoreResponse,
    PreconditionFailed,
    MatchCreationFailed,
}

impl AppError {
    /// Taxonomy kind of this error, `None` for plumbing variants.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            AppError::UnsupportedType(_) => Some(ErrorKind::UnsupportedType),
            AppError::TooLarge { .. } => Some(ErrorKind::TooLarge),
            AppError::DeviceUnavailable(_) => Some(ErrorKind::DeviceUnavailable),
            AppError::PermissionDenied => Some(ErrorKind::PermissionDenied),
            AppError::ScoringUnavailable(_) => Some(ErrorKind::ScoringUnavailable),
            AppError::IncompleteScoreResponse(_) => Some(ErrorKind::IncompleteScoreResponse),
            AppError::PreconditionFailed(_) => Some(ErrorKind::PreconditionFailed),
            AppError::MatchCreationFailed(_) => Some(ErrorKind::MatchCreationFailed),
            _ => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, AppError::Superseded)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::UnsupportedType => "UnsupportedType",
            ErrorKind::TooLarge => "TooLarge",
            ErrorKind::DeviceUnavailable => "DeviceUnavailable",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::ScoringUnavailable => "ScoringUnavailable",
            ErrorKind::IncompleteScoreResponse => "IncompleteScoreResponse",
            ErrorKind::PreconditionFailed => "PreconditionFailed",
            ErrorKind::MatchCreationFailed => "MatchCreationFailed",
        };
        f.write_str(name)
    }
}

/// Workflow transition violations are caller mistakes, so they surface as
/// `PreconditionFailed`. Only broken invariants stay domain errors.
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::PreconditionFailed(msg) => AppError::PreconditionFailed(msg),
            DomainError::InvalidStateTransition(msg) => AppError::PreconditionFailed(msg),
            other => AppError::Domain(other),
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_kinds() {
        assert_eq!(
            AppError::TooLarge { size: 3, limit: 2 }.kind(),
            Some(ErrorKind::TooLarge)
        );
        assert_eq!(
            AppError::MatchCreationFailed("boom".into()).kind(),
            Some(ErrorKind::MatchCreationFailed)
        );
        assert_eq!(AppError::Superseded.kind(), None);
        assert_eq!(AppError::Other("x".into()).kind(), None);
    }

    #[test]
    fn test_transition_errors_become_precondition_failures() {
        let err: AppError = DomainError::InvalidStateTransition("Empty -> Scored".into()).into();
        assert_eq!(err.kind(), Some(ErrorKind::PreconditionFailed));

        let err: AppError = DomainError::InvariantViolation("bad".into()).into();
        assert!(matches!(err, AppError::Domain(_)));
    }

    #[test]
    fn test_serializes_as_message() {
        let json = serde_json::to_string(&AppError::PermissionDenied).unwrap();
        assert_eq!(json, "\"Camera permission denied\"");
    }

    #[test]
    fn test_error_kind_round_trips_by_name() {
        let json = serde_json::to_string(&ErrorKind::TooLarge).unwrap();
        assert_eq!(json, "\"TooLarge\"");

        let kind: ErrorKind = serde_json::from_str("\"MatchCreationFailed\"").unwrap();
        assert_eq!(kind, ErrorKind::MatchCreationFailed);
    }
}
