// src/application/error_handling.rs
//
// Error Handling for Commands
//
// ARCHITECTURE:
// - Maps internal errors → user-friendly responses
// - Provides consistent error format for the presentation layer
// - Never exposes internal implementation details
// - Logs errors for debugging

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Standard error response for the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_type: ErrorType,
    pub message: String,
    pub details: Option<String>,
}

/// Error categories for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Rejected image (wrong type or too large)
    Validation,

    /// Camera missing, busy or refused
    Device,

    /// Scoring or match service failed
    ExternalService,

    /// Operation not allowed in the current stage
    Precondition,

    /// A newer request replaced this one
    Superseded,

    /// File system error
    FileSystem,

    /// Other/unknown error
    Internal,
}

impl ErrorResponse {
    /// Create error response from AppError
    pub fn from_app_error(error: AppError) -> Self {
        match error {
            AppError::UnsupportedType(_) | AppError::TooLarge { .. } => Self {
                success: false,
                error_type: ErrorType::Validation,
                message: error.to_string(),
                details: None,
            },

            AppError::DeviceUnavailable(_) | AppError::PermissionDenied => Self {
                success: false,
                error_type: ErrorType::Device,
                message: error.to_string(),
                details: None,
            },

            AppError::ScoringUnavailable(ref reason) => Self {
                success: false,
                error_type: ErrorType::ExternalService,
                message: "Scoring failed, please try again".to_string(),
                details: Some(reason.clone()),
            },

            AppError::IncompleteScoreResponse(ref reason) => Self {
                success: false,
                error_type: ErrorType::ExternalService,
                message: "Scoring returned no usable result".to_string(),
                details: Some(reason.clone()),
            },

            AppError::MatchCreationFailed(ref reason) => Self {
                success: false,
                error_type: ErrorType::ExternalService,
                message: "Match failed, please try again".to_string(),
                details: Some(reason.clone()),
            },

            AppError::PreconditionFailed(ref reason) => Self {
                success: false,
                error_type: ErrorType::Precondition,
                message: reason.clone(),
                details: None,
            },

            AppError::Superseded => Self {
                success: false,
                error_type: ErrorType::Superseded,
                message: error.to_string(),
                details: None,
            },

            AppError::Domain(domain_error) => {
                log::error!("Domain error: {:?}", domain_error);

                Self {
                    success: false,
                    error_type: ErrorType::Internal,
                    message: "Workflow state is inconsistent".to_string(),
                    details: Some(domain_error.to_string()),
                }
            }

            AppError::Io(io_error) => {
                log::error!("IO error: {:?}", io_error);

                Self {
                    success: false,
                    error_type: ErrorType::FileSystem,
                    message: "File system operation failed".to_string(),
                    details: Some(io_error.to_string()),
                }
            }

            AppError::Codec(codec_error) => {
                log::error!("Image codec error: {:?}", codec_error);

                Self {
                    success: false,
                    error_type: ErrorType::Internal,
                    message: "Image could not be processed".to_string(),
                    details: Some(codec_error.to_string()),
                }
            }

            AppError::Serialization(serde_error) => {
                log::error!("Serialization error: {:?}", serde_error);

                Self {
                    success: false,
                    error_type: ErrorType::Internal,
                    message: "Data serialization failed".to_string(),
                    details: None,
                }
            }

            AppError::Other(msg) => {
                log::error!("Unexpected error: {}", msg);

                Self {
                    success: false,
                    error_type: ErrorType::Internal,
                    message: "An unexpected error occurred".to_string(),
                    details: Some(msg),
                }
            }
        }
    }

    /// Create a precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_type: ErrorType::Precondition,
            message: message.into(),
            details: None,
        }
    }
}

/// Helper trait to convert Results to ErrorResponse
pub trait ToErrorResponse<T> {
    fn to_error_response(self) -> Result<T, String>;
}

impl<T> ToErrorResponse<T> for Result<T, AppError> {
    fn to_error_response(self) -> Result<T, String> {
        self.map_err(|e| {
            let error_response = ErrorResponse::from_app_error(e);
            serde_json::to_string(&error_response)
                .unwrap_or_else(|_| "Internal error".to_string())
        })
    }
}
