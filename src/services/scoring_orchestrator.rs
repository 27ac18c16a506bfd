// src/services/scoring_orchestrator.rs
//
// Scoring Orchestrator - Image → Score Result
//
// CRITICAL RULES:
// - Single-flight: only the latest submission may produce a result
// - Progress climbs with the upload and is forced to 100 on response
// - Nothing partial is returned: either a full ScoreResult or an error
// - No automatic retry

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::domain::{
    validate_score_result, ImageArtifact, ImageMime, ScoreDetail, ScoreId, ScoreResult,
};
use crate::error::{AppError, AppResult};
use crate::services::request_sequence::{RequestSequence, RequestToken};

// ============================================================================
// SERVICE CONTRACT
// ============================================================================

/// Multipart payload for one scoring request
#[derive(Debug, Clone)]
pub struct ScoreUpload {
    pub file_name: String,
    pub mime: ImageMime,
    pub bytes: Arc<[u8]>,
    pub is_public: bool,
}

impl ScoreUpload {
    pub fn from_artifact(artifact: &ImageArtifact, is_public: bool) -> Self {
        Self {
            file_name: artifact.file_name.clone(),
            mime: artifact.mime,
            bytes: artifact.payload(),
            is_public,
        }
    }
}

/// Scoring response exactly as the service sends it
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScoreResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub score_id: Option<i64>,
    #[serde(default)]
    pub face_score: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub feature_highlights: Option<serde_json::Value>,
    #[serde(default)]
    pub score_details: Option<Vec<ScoreDetail>>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Sink for percentage updates (0..=100)
#[derive(Clone)]
pub struct ProgressReporter {
    sink: Arc<dyn Fn(u8) + Send + Sync>,
}

impl ProgressReporter {
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// Reporter that drops every update
    pub fn silent() -> Self {
        Self::new(|_| {})
    }

    pub fn report(&self, percent: u8) {
        (self.sink)(percent.min(100));
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProgressReporter")
    }
}

/// Remote scoring computation.
///
/// Transport failures and non-success HTTP statuses are reported as
/// `ScoringUnavailable`. The transport reports upload progress.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScoringService: Send + Sync {
    async fn submit_score(
        &self,
        upload: ScoreUpload,
        progress: ProgressReporter,
    ) -> AppResult<ScoreResponse>;
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

pub struct ScoringOrchestrator {
    service: Arc<dyn ScoringService>,
    config: ClientConfig,
    sequence: RequestSequence,
}

impl ScoringOrchestrator {
    pub fn new(service: Arc<dyn ScoringService>, config: ClientConfig) -> Self {
        Self {
            service,
            config,
            sequence: RequestSequence::new(),
        }
    }

    pub fn sequence(&self) -> &RequestSequence {
        &self.sequence
    }

    /// Take a token, superseding any submission still in flight
    pub fn start(&self) -> RequestToken {
        self.sequence.next()
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.sequence.is_current(token)
    }

    /// Discard whatever is in flight
    pub fn invalidate(&self) {
        self.sequence.invalidate();
    }

    /// Submit with a fresh token
    pub async fn submit(
        &self,
        upload: ScoreUpload,
        progress: ProgressReporter,
    ) -> AppResult<ScoreResult> {
        let token = self.start();
        self.run(token, upload, progress).await
    }

    /// Drive one submission for a token obtained from `start()`.
    ///
    /// Returns `Superseded` when a newer submission started meanwhile.
    pub async fn run(
        &self,
        token: RequestToken,
        upload: ScoreUpload,
        progress: ProgressReporter,
    ) -> AppResult<ScoreResult> {
        log::info!(
            "Scoring {} ({} bytes) as request {}",
            upload.file_name,
            upload.bytes.len(),
            token
        );

        progress.report(0);
        let sequence = self.sequence.clone();
        let upload_progress = {
            let progress = progress.clone();
            ProgressReporter::new(move |percent| {
                if sequence.is_current(token) {
                    progress.report(percent);
                }
            })
        };

        let response = self.service.submit_score(upload, upload_progress).await;

        if !self.sequence.is_current(token) {
            log::warn!("Discarding scoring response for superseded request {}", token);
            return Err(AppError::Superseded);
        }

        let response = response.map_err(|e| match e {
            AppError::ScoringUnavailable(_) | AppError::IncompleteScoreResponse(_) => e,
            other => AppError::ScoringUnavailable(other.to_string()),
        })?;
        // The upload is done once any response arrives, usable or not
        progress.report(100);

        let result = self.normalize(response)?;

        log::info!(
            "Request {} scored {} (score id {})",
            token,
            result.face_score,
            result.score_id
        );
        Ok(result)
    }

    /// Turn a raw response into a usable ScoreResult
    pub fn normalize(&self, response: ScoreResponse) -> AppResult<ScoreResult> {
        if !response.success {
            return Err(AppError::IncompleteScoreResponse(
                response
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| "Scoring service reported a failure".to_string()),
            ));
        }

        let face_score = response.face_score.ok_or_else(|| {
            AppError::IncompleteScoreResponse("Response has no face score".to_string())
        })?;
        let score_id = response.score_id.map(ScoreId).ok_or_else(|| {
            AppError::IncompleteScoreResponse("Response has no score id".to_string())
        })?;

        let feature_highlights = match response.feature_highlights {
            Some(serde_json::Value::Object(map)) => map.into_iter().collect(),
            Some(serde_json::Value::Null) | None => BTreeMap::new(),
            Some(other) => {
                log::debug!("Ignoring non-object feature highlights: {}", other);
                BTreeMap::new()
            }
        };

        let result = ScoreResult {
            score_id,
            face_score,
            feature_highlights,
            image_url: self
                .config
                .resolve_image_url(response.image_url.as_deref().unwrap_or_default()),
            score_details: response.score_details.unwrap_or_default(),
            is_public: response.is_public,
            received_at: Utc::now(),
        };

        validate_score_result(&result)
            .map_err(|e| AppError::IncompleteScoreResponse(e.to_string()))?;
        Ok(result)
    }
}
