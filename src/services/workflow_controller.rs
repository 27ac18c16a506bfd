// src/services/workflow_controller.rs
//
// Workflow Controller - capture → score → match lifecycle
//
// States: Empty -> ImageReady -> Scored -> Matching -> Resolved
//         any --reset--> Empty
//
// CRITICAL RULES:
// - The controller is the ONLY writer of WorkflowState
// - Every mutation happens under one lock, never held across an await
// - A new image or a reset invalidates every in-flight request
// - Late responses for stale request tokens are discarded
// - Failures keep the photo and any prior score; nothing falls to Empty
// - Events are emitted after the lock is released

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use image::RgbaImage;

use crate::config::ClientConfig;
use crate::domain::{
    validate_opponent, ImageArtifact, LastError, MatchOutcome, Opponent, ScoreResult, Stage,
    WorkflowSnapshot, WorkflowState,
};
use crate::error::{AppError, AppResult};
use crate::events::{
    EventBus, ImageAcquired, MatchFailed, MatchResolved, MatchStarted, OpponentSelected,
    ProgressUpdated, ScoringCompleted, ScoringFailed, ScoringStarted, WorkflowReset,
};
use crate::infrastructure::PreviewRegistry;
use crate::services::capture_session::CaptureSession;
use crate::services::image_source::{ImageSourceAdapter, SelectedFile};
use crate::services::match_orchestrator::{MatchOrchestrator, MatchRequest, MatchService};
use crate::services::request_sequence::{RequestSequence, RequestToken};
use crate::services::scoring_orchestrator::{
    ProgressReporter, ScoreUpload, ScoringOrchestrator, ScoringService,
};
use crate::services::session::SessionStore;

pub struct WorkflowController {
    state: Arc<Mutex<WorkflowState>>,
    images: ImageSourceAdapter,
    scoring: ScoringOrchestrator,
    matching: MatchOrchestrator,
    session: Arc<dyn SessionStore>,
    event_bus: EventBus,
    publish_scores: bool,
}

impl WorkflowController {
    pub fn new(
        config: &ClientConfig,
        scoring_service: Arc<dyn ScoringService>,
        match_service: Arc<dyn MatchService>,
        session: Arc<dyn SessionStore>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(WorkflowState::new())),
            images: ImageSourceAdapter::new(PreviewRegistry::new(), config.max_upload_bytes),
            scoring: ScoringOrchestrator::new(scoring_service, config.clone()),
            matching: MatchOrchestrator::new(match_service, config.clone()),
            session,
            event_bus,
            publish_scores: config.publish_scores,
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn previews(&self) -> &PreviewRegistry {
        self.images.previews()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.lock().snapshot()
    }

    pub fn stage(&self) -> Stage {
        self.lock().stage()
    }

    /// Inline `data:` URL of the current image, for views outside this process
    pub fn preview_data_url(&self) -> AppResult<String> {
        self.lock()
            .artifact()
            .map(ImageArtifact::to_data_url)
            .ok_or_else(|| AppError::PreconditionFailed("No image to preview".to_string()))
    }

    // ========================================================================
    // ACQUISITION
    // ========================================================================

    /// Validate a picked file and make it the current image
    pub fn accept_file(&self, file: SelectedFile) -> AppResult<WorkflowSnapshot> {
        let artifact = self.images.accept_file(file).map_err(|e| self.record(e))?;
        Ok(self.install(artifact))
    }

    pub fn accept_path(&self, path: &Path) -> AppResult<WorkflowSnapshot> {
        let artifact = self.images.accept_path(path).map_err(|e| self.record(e))?;
        Ok(self.install(artifact))
    }

    /// Make an already framed camera bitmap the current image
    pub fn accept_captured_frame(&self, frame: &RgbaImage) -> AppResult<WorkflowSnapshot> {
        let artifact = self
            .images
            .accept_captured_frame(frame)
            .map_err(|e| self.record(e))?;
        Ok(self.install(artifact))
    }

    /// Sample a live capture session and make the frame the current image
    pub fn capture_from(&self, session: &CaptureSession) -> AppResult<WorkflowSnapshot> {
        let frame = session.capture_frame().map_err(|e| self.record(e))?;
        self.accept_captured_frame(&frame)
    }

    fn install(&self, artifact: ImageArtifact) -> WorkflowSnapshot {
        let event = ImageAcquired::new(artifact.id, artifact.origin, artifact.size(), false);

        let (previous, cleared_derived, snapshot) = {
            let mut state = self.lock();
            self.scoring.invalidate();
            self.matching.invalidate();

            let cleared = state.score().is_some() || state.outcome().is_some();
            let previous = state.accept_artifact(artifact);
            (previous, cleared, state.snapshot())
        };

        if let Some(mut previous) = previous {
            previous.release();
        }

        log::info!(
            "Image {} acquired, stage -> {}",
            event.artifact_id,
            Stage::ImageReady
        );
        self.event_bus.emit(ImageAcquired {
            cleared_derived,
            ..event
        });
        snapshot
    }

    // ========================================================================
    // SCORING
    // ========================================================================

    /// Submit the current image for scoring.
    ///
    /// A second call before the first resolves supersedes it: the earlier
    /// call then returns `Superseded` and leaves the state alone.
    pub async fn submit_score(&self) -> AppResult<ScoreResult> {
        let (token, upload, artifact_id) = {
            let mut state = self.lock();
            if let Err(e) = state.begin_scoring() {
                let error = AppError::from(e);
                state.record_error(LastError::from_error(&error));
                return Err(error);
            }
            let artifact = state
                .artifact()
                .ok_or_else(|| AppError::PreconditionFailed("No image has been acquired".into()))?;

            let upload = ScoreUpload::from_artifact(artifact, self.publish_scores);
            (self.scoring.start(), upload, artifact.id)
        };

        self.event_bus.emit(ScoringStarted::new(artifact_id));
        self.event_bus.emit(ProgressUpdated::new(Stage::ImageReady, 0));

        let progress = self.progress_reporter(self.scoring.sequence().clone(), token);
        let outcome = self.scoring.run(token, upload, progress).await;

        let mut state = self.lock();
        if !self.scoring.is_current(token) {
            return Err(AppError::Superseded);
        }

        match outcome {
            Ok(result) => {
                state.complete_scoring(result.clone())?;
                drop(state);

                log::info!("Stage -> {} (face score {})", Stage::Scored, result.face_score);
                self.event_bus.emit(ScoringCompleted::new(
                    artifact_id,
                    result.score_id,
                    result.face_score,
                ));
                self.event_bus.emit(ProgressUpdated::new(Stage::Scored, 100));
                Ok(result)
            }
            Err(e) => {
                state.fail_scoring(LastError::from_error(&e))?;
                drop(state);

                log::warn!("Scoring failed, staying in {}: {}", Stage::ImageReady, e);
                self.event_bus
                    .emit(ScoringFailed::new(artifact_id, e.kind(), e.to_string()));
                Err(e)
            }
        }
    }

    // ========================================================================
    // MATCHING
    // ========================================================================

    /// Choose the opponent for the next match. Not allowed while matching.
    pub fn choose_opponent(&self, opponent: Opponent) -> AppResult<()> {
        validate_opponent(&opponent)
            .map_err(|e| self.record(AppError::PreconditionFailed(e.to_string())))?;

        let opponent_id = opponent.opponent_id;
        let cleared_outcome = {
            let mut state = self.lock();
            let had_outcome = state.outcome().is_some();
            if let Err(e) = state.select_opponent(opponent) {
                let error = AppError::from(e);
                state.record_error(LastError::from_error(&error));
                return Err(error);
            }
            had_outcome && state.outcome().is_none()
        };

        log::info!("Opponent {} chosen", opponent_id);
        self.event_bus
            .emit(OpponentSelected::new(opponent_id, cleared_outcome));
        Ok(())
    }

    /// Start a match with the current score against the chosen opponent.
    ///
    /// Accepted from `Scored`, from `Resolved` as an explicit rematch, and
    /// from `Matching`, where it supersedes the attempt in flight.
    pub async fn request_match(&self) -> AppResult<MatchOutcome> {
        let own_id = self.session.current_identity().map(|identity| identity.user_id);

        let (token, request, opponent) = {
            let mut state = self.lock();

            let against_self = matches!(
                (own_id, state.opponent()),
                (Some(own_id), Some(opponent)) if opponent.opponent_id.0 == own_id
            );
            if against_self {
                let error =
                    AppError::PreconditionFailed("Cannot start a match against yourself".to_string());
                state.record_error(LastError::from_error(&error));
                return Err(error);
            }

            let (score_id, opponent_id) = match state.begin_match() {
                Ok(ids) => ids,
                Err(e) => {
                    let error = AppError::from(e);
                    state.record_error(LastError::from_error(&error));
                    return Err(error);
                }
            };
            let opponent = state
                .opponent()
                .cloned()
                .ok_or_else(|| AppError::PreconditionFailed("No opponent chosen".into()))?;

            let request = MatchRequest {
                opponent_id,
                score_id,
            };
            (self.matching.start(), request, opponent)
        };

        log::info!("Stage -> {} against {}", Stage::Matching, request.opponent_id);
        self.event_bus
            .emit(MatchStarted::new(request.score_id, request.opponent_id));

        let progress = self.progress_reporter(self.matching.sequence().clone(), token);
        let outcome = self.matching.run(token, request, opponent, progress).await;

        let mut state = self.lock();
        if !self.matching.is_current(token) {
            return Err(AppError::Superseded);
        }

        match outcome {
            Ok(outcome) => {
                state.complete_match(outcome.clone())?;
                drop(state);

                log::info!("Stage -> {} ({})", Stage::Resolved, outcome.result);
                self.event_bus.emit(MatchResolved::new(
                    request.opponent_id,
                    outcome.result,
                    outcome.rating_delta,
                    outcome.new_rating,
                ));
                self.event_bus.emit(ProgressUpdated::new(Stage::Resolved, 100));
                Ok(outcome)
            }
            Err(e) => {
                state.fail_match(LastError::from_error(&e))?;
                drop(state);

                log::warn!("Match failed, back to {}: {}", Stage::Scored, e);
                self.event_bus
                    .emit(MatchFailed::new(request.opponent_id, e.to_string()));
                Err(e)
            }
        }
    }

    // ========================================================================
    // RESET
    // ========================================================================

    /// Back to `Empty`. Responses still in flight will be discarded.
    pub fn reset(&self) {
        let artifact = {
            let mut state = self.lock();
            self.scoring.invalidate();
            self.matching.invalidate();
            state.reset()
        };

        if let Some(mut artifact) = artifact {
            artifact.release();
        }

        log::info!("Workflow reset, stage -> {}", Stage::Empty);
        self.event_bus.emit(WorkflowReset::new());
    }

    // ========================================================================
    // INTERNAL
    // ========================================================================

    /// Progress sink for one request. Updates from stale tokens are dropped.
    fn progress_reporter(&self, sequence: RequestSequence, token: RequestToken) -> ProgressReporter {
        let state = Arc::clone(&self.state);
        let event_bus = self.event_bus.clone();

        ProgressReporter::new(move |percent| {
            let moved = {
                let mut state = state.lock().unwrap();
                if !sequence.is_current(token) {
                    return;
                }
                state.advance_progress(percent).then(|| state.stage())
            };

            if let Some(stage) = moved {
                event_bus.emit(ProgressUpdated::new(stage, percent));
            }
        })
    }

    /// Attach an acquisition or precondition error to the state
    fn record(&self, error: AppError) -> AppError {
        if !error.is_superseded() {
            self.lock().record_error(LastError::from_error(&error));
        }
        log::warn!("{}", error);
        error
    }

    fn lock(&self) -> MutexGuard<'_, WorkflowState> {
        self.state.lock().unwrap()
    }

    #[cfg(test)]
    pub(crate) fn state_for_tests(&self) -> MutexGuard<'_, WorkflowState> {
        self.lock()
    }
}

impl std::fmt::Debug for WorkflowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowController")
            .field("stage", &self.stage())
            .finish()
    }
}
