use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::artifact::{ImageArtifact, ImageMime, ImageOrigin};
use crate::domain::opponent::{Opponent, OpponentId};
use crate::domain::outcome::MatchOutcome;
use crate::domain::score::{ScoreId, ScoreResult};
use crate::domain::{DomainError, DomainResult};
use crate::error::{AppError, ErrorKind};

/// Discrete phase of the capture, score and match lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Empty,
    ImageReady,
    Scored,
    Matching,
    Resolved,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Empty => write!(f, "Empty"),
            Stage::ImageReady => write!(f, "ImageReady"),
            Stage::Scored => write!(f, "Scored"),
            Stage::Matching => write!(f, "Matching"),
            Stage::Resolved => write!(f, "Resolved"),
        }
    }
}

/// Error message retained for display after a failed operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastError {
    pub kind: Option<ErrorKind>,
    pub message: String,
}

impl LastError {
    pub fn from_error(error: &AppError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Single source of truth for one workflow session.
///
/// Fields are only reachable through the transition methods below, which
/// the workflow controller calls while holding its lock.
#[derive(Debug)]
pub struct WorkflowState {
    stage: Stage,
    scoring_in_flight: bool,
    artifact: Option<ImageArtifact>,
    score: Option<ScoreResult>,
    opponent: Option<Opponent>,
    outcome: Option<MatchOutcome>,
    progress: u8,
    last_error: Option<LastError>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            stage: Stage::Empty,
            scoring_in_flight: false,
            artifact: None,
            score: None,
            opponent: None,
            outcome: None,
            progress: 0,
            last_error: None,
        }
    }
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // READ ACCESS
    // ========================================================================

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_scoring(&self) -> bool {
        self.scoring_in_flight
    }

    pub fn artifact(&self) -> Option<&ImageArtifact> {
        self.artifact.as_ref()
    }

    pub fn score(&self) -> Option<&ScoreResult> {
        self.score.as_ref()
    }

    pub fn opponent(&self) -> Option<&Opponent> {
        self.opponent.as_ref()
    }

    pub fn outcome(&self) -> Option<&MatchOutcome> {
        self.outcome.as_ref()
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn last_error(&self) -> Option<&LastError> {
        self.last_error.as_ref()
    }

    // ========================================================================
    // TRANSITIONS
    // ========================================================================

    /// Store a freshly acquired image. Allowed from every stage.
    ///
    /// All data derived from the previous image is dropped. The previous
    /// artifact is handed back so the caller can release it.
    pub(crate) fn accept_artifact(&mut self, artifact: ImageArtifact) -> Option<ImageArtifact> {
        let previous = self.artifact.replace(artifact);
        self.score = None;
        self.outcome = None;
        self.scoring_in_flight = false;
        self.progress = 0;
        self.last_error = None;
        self.stage = Stage::ImageReady;
        previous
    }

    /// Start a scoring attempt. A second call while one is in flight starts
    /// a new attempt that supersedes the first.
    pub(crate) fn begin_scoring(&mut self) -> DomainResult<()> {
        if self.artifact.is_none() {
            return Err(DomainError::PreconditionFailed(
                "No image has been acquired".to_string(),
            ));
        }
        if self.stage != Stage::ImageReady {
            return Err(DomainError::InvalidStateTransition(format!(
                "Cannot score from {}; acquire a new image first",
                self.stage
            )));
        }

        self.scoring_in_flight = true;
        self.progress = 0;
        self.last_error = None;
        Ok(())
    }

    pub(crate) fn complete_scoring(&mut self, result: ScoreResult) -> DomainResult<()> {
        self.ensure_scoring()?;
        self.score = Some(result);
        self.scoring_in_flight = false;
        self.progress = 100;
        self.stage = Stage::Scored;
        Ok(())
    }

    pub(crate) fn fail_scoring(&mut self, error: LastError) -> DomainResult<()> {
        self.ensure_scoring()?;
        self.scoring_in_flight = false;
        self.progress = 0;
        self.last_error = Some(error);
        Ok(())
    }

    /// Pick the opponent for the next match.
    ///
    /// Switching to a different opponent drops an outcome that belongs to
    /// the previous one.
    pub(crate) fn select_opponent(&mut self, opponent: Opponent) -> DomainResult<()> {
        if self.stage == Stage::Matching {
            return Err(DomainError::InvalidStateTransition(
                "Cannot change opponent while a match is running".to_string(),
            ));
        }

        let changed = self
            .opponent
            .as_ref()
            .map_or(true, |current| current.opponent_id != opponent.opponent_id);
        if changed && self.outcome.take().is_some() && self.stage == Stage::Resolved {
            self.stage = Stage::Scored;
        }

        self.opponent = Some(opponent);
        Ok(())
    }

    /// Enter `Matching`. Returns the identifiers the match request needs.
    pub(crate) fn begin_match(&mut self) -> DomainResult<(ScoreId, OpponentId)> {
        let score_id = self
            .score
            .as_ref()
            .map(|s| s.score_id)
            .ok_or_else(|| DomainError::PreconditionFailed("No score to match with".to_string()))?;
        let opponent_id = self
            .opponent
            .as_ref()
            .map(|o| o.opponent_id)
            .ok_or_else(|| DomainError::PreconditionFailed("No opponent chosen".to_string()))?;

        if !matches!(self.stage, Stage::Scored | Stage::Resolved | Stage::Matching) {
            return Err(DomainError::InvalidStateTransition(format!(
                "Cannot start a match from {}",
                self.stage
            )));
        }

        self.stage = Stage::Matching;
        self.progress = 0;
        self.last_error = None;
        Ok((score_id, opponent_id))
    }

    pub(crate) fn complete_match(&mut self, outcome: MatchOutcome) -> DomainResult<()> {
        self.ensure_matching()?;
        self.opponent = Some(outcome.updated_opponent.clone());
        self.outcome = Some(outcome);
        self.progress = 100;
        self.stage = Stage::Resolved;
        Ok(())
    }

    /// Fall back to `Scored`. Any earlier outcome is left as it was.
    pub(crate) fn fail_match(&mut self, error: LastError) -> DomainResult<()> {
        self.ensure_matching()?;
        self.progress = 0;
        self.last_error = Some(error);
        self.stage = Stage::Scored;
        Ok(())
    }

    /// Raise progress of the running attempt. Returns true if it moved.
    ///
    /// Progress never decreases inside an attempt and is ignored when
    /// nothing is in flight.
    pub(crate) fn advance_progress(&mut self, percent: u8) -> bool {
        if !self.scoring_in_flight && self.stage != Stage::Matching {
            return false;
        }
        let percent = percent.min(100);
        if percent > self.progress {
            self.progress = percent;
            true
        } else {
            false
        }
    }

    pub(crate) fn record_error(&mut self, error: LastError) {
        self.last_error = Some(error);
    }

    /// Back to `Empty`. Returns the artifact so the caller can release it.
    pub(crate) fn reset(&mut self) -> Option<ImageArtifact> {
        let artifact = self.artifact.take();
        *self = WorkflowState::default();
        artifact
    }

    fn ensure_scoring(&self) -> DomainResult<()> {
        if self.stage != Stage::ImageReady || !self.scoring_in_flight {
            return Err(DomainError::InvalidStateTransition(format!(
                "No scoring attempt in flight (stage {})",
                self.stage
            )));
        }
        Ok(())
    }

    fn ensure_matching(&self) -> DomainResult<()> {
        if self.stage != Stage::Matching {
            return Err(DomainError::InvalidStateTransition(format!(
                "No match in flight (stage {})",
                self.stage
            )));
        }
        Ok(())
    }

    // ========================================================================
    // SNAPSHOT
    // ========================================================================

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            stage: self.stage,
            scoring_in_flight: self.scoring_in_flight,
            image: self.artifact.as_ref().map(ImageSummary::from_artifact),
            score: self.score.clone(),
            opponent: self.opponent.clone(),
            outcome: self.outcome.clone(),
            progress: self.progress,
            last_error: self.last_error.clone(),
        }
    }
}

/// What a presentation layer needs to know about the current image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSummary {
    pub id: Uuid,
    pub file_name: String,
    pub mime: ImageMime,
    pub origin: ImageOrigin,
    pub size: u64,
    pub preview_uri: String,
}

impl ImageSummary {
    fn from_artifact(artifact: &ImageArtifact) -> Self {
        Self {
            id: artifact.id,
            file_name: artifact.file_name.clone(),
            mime: artifact.mime,
            origin: artifact.origin,
            size: artifact.size(),
            preview_uri: artifact.preview_uri(),
        }
    }
}

/// Read-only copy of the workflow state, without image bytes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowSnapshot {
    pub stage: Stage,
    pub scoring_in_flight: bool,
    pub image: Option<ImageSummary>,
    pub score: Option<ScoreResult>,
    pub opponent: Option<Opponent>,
    pub outcome: Option<MatchOutcome>,
    pub progress: u8,
    pub last_error: Option<LastError>,
}
