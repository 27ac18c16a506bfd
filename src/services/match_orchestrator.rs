// src/services/match_orchestrator.rs
//
// Match Orchestrator - Score + Opponent → Outcome
//
// Single attempt: Idle -> AnimatingAndWaiting -> Resolved | Failed
//
// The cosmetic progress animation and the match request are two futures
// polled together on one task. Whichever finishes first, the animation
// stops when the response arrives and progress snaps to 100 on success.
//
// CRITICAL RULES:
// - No outcome is fabricated on failure
// - Unknown result strings are failures, never a default result
// - Refined opponent fields are merged, known fields are kept
// - No automatic retry

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;

use crate::config::{AnimationConfig, ClientConfig};
use crate::domain::{
    MatchOutcome, MatchResult, Opponent, OpponentId, OpponentRefinement, ScoreId,
};
use crate::error::{AppError, AppResult};
use crate::services::request_sequence::{RequestSequence, RequestToken};
use crate::services::scoring_orchestrator::ProgressReporter;

// ============================================================================
// SERVICE CONTRACT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchRequest {
    pub opponent_id: OpponentId,
    pub score_id: ScoreId,
}

/// One side of a match as reported by the service
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MatchParticipant {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Match response exactly as the service sends it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub match_id: Option<i64>,
    #[serde(default)]
    pub challenger: Option<MatchParticipant>,
    #[serde(default)]
    pub opponent: Option<MatchParticipant>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub points_change: Option<i64>,
    #[serde(default)]
    pub new_rating: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
}

fn default_success() -> bool {
    true
}

impl MatchResponse {
    /// Successful response carrying only a result string
    pub fn with_result(result: &str) -> Self {
        Self {
            success: true,
            match_id: None,
            challenger: None,
            opponent: None,
            result: Some(result.to_string()),
            points_change: None,
            new_rating: None,
            error: None,
        }
    }
}

/// Remote match creation. Any failure is reported as `MatchCreationFailed`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MatchService: Send + Sync {
    async fn create_match(&self, request: MatchRequest) -> AppResult<MatchResponse>;
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchPhase {
    Idle,
    AnimatingAndWaiting,
    Resolved,
    Failed,
}

pub struct MatchOrchestrator {
    service: Arc<dyn MatchService>,
    config: ClientConfig,
    sequence: RequestSequence,
    phase: Mutex<MatchPhase>,
}

impl MatchOrchestrator {
    pub fn new(service: Arc<dyn MatchService>, config: ClientConfig) -> Self {
        Self {
            service,
            config,
            sequence: RequestSequence::new(),
            phase: Mutex::new(MatchPhase::Idle),
        }
    }

    pub fn phase(&self) -> MatchPhase {
        *self.phase.lock().unwrap()
    }

    pub fn animation(&self) -> AnimationConfig {
        self.config.animation
    }

    pub fn sequence(&self) -> &RequestSequence {
        &self.sequence
    }

    pub fn start(&self) -> RequestToken {
        self.sequence.next()
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.sequence.is_current(token)
    }

    pub fn invalidate(&self) {
        self.sequence.invalidate();
    }

    /// Run one attempt for a token obtained from `start()`.
    ///
    /// Returns `Superseded` when a newer attempt started meanwhile.
    pub async fn run(
        &self,
        token: RequestToken,
        request: MatchRequest,
        opponent: Opponent,
        progress: ProgressReporter,
    ) -> AppResult<MatchOutcome> {
        if request.opponent_id != opponent.opponent_id {
            return Err(AppError::PreconditionFailed(format!(
                "Request targets opponent {} but {} was chosen",
                request.opponent_id, opponent.opponent_id
            )));
        }

        self.set_phase(MatchPhase::AnimatingAndWaiting);
        log::info!(
            "Match {} started: score {} vs opponent {}",
            token,
            request.score_id,
            request.opponent_id
        );

        let animation = self.config.animation;
        let mut ticker = tokio::time::interval_at(
            tokio::time::Instant::now() + animation.tick_interval,
            animation.tick_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut percent: u8 = 0;
        progress.report(percent);

        let call = self.service.create_match(request);
        tokio::pin!(call);

        let response = loop {
            tokio::select! {
                biased;
                response = &mut call => break response,
                _ = ticker.tick(), if percent < 100 => {
                    percent = percent.saturating_add(animation.step).min(100);
                    if self.sequence.is_current(token) {
                        log::debug!("Match {} animation at {}%", token, percent);
                        progress.report(percent);
                    }
                }
            }
        };

        if !self.sequence.is_current(token) {
            log::warn!("Discarding match response for superseded request {}", token);
            return Err(AppError::Superseded);
        }

        let outcome = response
            .map_err(|e| match e {
                AppError::MatchCreationFailed(_) => e,
                other => AppError::MatchCreationFailed(other.to_string()),
            })
            .and_then(|response| self.resolve(response, &opponent));

        match outcome {
            Ok(outcome) => {
                progress.report(100);
                self.set_phase(MatchPhase::Resolved);
                log::info!("Match {} resolved: {}", token, outcome.result);
                Ok(outcome)
            }
            Err(e) => {
                self.set_phase(MatchPhase::Failed);
                log::warn!("Match {} failed: {}", token, e);
                Err(e)
            }
        }
    }

    /// Map a raw response to an outcome against `opponent`
    pub fn resolve(&self, response: MatchResponse, opponent: &Opponent) -> AppResult<MatchOutcome> {
        if !response.success {
            return Err(AppError::MatchCreationFailed(
                response
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| "Match service reported a failure".to_string()),
            ));
        }

        let raw = response.result.as_deref().unwrap_or_default();
        let result = MatchResult::parse(raw).ok_or_else(|| {
            AppError::MatchCreationFailed(format!("Unrecognized match result {:?}", raw))
        })?;

        let updated_opponent = match &response.opponent {
            Some(refined) => opponent.refined(&self.refinement(refined)),
            None => opponent.clone(),
        };

        Ok(MatchOutcome {
            match_id: response.match_id,
            result,
            rating_delta: response.points_change,
            new_rating: response.new_rating,
            updated_opponent,
            resolved_at: Utc::now(),
        })
    }

    fn refinement(&self, participant: &MatchParticipant) -> OpponentRefinement {
        OpponentRefinement {
            opponent_id: participant.user_id.map(OpponentId),
            display_name: participant.username.clone(),
            avatar_ref: participant
                .avatar_url
                .as_deref()
                .map(|url| self.config.resolve_image_url(url)),
            image_url: participant
                .image_url
                .as_deref()
                .map(|url| self.config.resolve_image_url(url)),
            score: participant.score,
        }
    }

    fn set_phase(&self, phase: MatchPhase) {
        *self.phase.lock().unwrap() = phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn opponent() -> Opponent {
        Opponent::new(OpponentId(7), "rival".to_string(), 85.0, 2, ScoreId(99))
    }

    fn request() -> MatchRequest {
        MatchRequest {
            opponent_id: OpponentId(7),
            score_id: ScoreId(42),
        }
    }

    fn recorder() -> (ProgressReporter, Arc<Mutex<Vec<u8>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (
            ProgressReporter::new(move |p| sink.lock().unwrap().push(p)),
            seen,
        )
    }

    /// Responds only when the test releases the gate
    struct GatedMatchService {
        gate: Mutex<Option<oneshot::Receiver<AppResult<MatchResponse>>>>,
    }

    #[async_trait]
    impl MatchService for GatedMatchService {
        async fn create_match(&self, _request: MatchRequest) -> AppResult<MatchResponse> {
            let gate = self.gate.lock().unwrap().take();
            match gate {
                Some(gate) => gate
                    .await
                    .unwrap_or_else(|_| Err(AppError::MatchCreationFailed("gate dropped".into()))),
                None => Err(AppError::MatchCreationFailed("already used".into())),
            }
        }
    }

    fn gated() -> (
        MatchOrchestrator,
        oneshot::Sender<AppResult<MatchResponse>>,
    ) {
        let (tx, rx) = oneshot::channel();
        let service = GatedMatchService {
            gate: Mutex::new(Some(rx)),
        };
        (
            MatchOrchestrator::new(Arc::new(service), ClientConfig::default()),
            tx,
        )
    }

    #[tokio::test]
    async fn test_win_resolves_outcome() {
        let mut mock = MockMatchService::new();
        mock.expect_create_match()
            .withf(|r| r.opponent_id == OpponentId(7) && r.score_id == ScoreId(42))
            .times(1)
            .returning(|_| {
                Ok(MatchResponse {
                    new_rating: Some(1200),
                    points_change: Some(15),
                    ..MatchResponse::with_result("Win")
                })
            });
        let orchestrator = MatchOrchestrator::new(Arc::new(mock), ClientConfig::default());

        let (progress, seen) = recorder();
        let token = orchestrator.start();
        let outcome = orchestrator
            .run(token, request(), opponent(), progress)
            .await
            .unwrap();

        assert_eq!(outcome.result, MatchResult::Win);
        assert_eq!(outcome.new_rating, Some(1200));
        assert_eq!(outcome.rating_delta, Some(15));
        assert_eq!(seen.lock().unwrap().last(), Some(&100));
        assert_eq!(orchestrator.phase(), MatchPhase::Resolved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_animation_ticks_until_response() {
        let (orchestrator, respond) = gated();
        let (progress, seen) = recorder();

        let token = orchestrator.start();
        let run = orchestrator.run(token, request(), opponent(), progress);
        tokio::pin!(run);

        // Three ticks of 300ms pass before the service answers
        let outcome = tokio::select! {
            outcome = &mut run => outcome,
            _ = tokio::time::sleep(Duration::from_millis(950)) => {
                let _ = respond.send(Ok(MatchResponse::with_result("Lose")));
                run.await
            }
        };

        assert_eq!(outcome.unwrap().result, MatchResult::Lose);
        assert_eq!(*seen.lock().unwrap(), vec![0, 10, 20, 30, 100]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_animation_caps_at_100_while_waiting() {
        let (orchestrator, respond) = gated();
        let (progress, seen) = recorder();

        let token = orchestrator.start();
        let run = orchestrator.run(token, request(), opponent(), progress);
        tokio::pin!(run);

        let outcome = tokio::select! {
            outcome = &mut run => outcome,
            _ = tokio::time::sleep(Duration::from_secs(10)) => {
                let _ = respond.send(Ok(MatchResponse::with_result("Tie")));
                run.await
            }
        };

        assert_eq!(outcome.unwrap().result, MatchResult::Tie);
        let seen = seen.lock().unwrap();
        assert!(seen.iter().all(|p| *p <= 100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.iter().filter(|p| **p == 100).count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_stops_animation_without_outcome() {
        let (orchestrator, respond) = gated();
        let (progress, seen) = recorder();

        let token = orchestrator.start();
        let run = orchestrator.run(token, request(), opponent(), progress);
        tokio::pin!(run);

        let result = tokio::select! {
            outcome = &mut run => outcome,
            _ = tokio::time::sleep(Duration::from_millis(650)) => {
                let _ = respond.send(Err(AppError::Other("network down".into())));
                run.await
            }
        };

        let err = result.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::MatchCreationFailed));
        assert_eq!(*seen.lock().unwrap(), vec![0, 10, 20]);
        assert_eq!(orchestrator.phase(), MatchPhase::Failed);
    }

    #[test]
    fn test_unrecognized_result_is_a_failure() {
        let orchestrator =
            MatchOrchestrator::new(Arc::new(MockMatchService::new()), ClientConfig::default());

        for raw in ["Draw", "", "WIN!"] {
            let err = orchestrator
                .resolve(MatchResponse::with_result(raw), &opponent())
                .unwrap_err();
            assert_eq!(err.kind(), Some(ErrorKind::MatchCreationFailed));
        }

        let missing = MatchResponse {
            result: None,
            ..MatchResponse::with_result("Win")
        };
        assert!(orchestrator.resolve(missing, &opponent()).is_err());
    }

    #[test]
    fn test_refined_opponent_is_merged() {
        let orchestrator =
            MatchOrchestrator::new(Arc::new(MockMatchService::new()), ClientConfig::default());
        let response: MatchResponse = serde_json::from_value(serde_json::json!({
            "match_id": 5,
            "result": "Win",
            "points_change": 15,
            "new_rating": 1015,
            "challenger": { "user_id": 1, "username": "me", "score": 91.5, "image_url": "/uploads/me.jpg" },
            "opponent": { "user_id": 7, "username": "rival", "score": 88.0, "image_url": "/uploads/rival.jpg" }
        }))
        .unwrap();

        let outcome = orchestrator.resolve(response, &opponent()).unwrap();

        assert_eq!(outcome.match_id, Some(5));
        assert_eq!(outcome.updated_opponent.score, 88.0);
        assert_eq!(outcome.updated_opponent.rank, 2);
        assert_eq!(
            outcome.updated_opponent.image_url.as_deref(),
            Some("http://localhost:8000/uploads/rival.jpg")
        );
    }

    #[test]
    fn test_unsuccessful_response_is_a_failure() {
        let orchestrator =
            MatchOrchestrator::new(Arc::new(MockMatchService::new()), ClientConfig::default());
        let response = MatchResponse {
            success: false,
            error: Some("Opponent has no public score".into()),
            ..MatchResponse::with_result("Win")
        };

        let err = orchestrator.resolve(response, &opponent()).unwrap_err();
        assert!(matches!(err, AppError::MatchCreationFailed(ref m) if m.contains("no public score")));
    }

    #[tokio::test]
    async fn test_superseded_attempt_is_discarded() {
        let mut mock = MockMatchService::new();
        mock.expect_create_match()
            .returning(|_| Ok(MatchResponse::with_result("Win")));
        let orchestrator = MatchOrchestrator::new(Arc::new(mock), ClientConfig::default());

        let stale = orchestrator.start();
        let _fresh = orchestrator.start();
        let err = orchestrator
            .run(stale, request(), opponent(), ProgressReporter::silent())
            .await
            .unwrap_err();

        assert!(err.is_superseded());
    }
}
