// src/application/commands/workflow_commands.rs
//
// Workflow Command Handlers
//
// RULES:
// - Accept DTOs
// - Call the workflow controller
// - Return DTOs
// - Never contain business logic

use std::path::Path;

use crate::application::dto::*;
use crate::application::error_handling::{ErrorResponse, ToErrorResponse};
use crate::application::state::AppState;
use crate::domain::{Opponent, WorkflowSnapshot};
use crate::error::AppResult;

/// Current workflow state
pub fn get_workflow(state: &AppState) -> WorkflowSnapshotDto {
    state.workflow.snapshot().into()
}

/// Load an image from disk as the current photo
pub fn select_image(state: &AppState, path: &str) -> Result<WorkflowSnapshotDto, String> {
    state
        .workflow
        .accept_path(Path::new(path))
        .map(WorkflowSnapshotDto::from)
        .to_error_response()
}

/// Current photo as a `data:` URL
pub fn preview_image(state: &AppState) -> Result<String, String> {
    state.workflow.preview_data_url().to_error_response()
}

/// Open the configured camera, take one framed photo and release the camera
pub async fn capture_photo(state: &AppState) -> Result<WorkflowSnapshotDto, String> {
    let camera = state.camera.as_ref().ok_or_else(|| {
        serde_json::to_string(&ErrorResponse::precondition("No camera configured"))
            .unwrap_or_else(|_| "No camera configured".to_string())
    })?;

    let session = camera.session();
    let captured: AppResult<WorkflowSnapshot> = async {
        session.open().await?;
        session.wait_for_frame().await?;
        state.workflow.capture_from(&session)
    }
    .await;
    session.close();

    captured.map(WorkflowSnapshotDto::from).to_error_response()
}

/// Score the current photo
pub async fn submit_score(state: &AppState) -> Result<ScoreDto, String> {
    state
        .workflow
        .submit_score()
        .await
        .map(ScoreDto::from)
        .to_error_response()
}

/// Pick the opponent from the ranking list
pub fn choose_opponent(state: &AppState, dto: ChooseOpponentDto) -> Result<(), String> {
    state
        .workflow
        .choose_opponent(Opponent::from(dto))
        .to_error_response()
}

/// Run a match against the chosen opponent
pub async fn start_match(state: &AppState) -> Result<MatchOutcomeDto, String> {
    state
        .workflow
        .request_match()
        .await
        .map(MatchOutcomeDto::from)
        .to_error_response()
}

/// Discard everything and start over
pub fn reset_workflow(state: &AppState) -> WorkflowSnapshotDto {
    state.workflow.reset();
    get_workflow(state)
}
