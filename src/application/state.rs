// src/application/state.rs

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::AppResult;
use crate::events::EventBus;
use crate::integrations::ApiClient;
use crate::services::{
    CameraDevice, InMemorySession, MatchService, ScoringService, WorkflowController,
};

/// Application state shared by every command.
/// Services are initialized once and shared through Arc.
pub struct AppState {
    pub config: ClientConfig,
    pub event_bus: EventBus,
    pub session: Arc<InMemorySession>,
    pub workflow: Arc<WorkflowController>,
    pub camera: Option<CameraDevice>,
}

impl AppState {
    /// Wire the workflow to the HTTP API
    pub fn new(config: ClientConfig, session: Arc<InMemorySession>) -> AppResult<Self> {
        let api = Arc::new(ApiClient::new(&config, session.clone())?);
        Ok(Self::with_services(config, api.clone(), api, session))
    }

    /// Wire the workflow to arbitrary service implementations
    pub fn with_services(
        config: ClientConfig,
        scoring: Arc<dyn ScoringService>,
        matching: Arc<dyn MatchService>,
        session: Arc<InMemorySession>,
    ) -> Self {
        let event_bus = EventBus::new();
        let workflow = Arc::new(WorkflowController::new(
            &config,
            scoring,
            matching,
            session.clone(),
            event_bus.clone(),
        ));

        Self {
            config,
            event_bus,
            session,
            workflow,
            camera: None,
        }
    }

    pub fn with_camera(mut self, camera: CameraDevice) -> Self {
        self.camera = Some(camera);
        self
    }
}
