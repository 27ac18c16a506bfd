// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod capture_session;
pub mod image_source;
pub mod match_orchestrator;
pub mod request_sequence;
pub mod scoring_orchestrator;
pub mod session;
pub mod workflow_controller;


// Re-export all services and their types
pub use capture_session::{
    CameraBackend,
    CameraDevice,
    CaptureSession,
    CaptureState,
    FrameSlot,
    MediaStream,
};

pub use image_source::{
    ImageSourceAdapter,
    SelectedFile,
};

pub use scoring_orchestrator::{
    ProgressReporter,
    ScoreResponse,
    ScoreUpload,
    ScoringOrchestrator,
    ScoringService,
};

pub use match_orchestrator::{
    MatchOrchestrator,
    MatchParticipant,
    MatchPhase,
    MatchRequest,
    MatchResponse,
    MatchService,
};

pub use request_sequence::{
    RequestSequence,
    RequestToken,
};

pub use session::{
    Identity,
    InMemorySession,
    SessionStore,
};

pub use workflow_controller::WorkflowController;
