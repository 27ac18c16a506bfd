// src/lib.rs
// Mirror PK - Capture, score and match orchestration engine
//
// Architecture:
// - Domain-centric: WorkflowState is the single source of truth
// - Event-driven: every transition is announced on the EventBus
// - Explicit: No implicit behavior, no magic
// - Single-flight: only the latest request may change the state
// - Application Layer: presentation boundary

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod infrastructure;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;
pub mod integrations;

// ============================================================================
// PUBLIC API - Domain Entities
// ============================================================================

pub use domain::{
    validate_artifact,
    validate_face_score,
    validate_opponent,
    validate_score_result,
    validate_workflow_state,
    // Artifact
    ImageArtifact,
    ImageMime,
    ImageOrigin,
    ImageSummary,
    LastError,
    // Outcome
    MatchOutcome,
    MatchResult,
    // Opponent
    Opponent,
    OpponentId,
    OpponentRefinement,
    // Score
    ScoreDetail,
    ScoreId,
    ScoreResult,
    // Workflow
    Stage,
    WorkflowSnapshot,
    WorkflowState,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult, ErrorKind};

// ============================================================================
// PUBLIC API - Configuration
// ============================================================================

pub use config::{AnimationConfig, ClientConfig};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    create_event_bus,
    DomainEvent,
    EventBus,
    ImageAcquired,
    MatchFailed,
    MatchResolved,
    MatchStarted,
    OpponentSelected,
    ProgressUpdated,
    ScoringCompleted,
    ScoringFailed,
    ScoringStarted,
    SubscriptionId,
    WorkflowReset,
};

// ============================================================================
// PUBLIC API - Infrastructure
// ============================================================================

pub use infrastructure::{PreviewHandle, PreviewRegistry};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    // Capture Session
    CameraBackend,
    CameraDevice,
    CaptureSession,
    CaptureState,
    // Image Source
    ImageSourceAdapter,
    SelectedFile,
    // Session
    Identity,
    InMemorySession,
    SessionStore,
    // Match Orchestrator
    MatchOrchestrator,
    MatchPhase,
    MatchRequest,
    MatchResponse,
    MatchService,
    // Scoring Orchestrator
    ProgressReporter,
    ScoreResponse,
    ScoreUpload,
    ScoringOrchestrator,
    ScoringService,
    // Single-flight
    RequestSequence,
    RequestToken,
    // Workflow Controller
    WorkflowController,
};

// ============================================================================
// PUBLIC API - Integrations
// ============================================================================

pub use integrations::{ApiClient, StillFrameCamera};

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use application::AppState;
