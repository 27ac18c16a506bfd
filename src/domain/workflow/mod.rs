pub mod invariants;
pub mod state;

pub use invariants::validate_workflow_state;
pub use state::{ImageSummary, LastError, Stage, WorkflowSnapshot, WorkflowState};
