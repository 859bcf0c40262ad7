//! Core types: step status, classification, execution state, artifacts.

mod artifact;
mod state;
mod status;

pub use artifact::StepArtifact;
pub use state::{ExecutionState, EXECUTION_STATE_FILE_NAME};
pub use status::{StepClass, StepStatus};
