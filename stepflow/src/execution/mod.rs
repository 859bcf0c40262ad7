//! Execution and caching orchestration.
//!
//! This module owns the hard part of the engine: the persistent
//! execution directory, the generated build description, the external
//! runner invocation, the cache-vs-run classification of its output,
//! durable per-step state, and downstream invalidation.

mod directory;
mod invalidation;
mod makefile;
mod plan;
mod runner;


pub use directory::{ExecutionDirectory, EXECUTION_DIR_ENV_VAR};
pub use invalidation::{clean_execution_state, clear_step_state, invalidate_downstream};
pub use makefile::{render_makefile, MAKEFILE_NAME, STEP_SENTINEL_FILE_NAME};
pub use plan::{ExecutionPlan, MakeOutputAdapter, RunnerOutputAdapter, STEP_START_MARKER_PREFIX};
pub use runner::{
    run_step, ExternalRunner, MakeRunner, RunnerOutcome, RunnerRequest, PIPELINE_ROOT_ENV_VAR,
    TARGET_STEP_ENV_VAR,
};
