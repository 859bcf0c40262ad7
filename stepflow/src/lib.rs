//! # Stepflow
//!
//! A step-oriented execution engine for multi-stage ML workflows.
//!
//! Stepflow orchestrates pipelines of named steps (ingest → split →
//! transform → train → evaluate → register) without knowing what any
//! step computes. Given a target step it:
//!
//! - **Resolves the subgraph**: the ordered steps sharing the target's
//!   classification (training path vs scoring path)
//! - **Maintains an execution directory**: a persistent on-disk layout
//!   with a generated build description (Makefile) driving one
//!   subprocess command per step
//! - **Delegates execution**: an external build-style runner decides
//!   which steps are stale and re-runs them in dependency order
//! - **Classifies cache hits**: the runner's output is parsed to tell
//!   cached steps apart from freshly-executed ones
//! - **Tracks durable state**: per-step status/timestamp/error records,
//!   with downstream invalidation when an upstream step changes
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepflow::prelude::*;
//!
//! let pipeline = Pipeline::builder("/path/to/pipeline")
//!     .config_source(JsonFileConfigSource::new("/path/to/pipeline"))
//!     .build()?;
//!
//! // Run the "train" step and everything it depends on.
//! pipeline.run(Some("train")).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod execution;
pub mod observability;
pub mod pipeline;
pub mod steps;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ConfigSource, JsonFileConfigSource, PipelineConfig};
    pub use crate::core::{ExecutionState, StepArtifact, StepClass, StepStatus};
    pub use crate::errors::{ConfigError, StepflowError};
    pub use crate::execution::{
        ExecutionDirectory, ExecutionPlan, ExternalRunner, MakeOutputAdapter,
        MakeRunner, RunnerOutputAdapter, TARGET_STEP_ENV_VAR,
    };
    pub use crate::pipeline::{Pipeline, PipelineTemplate};
    pub use crate::steps::Step;
    pub use crate::utils::now_epoch_seconds;
}
