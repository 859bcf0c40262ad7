//! Error types for the stepflow engine.
//!
//! The taxonomy distinguishes configuration errors (eager, fatal for the
//! call), step execution failures (recorded as state, surfaced only when
//! the caller inspects it), infrastructure failures (propagate
//! immediately, recovered by idempotent re-invocation), and lookup
//! errors (unknown step/artifact/template names, listing the available
//! options).

use thiserror::Error;

/// The main error type for stepflow operations.
#[derive(Debug, Error)]
pub enum StepflowError {
    /// A configuration error detected at step construction.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The named step does not exist in the pipeline.
    #[error("Step '{name}' not found in pipeline. Available steps are: {}", available.join(", "))]
    StepNotFound {
        /// The requested step name.
        name: String,
        /// All step names declared by the pipeline.
        available: Vec<String>,
    },

    /// The named artifact is not produced by any pipeline step.
    #[error("The artifact with name '{name}' is not supported. Available artifacts are: {}", available.join(", "))]
    ArtifactNotSupported {
        /// The requested artifact name.
        name: String,
        /// All artifact names declared by the pipeline's steps.
        available: Vec<String>,
    },

    /// The pipeline template identifier is not registered.
    #[error("Unknown pipeline template '{name}'. Known templates are: {}", known.join(", "))]
    UnknownTemplate {
        /// The requested template identifier.
        name: String,
        /// All registered template identifiers.
        known: Vec<String>,
    },

    /// A targeted step run failed, on the target itself or on one of its
    /// upstream dependencies.
    ///
    /// This is the consolidated error produced by [`crate::pipeline::Pipeline::run`]
    /// after inspecting recorded execution state; the orchestration layer
    /// itself never raises on a runner failure.
    #[error("Failed to run step '{target}' of pipeline '{pipeline}'. An error was encountered while running step '{step}': {stack_trace}")]
    StepFailed {
        /// The pipeline name.
        pipeline: String,
        /// The step the caller asked to run.
        target: String,
        /// The deepest failing step.
        step: String,
        /// The captured error trace from that step.
        stack_trace: String,
    },

    /// A whole-pipeline run (no explicit target step) failed.
    #[error("Failed to run pipeline '{pipeline}'. An error was encountered while running step '{step}': {stack_trace}")]
    PipelineFailed {
        /// The pipeline name.
        pipeline: String,
        /// The deepest failing step.
        step: String,
        /// The captured error trace from that step.
        stack_trace: String,
    },

    /// The external runner could not be spawned or awaited.
    #[error("External runner error: {0}")]
    Runner(String),

    /// IO error (directory/file creation, state record access).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StepflowError {
    /// Creates a step-not-found lookup error.
    #[must_use]
    pub fn step_not_found(name: impl Into<String>, available: Vec<String>) -> Self {
        Self::StepNotFound {
            name: name.into(),
            available,
        }
    }

    /// Creates an artifact-not-supported lookup error.
    #[must_use]
    pub fn artifact_not_supported(name: impl Into<String>, available: Vec<String>) -> Self {
        Self::ArtifactNotSupported {
            name: name.into(),
            available,
        }
    }
}

/// Error raised when step or pipeline configuration is invalid.
///
/// Detected eagerly at step-descriptor construction so that config
/// problems surface before anything executes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required config field is absent.
    #[error("Missing required config field '{field}' for step '{step}'")]
    MissingField {
        /// The step whose config is incomplete.
        step: String,
        /// The missing field.
        field: String,
    },

    /// A config field is present but has an unusable value.
    #[error("Invalid config field '{field}' for step '{step}': {reason}")]
    InvalidField {
        /// The step whose config is invalid.
        step: String,
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The pipeline config is missing its `template` property.
    #[error("The 'template' property must be defined in the pipeline configuration, e.g. 'template: regression/v1'")]
    MissingTemplate,

    /// The pipeline config root is not a mapping.
    #[error("Pipeline configuration must be a mapping")]
    NotAMapping,
}

impl ConfigError {
    /// Creates a missing-field error.
    #[must_use]
    pub fn missing_field(step: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            step: step.into(),
            field: field.into(),
        }
    }

    /// Creates an invalid-field error.
    #[must_use]
    pub fn invalid_field(
        step: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            step: step.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}
