//! Persisted per-step execution state.
//!
//! One small JSON record lives in each step's output directory. Absence
//! of the record means the step has never run (or was invalidated):
//! status UNKNOWN, timestamp 0, no stack trace.

use crate::core::StepStatus;
use crate::errors::StepflowError;
use crate::utils::now_epoch_seconds;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the state record inside a step's output directory.
pub const EXECUTION_STATE_FILE_NAME: &str = "execution_state.json";

/// The durable execution state of one step's most recent attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionState {
    /// The recorded status.
    pub status: StepStatus,

    /// Epoch seconds of the last state mutation; 0 means never run.
    pub last_updated_timestamp: i64,

    /// Captured error trace; present only when the status is FAILED.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl ExecutionState {
    /// Creates a SUCCEEDED state stamped with the current time.
    #[must_use]
    pub fn succeeded() -> Self {
        Self {
            status: StepStatus::Succeeded,
            last_updated_timestamp: now_epoch_seconds(),
            stack_trace: None,
        }
    }

    /// Creates a FAILED state stamped with the current time.
    #[must_use]
    pub fn failed(stack_trace: impl Into<String>) -> Self {
        Self {
            status: StepStatus::Failed,
            last_updated_timestamp: now_epoch_seconds(),
            stack_trace: Some(stack_trace.into()),
        }
    }

    /// Loads the state record from a step's output directory.
    ///
    /// A missing record yields the invariant default
    /// (UNKNOWN / 0 / no trace); a corrupt record is an error.
    pub fn load(output_dir: &Path) -> Result<Self, StepflowError> {
        let path = output_dir.join(EXECUTION_STATE_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Writes the state record into a step's output directory,
    /// creating the directory if needed.
    pub fn write(&self, output_dir: &Path) -> Result<(), StepflowError> {
        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(EXECUTION_STATE_FILE_NAME);
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// Removes the state record, if present.
    pub fn clear(output_dir: &Path) -> Result<(), StepflowError> {
        let path = output_dir.join(EXECUTION_STATE_FILE_NAME);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}
