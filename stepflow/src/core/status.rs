//! Step status and classification enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The classification of a step.
///
/// Classification partitions the full ordered step list into disjoint
/// dependency chains: step `i` depends on every earlier step of the same
/// classification. Steps classified [`StepClass::Unknown`] participate in
/// no subgraph and are run in isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepClass {
    /// A step on the model training path.
    Training,
    /// A step on the batch scoring path.
    Scoring,
    /// A step that is not part of any dependency chain.
    Unknown,
}

impl Default for StepClass {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for StepClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Training => write!(f, "training"),
            Self::Scoring => write!(f, "scoring"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// The recorded execution status of a step's most recent attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The step has never run, or its state was invalidated.
    Unknown,
    /// The step's last execution succeeded; its outputs are on disk.
    Succeeded,
    /// The step's last execution failed; a stack trace was captured.
    Failed,
}

impl Default for StepStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl StepStatus {
    /// Returns true if the status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Returns true if the status indicates failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }
}
