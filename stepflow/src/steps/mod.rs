//! Step descriptors.
//!
//! A step is one named unit of the pipeline. The engine never runs a
//! step's business logic in-process; that belongs to the external
//! runner's per-step command. A descriptor only carries what the
//! orchestrator needs: the step's name, its classification (which
//! dependency chain it belongs to), the resolved configuration snapshot
//! used for change detection, declared environment variables, and
//! declared output artifacts.
//!
//! Descriptors are reconstructed fresh from the current configuration at
//! the start of every public pipeline operation; they are never cached
//! across calls.

mod evaluate;
mod ingest;
mod predict;
mod register;
mod split;
mod train;
mod transform;

pub use evaluate::EvaluateStep;
pub use ingest::{IngestScoringStep, IngestStep};
pub use predict::PredictStep;
pub use register::RegisterStep;
pub use split::SplitStep;
pub use train::TrainStep;
pub use transform::TransformStep;

use crate::core::{ExecutionState, StepArtifact, StepClass};
use crate::errors::StepflowError;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;

/// Trait for pipeline steps.
///
/// Construction is a pure function of the resolved configuration: the
/// same config yields an equivalent descriptor, and constructors have no
/// side effects. Execution state is mutated by the orchestration driver,
/// never by the descriptor itself.
pub trait Step: Send + Sync + Debug {
    /// Returns the unique name of the step within its pipeline.
    fn name(&self) -> &str;

    /// Returns the step's classification.
    ///
    /// Steps of equal classification form one linear dependency chain;
    /// [`StepClass::Unknown`] steps belong to no chain.
    fn step_class(&self) -> StepClass;

    /// Returns the resolved configuration snapshot for this step.
    ///
    /// The snapshot (with defaults applied) is persisted into the
    /// execution directory; a change between runs marks the step and
    /// everything downstream of it stale.
    fn resolved_config(&self) -> serde_json::Value;

    /// Environment variables this step contributes to the runner
    /// invocation. The driver merges all subgraph steps' environments
    /// into one map.
    fn environment(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    /// Whether this step must re-execute on every run that targets it.
    ///
    /// Ingest-class steps return true: ingestion is defined as never
    /// cacheable, even when its output would be byte-identical.
    fn never_cached(&self) -> bool {
        false
    }

    /// The artifacts this step writes into its output directory.
    fn artifacts(&self) -> Vec<StepArtifact> {
        Vec::new()
    }

    /// Reads this step's persisted execution state from its output
    /// directory, returning the invariant default if no record exists.
    fn get_execution_state(&self, output_dir: &Path) -> Result<ExecutionState, StepflowError> {
        ExecutionState::load(output_dir)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{Step, StepClass};
    use std::collections::HashMap;

    /// A minimal configurable step for orchestrator tests.
    #[derive(Debug, Clone)]
    pub struct FakeStep {
        name: String,
        class: StepClass,
        environment: HashMap<String, String>,
        never_cached: bool,
        config: Option<serde_json::Value>,
    }

    impl FakeStep {
        pub fn new(name: impl Into<String>, class: StepClass) -> Self {
            Self {
                name: name.into(),
                class,
                environment: HashMap::new(),
                never_cached: false,
                config: None,
            }
        }

        pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
            self.environment.insert(key.into(), value.into());
            self
        }

        pub fn with_never_cached(mut self, never_cached: bool) -> Self {
            self.never_cached = never_cached;
            self
        }

        pub fn with_config(mut self, config: serde_json::Value) -> Self {
            self.config = Some(config);
            self
        }
    }

    impl Step for FakeStep {
        fn name(&self) -> &str {
            &self.name
        }

        fn step_class(&self) -> StepClass {
            self.class
        }

        fn resolved_config(&self) -> serde_json::Value {
            self.config
                .clone()
                .unwrap_or_else(|| serde_json::json!({ "name": self.name }))
        }

        fn environment(&self) -> HashMap<String, String> {
            self.environment.clone()
        }

        fn never_cached(&self) -> bool {
            self.never_cached
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::FakeStep;
    use super::*;

    #[test]
    fn test_default_trait_methods() {
        let step = FakeStep::new("noop", StepClass::Training);
        assert!(step.environment().is_empty());
        assert!(!step.never_cached());
        assert!(step.artifacts().is_empty());
    }

    #[test]
    fn test_get_execution_state_default_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let step = FakeStep::new("noop", StepClass::Training);
        let state = step.get_execution_state(dir.path()).unwrap();
        assert_eq!(state, ExecutionState::default());
    }
}
