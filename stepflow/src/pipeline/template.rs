//! The closed registry of pipeline templates.
//!
//! A template fixes the ordered step sequence and which user-editable
//! step files a pipeline root is expected to carry. Templates are a
//! closed enum: an unrecognized identifier is rejected at parse time
//! with the list of known identifiers, instead of being resolved
//! dynamically at run time.

use crate::config::PipelineConfig;
use crate::errors::StepflowError;
use crate::steps::{
    EvaluateStep, IngestScoringStep, IngestStep, PredictStep, RegisterStep, SplitStep, Step,
    TrainStep, TransformStep,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A registered pipeline template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineTemplate {
    /// The `regression/v1` template.
    RegressionV1,
    /// The `classification/v1` template.
    ClassificationV1,
}

impl PipelineTemplate {
    /// All registered templates.
    pub const ALL: [Self; 2] = [Self::RegressionV1, Self::ClassificationV1];

    /// The template's configuration identifier.
    #[must_use]
    pub fn identifier(self) -> &'static str {
        match self {
            Self::RegressionV1 => "regression/v1",
            Self::ClassificationV1 => "classification/v1",
        }
    }

    /// The step run when no explicit target is given: the end of the
    /// training chain.
    #[must_use]
    pub fn default_target(self) -> &'static str {
        "register"
    }

    /// The user-editable step files expected under
    /// `<pipeline_root>/steps/` (without extension). Missing ones are
    /// stubbed out on the first run; existing ones are left alone.
    #[must_use]
    pub fn required_step_files(self) -> &'static [&'static str] {
        &["ingest", "split", "transform", "train", "custom_metrics"]
    }

    /// Constructs the template's ordered step sequence from the current
    /// configuration. Both templates share the orchestration shape; they
    /// differ in what the per-step commands compute, which is outside
    /// the engine.
    pub fn build_steps(
        self,
        config: &PipelineConfig,
    ) -> Result<Vec<Arc<dyn Step>>, StepflowError> {
        Ok(vec![
            Arc::new(IngestStep::from_config(config)?),
            Arc::new(SplitStep::from_config(config)?),
            Arc::new(TransformStep::from_config(config)?),
            Arc::new(TrainStep::from_config(config)?),
            Arc::new(EvaluateStep::from_config(config)?),
            Arc::new(RegisterStep::from_config(config)?),
            Arc::new(IngestScoringStep::from_config(config)?),
            Arc::new(PredictStep::from_config(config)?),
        ])
    }
}

impl fmt::Display for PipelineTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl FromStr for PipelineTemplate {
    type Err = StepflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|template| template.identifier() == s)
            .ok_or_else(|| StepflowError::UnknownTemplate {
                name: s.to_string(),
                known: Self::ALL
                    .into_iter()
                    .map(|template| template.identifier().to_string())
                    .collect(),
            })
    }
}
