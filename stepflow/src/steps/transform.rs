//! Feature transformation step.

use crate::config::PipelineConfig;
use crate::core::{StepArtifact, StepClass};
use crate::errors::ConfigError;
use crate::steps::ingest::require_str;
use crate::steps::Step;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Fits a user-defined transformer on the training split and applies it
/// to the train and validation data.
#[derive(Debug, Clone)]
pub struct TransformStep {
    transformer_method: String,
}

impl TransformStep {
    /// Constructs the step from the pipeline configuration.
    ///
    /// Requires `steps.transform.transformer_method`, the identifier of
    /// the user-supplied transform hook the step command loads.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let step_config = config.step_config("transform");
        let transformer_method = require_str(&step_config, "transform", "transformer_method")?;
        Ok(Self { transformer_method })
    }
}

impl Step for TransformStep {
    fn name(&self) -> &str {
        "transform"
    }

    fn step_class(&self) -> StepClass {
        StepClass::Training
    }

    fn resolved_config(&self) -> Value {
        json!({ "transformer_method": self.transformer_method })
    }

    fn environment(&self) -> HashMap<String, String> {
        HashMap::from([(
            "STEPFLOW_TRANSFORMER_METHOD".to_string(),
            self.transformer_method.clone(),
        )])
    }

    fn artifacts(&self) -> Vec<StepArtifact> {
        vec![
            StepArtifact::new("transformer", "transformer.bin"),
            StepArtifact::new(
                "transformed_training_data",
                "transformed_training_data.parquet",
            ),
            StepArtifact::new(
                "transformed_validation_data",
                "transformed_validation_data.parquet",
            ),
        ]
    }
}
