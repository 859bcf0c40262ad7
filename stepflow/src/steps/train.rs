//! Model training step.

use crate::config::PipelineConfig;
use crate::core::{StepArtifact, StepClass};
use crate::errors::ConfigError;
use crate::steps::ingest::require_str;
use crate::steps::Step;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Trains the estimator on the transformed training data.
#[derive(Debug, Clone)]
pub struct TrainStep {
    estimator_method: String,
}

impl TrainStep {
    /// Constructs the step from the pipeline configuration.
    ///
    /// Requires `steps.train.estimator_method`, the identifier of the
    /// user-supplied estimator hook the step command loads.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let step_config = config.step_config("train");
        let estimator_method = require_str(&step_config, "train", "estimator_method")?;
        Ok(Self { estimator_method })
    }
}

impl Step for TrainStep {
    fn name(&self) -> &str {
        "train"
    }

    fn step_class(&self) -> StepClass {
        StepClass::Training
    }

    fn resolved_config(&self) -> Value {
        json!({ "estimator_method": self.estimator_method })
    }

    fn environment(&self) -> HashMap<String, String> {
        HashMap::from([(
            "STEPFLOW_ESTIMATOR_METHOD".to_string(),
            self.estimator_method.clone(),
        )])
    }

    fn artifacts(&self) -> Vec<StepArtifact> {
        vec![
            StepArtifact::new("model", "model/model.bin"),
            StepArtifact::new(
                "predicted_training_data",
                "predicted_training_data.parquet",
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_config() {
        let config = PipelineConfig::from_value(json!({
            "template": "regression/v1",
            "steps": {"train": {"estimator_method": "steps.train.estimator_fn"}},
        }))
        .unwrap();
        let step = TrainStep::from_config(&config).unwrap();

        assert_eq!(step.name(), "train");
        assert!(!step.never_cached());
        assert_eq!(step.artifacts().len(), 2);
    }

    #[test]
    fn test_missing_method_is_config_error() {
        let config =
            PipelineConfig::from_value(json!({"template": "regression/v1"})).unwrap();
        assert_eq!(
            TrainStep::from_config(&config).unwrap_err(),
            ConfigError::missing_field("train", "estimator_method")
        );
    }
}
