//! Batch scoring step.

use crate::config::PipelineConfig;
use crate::core::{StepArtifact, StepClass};
use crate::errors::ConfigError;
use crate::steps::Step;
use serde_json::{json, Value};
use std::collections::HashMap;

const SUPPORTED_OUTPUT_FORMATS: [&str; 2] = ["parquet", "csv"];

/// Scores the ingested scoring dataset with the registered model.
#[derive(Debug, Clone)]
pub struct PredictStep {
    output_format: String,
}

impl PredictStep {
    /// Constructs the step from the pipeline configuration.
    ///
    /// `steps.predict.output_format` defaults to `parquet` and must be
    /// one of `parquet`, `csv`.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let step_config = config.step_config("predict");
        let output_format = match step_config.get("output_format") {
            None => "parquet".to_string(),
            Some(value) => {
                let format = value.as_str().ok_or_else(|| {
                    ConfigError::invalid_field("predict", "output_format", "must be a string")
                })?;
                if !SUPPORTED_OUTPUT_FORMATS.contains(&format) {
                    return Err(ConfigError::invalid_field(
                        "predict",
                        "output_format",
                        format!(
                            "'{format}' is not supported; expected one of {}",
                            SUPPORTED_OUTPUT_FORMATS.join(", ")
                        ),
                    ));
                }
                format.to_string()
            }
        };
        Ok(Self { output_format })
    }
}

impl Step for PredictStep {
    fn name(&self) -> &str {
        "predict"
    }

    fn step_class(&self) -> StepClass {
        StepClass::Scoring
    }

    fn resolved_config(&self) -> Value {
        json!({ "output_format": self.output_format })
    }

    fn environment(&self) -> HashMap<String, String> {
        HashMap::from([(
            "STEPFLOW_PREDICT_OUTPUT_FORMAT".to_string(),
            self.output_format.clone(),
        )])
    }

    fn artifacts(&self) -> Vec<StepArtifact> {
        vec![StepArtifact::new("scored_data", "scored_data.parquet")]
    }
}
