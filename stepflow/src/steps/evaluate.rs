//! Model evaluation step.

use crate::config::PipelineConfig;
use crate::core::{StepArtifact, StepClass};
use crate::errors::ConfigError;
use crate::steps::Step;
use serde_json::{json, Value};

/// One metric threshold the trained model must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationCriterion {
    /// The metric name (e.g. `root_mean_squared_error`).
    pub metric: String,
    /// The threshold the metric is compared against.
    pub threshold: f64,
}

/// Evaluates the trained model against the validation and test splits.
#[derive(Debug, Clone)]
pub struct EvaluateStep {
    validation_criteria: Vec<ValidationCriterion>,
}

impl EvaluateStep {
    /// Constructs the step from the pipeline configuration.
    ///
    /// `steps.evaluate.validation_criteria` is optional; when present,
    /// each entry must provide a `metric` string and a numeric
    /// `threshold`.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let step_config = config.step_config("evaluate");
        let validation_criteria = match step_config.get("validation_criteria") {
            None => Vec::new(),
            Some(value) => parse_criteria(value)?,
        };
        Ok(Self {
            validation_criteria,
        })
    }

    /// The configured validation criteria, possibly empty.
    #[must_use]
    pub fn validation_criteria(&self) -> &[ValidationCriterion] {
        &self.validation_criteria
    }
}

fn parse_criteria(value: &Value) -> Result<Vec<ValidationCriterion>, ConfigError> {
    let invalid = || {
        ConfigError::invalid_field(
            "evaluate",
            "validation_criteria",
            "must be a list of {metric, threshold} entries",
        )
    };

    let entries = value.as_array().ok_or_else(invalid)?;
    entries
        .iter()
        .map(|entry| {
            let metric = entry
                .get("metric")
                .and_then(Value::as_str)
                .ok_or_else(invalid)?;
            let threshold = entry
                .get("threshold")
                .and_then(Value::as_f64)
                .ok_or_else(invalid)?;
            Ok(ValidationCriterion {
                metric: metric.to_string(),
                threshold,
            })
        })
        .collect()
}

impl Step for EvaluateStep {
    fn name(&self) -> &str {
        "evaluate"
    }

    fn step_class(&self) -> StepClass {
        StepClass::Training
    }

    fn resolved_config(&self) -> Value {
        json!({
            "validation_criteria": self
                .validation_criteria
                .iter()
                .map(|c| json!({"metric": c.metric, "threshold": c.threshold}))
                .collect::<Vec<_>>(),
        })
    }

    fn artifacts(&self) -> Vec<StepArtifact> {
        vec![StepArtifact::new(
            "model_validation_status",
            "model_validation_status",
        )]
    }
}
