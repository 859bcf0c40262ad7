//! Model registration step.

use crate::config::PipelineConfig;
use crate::core::{StepArtifact, StepClass};
use crate::errors::ConfigError;
use crate::steps::ingest::require_str;
use crate::steps::Step;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Registers the validated model under a model registry name.
#[derive(Debug, Clone)]
pub struct RegisterStep {
    model_name: String,
    allow_non_validated_model: bool,
}

impl RegisterStep {
    /// Constructs the step from the pipeline configuration.
    ///
    /// Requires `steps.register.model_name`;
    /// `steps.register.allow_non_validated_model` defaults to false.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let step_config = config.step_config("register");
        let model_name = require_str(&step_config, "register", "model_name")?;
        let allow_non_validated_model = match step_config.get("allow_non_validated_model") {
            None => false,
            Some(value) => value.as_bool().ok_or_else(|| {
                ConfigError::invalid_field(
                    "register",
                    "allow_non_validated_model",
                    "must be a boolean",
                )
            })?,
        };
        Ok(Self {
            model_name,
            allow_non_validated_model,
        })
    }
}

impl Step for RegisterStep {
    fn name(&self) -> &str {
        "register"
    }

    fn step_class(&self) -> StepClass {
        StepClass::Training
    }

    fn resolved_config(&self) -> Value {
        json!({
            "model_name": self.model_name,
            "allow_non_validated_model": self.allow_non_validated_model,
        })
    }

    fn environment(&self) -> HashMap<String, String> {
        HashMap::from([(
            "STEPFLOW_REGISTER_MODEL_NAME".to_string(),
            self.model_name.clone(),
        )])
    }

    fn artifacts(&self) -> Vec<StepArtifact> {
        vec![StepArtifact::new(
            "registered_model_version",
            "registered_model_version.json",
        )]
    }
}
