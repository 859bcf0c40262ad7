//! Data ingestion steps.
//!
//! Ingestion is defined as never cacheable: re-running an ingest step
//! always re-executes it and invalidates everything downstream, even if
//! the source content is unchanged.

use crate::config::PipelineConfig;
use crate::core::{StepArtifact, StepClass};
use crate::errors::ConfigError;
use crate::steps::Step;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Ingests the training dataset.
#[derive(Debug, Clone)]
pub struct IngestStep {
    using: String,
    location: String,
}

impl IngestStep {
    /// Constructs the step from the pipeline configuration.
    ///
    /// Requires `steps.ingest.using` (the dataset format) and
    /// `steps.ingest.location`.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let step_config = config.step_config("ingest");
        let using = require_str(&step_config, "ingest", "using")?;
        let location = require_str(&step_config, "ingest", "location")?;
        Ok(Self { using, location })
    }
}

impl Step for IngestStep {
    fn name(&self) -> &str {
        "ingest"
    }

    fn step_class(&self) -> StepClass {
        StepClass::Training
    }

    fn resolved_config(&self) -> Value {
        json!({ "using": self.using, "location": self.location })
    }

    fn environment(&self) -> HashMap<String, String> {
        HashMap::from([
            ("STEPFLOW_INGEST_USING".to_string(), self.using.clone()),
            ("STEPFLOW_INGEST_LOCATION".to_string(), self.location.clone()),
        ])
    }

    fn never_cached(&self) -> bool {
        true
    }

    fn artifacts(&self) -> Vec<StepArtifact> {
        vec![StepArtifact::new("ingested_data", "dataset.parquet")]
    }
}

/// Ingests the dataset to be scored (the scoring-path counterpart of
/// [`IngestStep`]).
#[derive(Debug, Clone)]
pub struct IngestScoringStep {
    using: String,
    location: String,
}

impl IngestScoringStep {
    /// Constructs the step from the pipeline configuration.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let step_config = config.step_config("ingest_scoring");
        let using = require_str(&step_config, "ingest_scoring", "using")?;
        let location = require_str(&step_config, "ingest_scoring", "location")?;
        Ok(Self { using, location })
    }
}

impl Step for IngestScoringStep {
    fn name(&self) -> &str {
        "ingest_scoring"
    }

    fn step_class(&self) -> StepClass {
        StepClass::Scoring
    }

    fn resolved_config(&self) -> Value {
        json!({ "using": self.using, "location": self.location })
    }

    fn environment(&self) -> HashMap<String, String> {
        HashMap::from([
            ("STEPFLOW_INGEST_SCORING_USING".to_string(), self.using.clone()),
            (
                "STEPFLOW_INGEST_SCORING_LOCATION".to_string(),
                self.location.clone(),
            ),
        ])
    }

    fn never_cached(&self) -> bool {
        true
    }

    fn artifacts(&self) -> Vec<StepArtifact> {
        vec![StepArtifact::new(
            "ingested_scoring_data",
            "scoring_dataset.parquet",
        )]
    }
}

pub(crate) fn require_str(
    step_config: &serde_json::Map<String, Value>,
    step: &str,
    field: &str,
) -> Result<String, ConfigError> {
    step_config
        .get(field)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| ConfigError::missing_field(step, field))
}
