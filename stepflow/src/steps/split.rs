//! Dataset split step.

use crate::config::PipelineConfig;
use crate::core::{StepArtifact, StepClass};
use crate::errors::ConfigError;
use crate::steps::Step;
use serde_json::{json, Value};

const DEFAULT_SPLIT_RATIOS: [f64; 3] = [0.75, 0.125, 0.125];

/// Splits the ingested dataset into train / validation / test subsets.
///
/// The splitting math itself runs in the external step command; this
/// descriptor validates and carries the resolved ratios.
#[derive(Debug, Clone)]
pub struct SplitStep {
    target_col: String,
    split_ratios: [f64; 3],
}

impl SplitStep {
    /// Constructs the step from the pipeline configuration.
    ///
    /// Requires the pipeline-wide `target_col`; `steps.split.split_ratios`
    /// defaults to `[0.75, 0.125, 0.125]` and must contain exactly three
    /// positive numbers.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let target_col = config
            .get_str("target_col")
            .map(ToString::to_string)
            .ok_or_else(|| ConfigError::missing_field("split", "target_col"))?;

        let step_config = config.step_config("split");
        let split_ratios = match step_config.get("split_ratios") {
            None => DEFAULT_SPLIT_RATIOS,
            Some(value) => parse_split_ratios(value)?,
        };

        Ok(Self {
            target_col,
            split_ratios,
        })
    }

    /// The resolved train / validation / test ratios.
    #[must_use]
    pub fn split_ratios(&self) -> [f64; 3] {
        self.split_ratios
    }
}

fn parse_split_ratios(value: &Value) -> Result<[f64; 3], ConfigError> {
    let invalid = || {
        ConfigError::invalid_field(
            "split",
            "split_ratios",
            "must be a list containing 3 positive numbers",
        )
    };

    let items = value.as_array().ok_or_else(invalid)?;
    if items.len() != 3 {
        return Err(invalid());
    }
    let mut ratios = [0.0; 3];
    for (slot, item) in ratios.iter_mut().zip(items) {
        let ratio = item.as_f64().ok_or_else(invalid)?;
        if ratio <= 0.0 {
            return Err(invalid());
        }
        *slot = ratio;
    }
    Ok(ratios)
}

impl Step for SplitStep {
    fn name(&self) -> &str {
        "split"
    }

    fn step_class(&self) -> StepClass {
        StepClass::Training
    }

    fn resolved_config(&self) -> Value {
        json!({
            "target_col": self.target_col,
            "split_ratios": self.split_ratios,
        })
    }

    fn artifacts(&self) -> Vec<StepArtifact> {
        vec![
            StepArtifact::new("training_data", "train.parquet"),
            StepArtifact::new("validation_data", "validation.parquet"),
            StepArtifact::new("test_data", "test.parquet"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> PipelineConfig {
        PipelineConfig::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let config = config(json!({"template": "regression/v1", "target_col": "C"}));
        let step = SplitStep::from_config(&config).unwrap();
        assert_eq!(step.split_ratios(), DEFAULT_SPLIT_RATIOS);
    }

    #[test]
    fn test_explicit_ratios() {
        let config = config(json!({
            "template": "regression/v1",
            "target_col": "C",
            "steps": {"split": {"split_ratios": [0.5, 0.25, 0.25]}},
        }));
        let step = SplitStep::from_config(&config).unwrap();
        assert_eq!(step.split_ratios(), [0.5, 0.25, 0.25]);
    }

    #[test]
    fn test_missing_target_col() {
        let config = config(json!({"template": "regression/v1"}));
        assert_eq!(
            SplitStep::from_config(&config).unwrap_err(),
            ConfigError::missing_field("split", "target_col")
        );
    }

    #[test]
    fn test_invalid_ratios_rejected() {
        for ratios in [
            json!([0.5, 0.5]),
            json!([0.5, 0.25, "x"]),
            json!([0.5, 0.25, -0.25]),
            json!("not-a-list"),
        ] {
            let config = config(json!({
                "template": "regression/v1",
                "target_col": "C",
                "steps": {"split": {"split_ratios": ratios}},
            }));
            assert!(matches!(
                SplitStep::from_config(&config),
                Err(ConfigError::InvalidField { .. })
            ));
        }
    }

    #[test]
    fn test_resolved_config_reflects_ratios() {
        let config = config(json!({
            "template": "regression/v1",
            "target_col": "C",
            "steps": {"split": {"split_ratios": [0.34, 0.33, 0.33]}},
        }));
        let step = SplitStep::from_config(&config).unwrap();
        let resolved = step.resolved_config();
        assert_eq!(resolved["split_ratios"], json!([0.34, 0.33, 0.33]));
        assert_eq!(resolved["target_col"], json!("C"));
    }
}
