//! Pipeline configuration access.
//!
//! The engine does not parse any particular config file format itself;
//! it consumes a nested mapping and reads only the pieces it needs:
//! the template identifier, the pipeline-wide fields, and per-step
//! sub-mappings that are passed through opaquely to step constructors.
//!
//! A [`ConfigSource`] is consulted at the start of every public
//! pipeline operation so that config edits take effect without a
//! process restart; the resulting [`PipelineConfig`] is immutable.

use crate::errors::{ConfigError, StepflowError};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// File name read by [`JsonFileConfigSource`].
pub const PIPELINE_CONFIG_FILE_NAME: &str = "pipeline.json";

/// An immutable view over the resolved pipeline configuration mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    root: Map<String, Value>,
}

impl PipelineConfig {
    /// Wraps a resolved configuration value.
    ///
    /// The value must be a mapping at the top level.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(ConfigError::NotAMapping),
        }
    }

    /// Returns the pipeline template identifier.
    pub fn template(&self) -> Result<&str, ConfigError> {
        self.root
            .get("template")
            .and_then(Value::as_str)
            .ok_or(ConfigError::MissingTemplate)
    }

    /// Returns a top-level config field, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Returns a top-level string field, if present.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.root.get(key).and_then(Value::as_str)
    }

    /// Returns the sub-mapping configuring one step.
    ///
    /// A step with no entry under `steps` gets an empty mapping; step
    /// constructors decide which fields are required.
    #[must_use]
    pub fn step_config(&self, step_name: &str) -> Map<String, Value> {
        self.root
            .get("steps")
            .and_then(Value::as_object)
            .and_then(|steps| steps.get(step_name))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}

/// A collaborator that loads the pipeline configuration mapping.
///
/// Implementations own the format (JSON file, in-memory fixture, ...);
/// the engine only sees the resulting mapping.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    /// Loads the current configuration.
    fn load(&self) -> Result<PipelineConfig, StepflowError>;
}

/// Loads `pipeline.json` from the pipeline root directory.
#[derive(Debug, Clone)]
pub struct JsonFileConfigSource {
    path: PathBuf,
}

impl JsonFileConfigSource {
    /// Creates a source reading `<pipeline_root>/pipeline.json`.
    #[must_use]
    pub fn new(pipeline_root: impl AsRef<Path>) -> Self {
        Self {
            path: pipeline_root.as_ref().join(PIPELINE_CONFIG_FILE_NAME),
        }
    }
}

impl ConfigSource for JsonFileConfigSource {
    fn load(&self) -> Result<PipelineConfig, StepflowError> {
        let raw = std::fs::read_to_string(&self.path)?;
        let value: Value = serde_json::from_str(&raw)?;
        Ok(PipelineConfig::from_value(value)?)
    }
}

/// A fixed in-memory configuration, mainly for tests and embedding.
#[derive(Debug, Clone)]
pub struct StaticConfigSource {
    value: Value,
}

impl StaticConfigSource {
    /// Creates a source returning the given value on every load.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl ConfigSource for StaticConfigSource {
    fn load(&self) -> Result<PipelineConfig, StepflowError> {
        Ok(PipelineConfig::from_value(self.value.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_value_rejects_non_mapping() {
        assert_eq!(
            PipelineConfig::from_value(json!([1, 2])).unwrap_err(),
            ConfigError::NotAMapping
        );
    }

    #[test]
    fn test_template_required() {
        let config = PipelineConfig::from_value(json!({})).unwrap();
        assert_eq!(config.template().unwrap_err(), ConfigError::MissingTemplate);

        let config =
            PipelineConfig::from_value(json!({"template": "regression/v1"})).unwrap();
        assert_eq!(config.template().unwrap(), "regression/v1");
    }

    #[test]
    fn test_step_config_lookup() {
        let config = PipelineConfig::from_value(json!({
            "template": "regression/v1",
            "steps": {
                "split": {"split_ratios": [0.5, 0.25, 0.25]},
            },
        }))
        .unwrap();

        let split = config.step_config("split");
        assert_eq!(split.get("split_ratios"), Some(&json!([0.5, 0.25, 0.25])));

        // Unconfigured steps get an empty mapping.
        assert!(config.step_config("train").is_empty());
    }

    #[test]
    fn test_json_file_config_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PIPELINE_CONFIG_FILE_NAME),
            r#"{"template": "regression/v1", "target_col": "price"}"#,
        )
        .unwrap();

        let source = JsonFileConfigSource::new(dir.path());
        let config = source.load().unwrap();
        assert_eq!(config.get_str("target_col"), Some("price"));
    }

    #[test]
    fn test_json_file_config_source_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = JsonFileConfigSource::new(dir.path());
        assert!(matches!(source.load(), Err(StepflowError::Io(_))));
    }
}
