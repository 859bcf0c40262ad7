//! On-disk pipeline fixtures.

use serde_json::{json, Value};
use std::io;
use std::path::{Path, PathBuf};

/// Builds a pipeline root directory with a `pipeline.json` and optional
/// step-runner scripts, for tests that exercise the full on-disk flow.
#[derive(Debug)]
pub struct PipelineFixture {
    pipeline_root: PathBuf,
}

impl PipelineFixture {
    /// Writes `pipeline.json` with the given configuration into the
    /// directory and wraps it as a fixture.
    pub fn write(pipeline_root: impl AsRef<Path>, config: &Value) -> io::Result<Self> {
        let pipeline_root = pipeline_root.as_ref().to_path_buf();
        std::fs::create_dir_all(&pipeline_root)?;
        std::fs::write(
            pipeline_root.join("pipeline.json"),
            serde_json::to_string_pretty(config)?,
        )?;
        Ok(Self { pipeline_root })
    }

    /// A complete, valid `regression/v1` configuration.
    #[must_use]
    pub fn regression_config() -> Value {
        json!({
            "template": "regression/v1",
            "target_col": "price",
            "steps": {
                "ingest": {"using": "parquet", "location": "/data/train.parquet"},
                "split": {"split_ratios": [0.75, 0.125, 0.125]},
                "transform": {"transformer_method": "transform_features"},
                "train": {"estimator_method": "estimator_fn"},
                "evaluate": {
                    "validation_criteria": [{"metric": "rmse", "threshold": 10.0}],
                },
                "register": {"model_name": "demo_model"},
                "ingest_scoring": {"using": "parquet", "location": "/data/score.parquet"},
                "predict": {"output_format": "parquet"},
            },
        })
    }

    /// The pipeline root directory.
    #[must_use]
    pub fn pipeline_root(&self) -> &Path {
        &self.pipeline_root
    }

    /// Writes an executable shell script under the pipeline root and
    /// returns its absolute path. Used to substitute the per-step
    /// command (`RUN_STEP`) in end-to-end tests.
    pub fn write_script(&self, file_name: &str, body: &str) -> io::Result<PathBuf> {
        let path = self.pipeline_root.join(file_name);
        std::fs::write(&path, body)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
        }
        Ok(path)
    }
}
