//! Named step artifacts.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A named artifact a step produces in its output directory.
///
/// Artifacts are how callers locate pipeline outputs by name without
/// knowing which step produced them or where it writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepArtifact {
    /// The artifact name, unique across the pipeline.
    pub name: String,

    /// Path of the artifact relative to the producing step's output
    /// directory.
    pub relative_path: String,
}

impl StepArtifact {
    /// Creates a new artifact declaration.
    #[must_use]
    pub fn new(name: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relative_path: relative_path.into(),
        }
    }

    /// Resolves the artifact's absolute path under a step output directory.
    #[must_use]
    pub fn resolve(&self, step_output_dir: &Path) -> PathBuf {
        step_output_dir.join(&self.relative_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_resolve() {
        let artifact = StepArtifact::new("training_data", "train.parquet");
        let resolved = artifact.resolve(Path::new("/exec/steps/split/outputs"));
        assert_eq!(
            resolved,
            PathBuf::from("/exec/steps/split/outputs/train.parquet")
        );
    }

    #[test]
    fn test_artifact_serialization() {
        let artifact = StepArtifact::new("model", "model.bin");
        let json = serde_json::to_string(&artifact).unwrap();
        let back: StepArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(artifact, back);
    }
}
