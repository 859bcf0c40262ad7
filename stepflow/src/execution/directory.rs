//! The persistent per-pipeline execution directory.
//!
//! A pipeline root maps to one stable execution directory, keyed by the
//! pipeline name plus a digest of the root path so distinct pipelines
//! never collide. Every creation stage is independently idempotent:
//! a failure partway through leaves earlier artifacts intact, and the
//! next call completes only what is missing. There is no rollback.

use crate::errors::StepflowError;
use crate::execution::makefile::{render_makefile, MAKEFILE_NAME};
use crate::pipeline::PipelineTemplate;
use crate::steps::Step;
use crate::utils::path_digest;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Environment variable overriding the base directory under which
/// execution directories are created.
pub const EXECUTION_DIR_ENV_VAR: &str = "STEPFLOW_EXECUTION_DIRECTORY";

/// File name of a step's persisted config snapshot inside the execution
/// directory. The generated Makefile makes each step's rule depend on
/// it, so a config change marks the step and everything after it stale.
const STEP_CONF_FILE_NAME: &str = "conf.json";

/// Manages the on-disk execution layout for one pipeline root.
#[derive(Debug, Clone)]
pub struct ExecutionDirectory {
    pipeline_root: PathBuf,
    execution_dir: PathBuf,
}

impl ExecutionDirectory {
    /// Resolves the execution directory for a pipeline root.
    ///
    /// The base directory is taken from [`EXECUTION_DIR_ENV_VAR`] if
    /// set, otherwise `$HOME/.stepflow/executions`.
    pub fn resolve(pipeline_root: impl AsRef<Path>) -> Result<Self, StepflowError> {
        let base = match std::env::var_os(EXECUTION_DIR_ENV_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = std::env::var_os("HOME").ok_or_else(|| {
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "HOME is not set and no execution directory override was provided",
                    )
                })?;
                PathBuf::from(home).join(".stepflow").join("executions")
            }
        };
        Ok(Self::with_base(base, pipeline_root))
    }

    /// Resolves the execution directory under an explicit base
    /// directory.
    #[must_use]
    pub fn with_base(base: impl AsRef<Path>, pipeline_root: impl AsRef<Path>) -> Self {
        let pipeline_root = pipeline_root.as_ref().to_path_buf();
        let canonical = std::fs::canonicalize(&pipeline_root)
            .unwrap_or_else(|_| pipeline_root.clone());
        let name = pipeline_root
            .file_name()
            .map_or_else(|| "pipeline".to_string(), |n| n.to_string_lossy().to_string());
        let execution_dir = base
            .as_ref()
            .join(format!("{name}_{}", path_digest(&canonical)));
        Self {
            pipeline_root,
            execution_dir,
        }
    }

    /// The pipeline root this directory belongs to.
    #[must_use]
    pub fn pipeline_root(&self) -> &Path {
        &self.pipeline_root
    }

    /// The execution directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.execution_dir
    }

    /// The output directory of one step.
    #[must_use]
    pub fn step_output_dir(&self, step_name: &str) -> PathBuf {
        self.execution_dir
            .join("steps")
            .join(step_name)
            .join("outputs")
    }

    /// A path inside one step's output directory.
    #[must_use]
    pub fn step_output_path(&self, step_name: &str, relative_path: &str) -> PathBuf {
        self.step_output_dir(step_name).join(relative_path)
    }

    /// Ensures the execution layout exists and is current.
    ///
    /// Creates the directory, the user-editable step stub files under
    /// the pipeline root, regenerates the build description, persists
    /// each step's config snapshot (rewritten only on change, so
    /// unchanged configs keep their modification time), and creates
    /// per-step output directories. Each stage is independently
    /// idempotent; on error the partial state is left in place for the
    /// next call to complete.
    pub fn ensure(
        &self,
        steps: &[Arc<dyn Step>],
        template: &PipelineTemplate,
    ) -> Result<(), StepflowError> {
        std::fs::create_dir_all(&self.execution_dir)?;
        self.create_step_stub_files(template)?;
        self.write_makefile(steps)?;
        for step in steps {
            self.write_step_conf(step.as_ref())?;
            std::fs::create_dir_all(self.step_output_dir(step.name()))?;
        }
        debug!(execution_dir = %self.execution_dir.display(), "Execution directory ready");
        Ok(())
    }

    /// Creates any missing user-editable step stub files under
    /// `<pipeline_root>/steps/`. Existing stubs are never overwritten.
    fn create_step_stub_files(&self, template: &PipelineTemplate) -> Result<(), StepflowError> {
        let steps_dir = self.pipeline_root.join("steps");
        std::fs::create_dir_all(&steps_dir)?;
        for stub in template.required_step_files() {
            let path = steps_dir.join(format!("{stub}.sh"));
            if !path.exists() {
                std::fs::write(
                    &path,
                    format!(
                        "#!/bin/sh\n# User hook for the {stub} step.\n\
                         # Invoked by the step runner with the pipeline environment set.\n"
                    ),
                )?;
                debug!(stub = %path.display(), "Created step stub file");
            }
        }
        Ok(())
    }

    /// Regenerates the build description. Always rewritten so step-list
    /// or chain changes take effect; no rule depends on it.
    fn write_makefile(&self, steps: &[Arc<dyn Step>]) -> Result<(), StepflowError> {
        let makefile = render_makefile(steps);
        std::fs::write(self.execution_dir.join(MAKEFILE_NAME), makefile)?;
        Ok(())
    }

    /// Persists a step's resolved config snapshot, rewriting the file
    /// only when the content changed.
    fn write_step_conf(&self, step: &dyn Step) -> Result<(), StepflowError> {
        let step_dir = self.execution_dir.join("steps").join(step.name());
        std::fs::create_dir_all(&step_dir)?;
        let path = step_dir.join(STEP_CONF_FILE_NAME);
        let rendered = serde_json::to_string_pretty(&step.resolved_config())?;
        let current = std::fs::read_to_string(&path).ok();
        if current.as_deref() != Some(rendered.as_str()) {
            std::fs::write(&path, rendered)?;
            debug!(step = step.name(), "Step config snapshot updated");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StepClass;
    use crate::steps::test_support::FakeStep;
    use std::sync::Arc;

    fn fake_steps() -> Vec<Arc<dyn Step>> {
        vec![
            Arc::new(FakeStep::new("ingest", StepClass::Training)),
            Arc::new(FakeStep::new("split", StepClass::Training)),
        ]
    }

    #[test]
    fn test_with_base_is_stable_and_collision_free() {
        let base = tempfile::tempdir().unwrap();
        let root_a = tempfile::tempdir().unwrap();
        let root_b = tempfile::tempdir().unwrap();

        let dir_a1 = ExecutionDirectory::with_base(base.path(), root_a.path());
        let dir_a2 = ExecutionDirectory::with_base(base.path(), root_a.path());
        let dir_b = ExecutionDirectory::with_base(base.path(), root_b.path());

        assert_eq!(dir_a1.path(), dir_a2.path());
        assert_ne!(dir_a1.path(), dir_b.path());
    }

    #[test]
    fn test_ensure_creates_expected_layout() {
        let base = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let dir = ExecutionDirectory::with_base(base.path(), root.path());

        dir.ensure(&fake_steps(), &PipelineTemplate::RegressionV1)
            .unwrap();

        assert!(dir.path().join(MAKEFILE_NAME).exists());
        assert!(dir.step_output_dir("ingest").exists());
        assert!(dir.step_output_dir("split").exists());
        assert!(dir.path().join("steps/split").join("conf.json").exists());
        for stub in PipelineTemplate::RegressionV1.required_step_files() {
            assert!(root.path().join("steps").join(format!("{stub}.sh")).exists());
        }
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let base = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let dir = ExecutionDirectory::with_base(base.path(), root.path());

        dir.ensure(&fake_steps(), &PipelineTemplate::RegressionV1)
            .unwrap();
        dir.ensure(&fake_steps(), &PipelineTemplate::RegressionV1)
            .unwrap();

        assert!(dir.path().join(MAKEFILE_NAME).exists());
        assert!(dir.step_output_dir("ingest").exists());
    }

    #[test]
    fn test_ensure_does_not_overwrite_existing_stub() {
        let base = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let dir = ExecutionDirectory::with_base(base.path(), root.path());

        let stub = root.path().join("steps").join("transform.sh");
        std::fs::create_dir_all(root.path().join("steps")).unwrap();
        std::fs::write(&stub, "user content").unwrap();

        dir.ensure(&fake_steps(), &PipelineTemplate::RegressionV1)
            .unwrap();

        assert_eq!(std::fs::read_to_string(&stub).unwrap(), "user content");
    }

    #[test]
    fn test_conf_snapshot_rewritten_only_on_change() {
        let base = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let dir = ExecutionDirectory::with_base(base.path(), root.path());

        dir.ensure(&fake_steps(), &PipelineTemplate::RegressionV1)
            .unwrap();
        let conf = dir.path().join("steps/split/conf.json");
        let mtime_1 = std::fs::metadata(&conf).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        dir.ensure(&fake_steps(), &PipelineTemplate::RegressionV1)
            .unwrap();
        let mtime_2 = std::fs::metadata(&conf).unwrap().modified().unwrap();
        assert_eq!(mtime_1, mtime_2);
    }

    #[test]
    fn test_partial_failure_resumes() {
        let base = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let dir = ExecutionDirectory::with_base(base.path(), root.path());

        // Simulate a failure after the Makefile stage by creating the
        // layout manually up to that point, then verify a full ensure()
        // completes the missing pieces without touching what exists.
        std::fs::create_dir_all(dir.path()).unwrap();
        std::fs::write(dir.path().join(MAKEFILE_NAME), "stale").unwrap();
        assert!(!dir.step_output_dir("ingest").exists());

        dir.ensure(&fake_steps(), &PipelineTemplate::RegressionV1)
            .unwrap();

        assert!(dir.step_output_dir("ingest").exists());
        assert!(dir.step_output_dir("split").exists());
        // The Makefile is regenerated on every call.
        let makefile = std::fs::read_to_string(dir.path().join(MAKEFILE_NAME)).unwrap();
        assert_ne!(makefile, "stale");
    }
}
