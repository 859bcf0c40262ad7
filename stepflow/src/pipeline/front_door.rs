//! The `Pipeline` type: the public entry point tying configuration,
//! templates, and the execution module together.
//!
//! Every public operation starts by reloading the configuration and
//! rebuilding the step list from it, so config edits take effect
//! immediately and no mutable step state survives between calls.

use crate::config::{ConfigSource, JsonFileConfigSource};
use crate::core::StepClass;
use crate::errors::StepflowError;
use crate::execution::{
    clean_execution_state, clear_step_state, run_step, ExecutionDirectory, ExternalRunner,
    MakeRunner,
};
use crate::pipeline::PipelineTemplate;
use crate::steps::Step;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// The ordered steps sharing the target's classification.
///
/// This is the subgraph one run operates on: a linear chain per
/// classification group. [`StepClass::Unknown`] steps belong to no
/// chain and yield an empty subgraph.
#[must_use]
pub fn subgraph_for_target(steps: &[Arc<dyn Step>], target: &dyn Step) -> Vec<Arc<dyn Step>> {
    if target.step_class() == StepClass::Unknown {
        return Vec::new();
    }
    steps
        .iter()
        .filter(|step| step.step_class() == target.step_class())
        .cloned()
        .collect()
}

/// A configured pipeline bound to one pipeline root directory.
#[derive(Debug)]
pub struct Pipeline {
    name: String,
    pipeline_root: PathBuf,
    config_source: Box<dyn ConfigSource>,
    execution_base: Option<PathBuf>,
    runner: Box<dyn ExternalRunner>,
}

/// Builder for [`Pipeline`].
#[derive(Debug)]
pub struct PipelineBuilder {
    pipeline_root: PathBuf,
    config_source: Option<Box<dyn ConfigSource>>,
    execution_base: Option<PathBuf>,
    runner: Option<Box<dyn ExternalRunner>>,
}

impl PipelineBuilder {
    /// Replaces the default `pipeline.json` config source.
    #[must_use]
    pub fn config_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.config_source = Some(Box::new(source));
        self
    }

    /// Places execution directories under an explicit base instead of
    /// the environment-resolved default.
    #[must_use]
    pub fn execution_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.execution_base = Some(base.into());
        self
    }

    /// Replaces the default make runner.
    #[must_use]
    pub fn runner(mut self, runner: impl ExternalRunner + 'static) -> Self {
        self.runner = Some(Box::new(runner));
        self
    }

    /// Builds the pipeline. Fails if the pipeline root does not exist.
    pub fn build(self) -> Result<Pipeline, StepflowError> {
        if !self.pipeline_root.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!(
                    "pipeline root '{}' is not a directory",
                    self.pipeline_root.display()
                ),
            )
            .into());
        }
        let name = self
            .pipeline_root
            .file_name()
            .map_or_else(|| "pipeline".to_string(), |n| n.to_string_lossy().to_string());
        Ok(Pipeline {
            name,
            config_source: self
                .config_source
                .unwrap_or_else(|| Box::new(JsonFileConfigSource::new(&self.pipeline_root))),
            execution_base: self.execution_base,
            runner: self.runner.unwrap_or_else(|| Box::new(MakeRunner::default())),
            pipeline_root: self.pipeline_root,
        })
    }
}

impl Pipeline {
    /// Starts building a pipeline bound to the given root directory.
    #[must_use]
    pub fn builder(pipeline_root: impl Into<PathBuf>) -> PipelineBuilder {
        PipelineBuilder {
            pipeline_root: pipeline_root.into(),
            config_source: None,
            execution_base: None,
            runner: None,
        }
    }

    /// The pipeline name, derived from the root directory name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pipeline root directory.
    #[must_use]
    pub fn pipeline_root(&self) -> &Path {
        &self.pipeline_root
    }

    /// Runs the target step and its stale upstream dependencies,
    /// defaulting to the template's end-of-training-chain step.
    ///
    /// Returns an error if the step that determined the run's outcome is
    /// recorded as failed; cached steps are reused silently.
    pub async fn run(&self, target: Option<&str>) -> Result<(), StepflowError> {
        let (template, steps) = self.resolve()?;
        let target_name = target.unwrap_or_else(|| template.default_target());
        let target_step = Self::find_step(&steps, target_name)?;
        let subgraph = subgraph_for_target(&steps, target_step.as_ref());
        let execution_dir = self.execution_directory()?;

        info!(
            pipeline = %self.name,
            step = target_name,
            template = %template,
            "Running pipeline step"
        );
        let last = run_step(
            &execution_dir,
            &subgraph,
            &target_step,
            &template,
            self.runner.as_ref(),
        )
        .await?;

        let state =
            last.get_execution_state(&execution_dir.step_output_dir(last.name()))?;
        if state.status.is_failure() {
            let stack_trace = state.stack_trace.unwrap_or_default();
            // An explicit target gets the targeted wording; a
            // whole-pipeline run gets the pipeline-level one.
            return Err(match target {
                Some(target) => StepflowError::StepFailed {
                    pipeline: self.name.clone(),
                    target: target.to_string(),
                    step: last.name().to_string(),
                    stack_trace,
                },
                None => StepflowError::PipelineFailed {
                    pipeline: self.name.clone(),
                    step: last.name().to_string(),
                    stack_trace,
                },
            });
        }
        info!(pipeline = %self.name, step = last.name(), "Pipeline run finished");
        Ok(())
    }

    /// Clears recorded execution state and outputs, for one step or for
    /// every step. Cleaned steps re-execute in full on the next run that
    /// needs them.
    pub fn clean(&self, target: Option<&str>) -> Result<(), StepflowError> {
        let (_, steps) = self.resolve()?;
        let execution_dir = self.execution_directory()?;
        match target {
            Some(name) => {
                let step = Self::find_step(&steps, name)?;
                clear_step_state(&execution_dir, step.name())?;
            }
            None => clean_execution_state(&execution_dir, &steps)?,
        }
        info!(pipeline = %self.name, step = target.unwrap_or("<all>"), "Cleaned execution state");
        Ok(())
    }

    /// Locates a pipeline output artifact by name.
    ///
    /// Returns `Ok(None)` when the artifact is declared but its
    /// producing step has not run yet; an undeclared name is an error
    /// listing the supported artifact names.
    pub fn get_artifact(&self, artifact_name: &str) -> Result<Option<PathBuf>, StepflowError> {
        let (_, steps) = self.resolve()?;
        let execution_dir = self.execution_directory()?;

        let mut available = Vec::new();
        for step in &steps {
            for artifact in step.artifacts() {
                if artifact.name == artifact_name {
                    let path = artifact.resolve(&execution_dir.step_output_dir(step.name()));
                    if path.exists() {
                        return Ok(Some(path));
                    }
                    warn!(
                        artifact = artifact_name,
                        step = step.name(),
                        "Artifact is declared but its step has not produced it yet"
                    );
                    return Ok(None);
                }
                available.push(artifact.name);
            }
        }
        Err(StepflowError::artifact_not_supported(artifact_name, available))
    }

    /// Reloads the configuration and rebuilds the step list from it.
    fn resolve(&self) -> Result<(PipelineTemplate, Vec<Arc<dyn Step>>), StepflowError> {
        let config = self.config_source.load()?;
        let template: PipelineTemplate = config.template()?.parse()?;
        let steps = template.build_steps(&config)?;
        Ok((template, steps))
    }

    fn execution_directory(&self) -> Result<ExecutionDirectory, StepflowError> {
        match &self.execution_base {
            Some(base) => Ok(ExecutionDirectory::with_base(base, &self.pipeline_root)),
            None => ExecutionDirectory::resolve(&self.pipeline_root),
        }
    }

    fn find_step(
        steps: &[Arc<dyn Step>],
        name: &str,
    ) -> Result<Arc<dyn Step>, StepflowError> {
        steps
            .iter()
            .find(|step| step.name() == name)
            .cloned()
            .ok_or_else(|| {
                StepflowError::step_not_found(
                    name,
                    steps.iter().map(|step| step.name().to_string()).collect(),
                )
            })
    }
}
