//! External runner invocation and the orchestration driver.
//!
//! The driver composes the rest of the execution module: it ensures the
//! execution directory, invokes the build tool scoped to the target
//! step's rule, classifies the output, records per-step execution
//! state, and reconciles downstream state. A non-zero runner exit is
//! not an error at this layer; it is recorded as FAILED state and the
//! caller decides whether to raise.

use crate::core::ExecutionState;
use crate::errors::StepflowError;
use crate::execution::directory::ExecutionDirectory;
use crate::execution::invalidation::{clear_step_state, invalidate_downstream};
use crate::execution::plan::{ExecutionPlan, MakeOutputAdapter, RunnerOutputAdapter};
use crate::pipeline::PipelineTemplate;
use crate::steps::Step;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, info, warn};

/// Reserved environment variable naming the target step, so the
/// external tool can report progress per step.
pub const TARGET_STEP_ENV_VAR: &str = "STEPFLOW_TARGET_STEP_NAME";

/// Environment variable carrying the pipeline root to step commands.
pub const PIPELINE_ROOT_ENV_VAR: &str = "STEPFLOW_PIPELINE_ROOT";

/// Number of trailing output lines captured as a failing step's trace.
const FAILURE_TRACE_LINES: usize = 40;

/// One runner invocation: which rule to build, where, and with what
/// environment.
#[derive(Debug, Clone)]
pub struct RunnerRequest {
    /// Working directory for the invocation (the execution directory).
    pub execution_dir: PathBuf,
    /// The rule to build; equal to the target step's name.
    pub rule: String,
    /// Environment variables merged into the subprocess environment.
    pub environment: HashMap<String, String>,
}

/// The observed result of one runner invocation.
#[derive(Debug, Clone)]
pub struct RunnerOutcome {
    /// The process exit code; `None` if terminated by a signal.
    pub exit_code: Option<i32>,
    /// The combined output lines, consumed incrementally as produced.
    pub lines: Vec<String>,
}

impl RunnerOutcome {
    /// Returns true if the runner exited cleanly.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// The trailing output lines, used as a failing step's trace.
    #[must_use]
    pub fn trace_tail(&self) -> String {
        let skip = self.lines.len().saturating_sub(FAILURE_TRACE_LINES);
        self.lines[skip..].join("\n")
    }
}

/// An external build-style tool that executes step rules.
#[async_trait]
pub trait ExternalRunner: Send + Sync + std::fmt::Debug {
    /// Runs the requested rule to completion, consuming output
    /// incrementally. Only a failure to spawn or await the process is
    /// an error; a non-zero exit is a normal outcome.
    async fn run(&self, request: RunnerRequest) -> Result<RunnerOutcome, StepflowError>;

    /// The adapter matching this runner's output signal shapes.
    fn output_adapter(&self) -> &dyn RunnerOutputAdapter;
}

/// Invokes GNU make on the generated build description.
#[derive(Debug, Clone)]
pub struct MakeRunner {
    program: String,
    adapter: MakeOutputAdapter,
}

impl MakeRunner {
    /// Creates a runner invoking the given make program.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            adapter: MakeOutputAdapter::new(),
        }
    }
}

impl Default for MakeRunner {
    fn default() -> Self {
        Self::new("make")
    }
}

async fn collect_lines<R: AsyncRead + Unpin>(reader: R) -> Result<Vec<String>, std::io::Error> {
    let mut lines = BufReader::new(reader).lines();
    let mut collected = Vec::new();
    while let Some(line) = lines.next_line().await? {
        debug!(runner_output = %line);
        collected.push(line);
    }
    Ok(collected)
}

#[async_trait]
impl ExternalRunner for MakeRunner {
    async fn run(&self, request: RunnerRequest) -> Result<RunnerOutcome, StepflowError> {
        let mut child = tokio::process::Command::new(&self.program)
            .arg(&request.rule)
            .current_dir(&request.execution_dir)
            .envs(&request.environment)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                StepflowError::Runner(format!(
                    "failed to spawn '{} {}': {err}",
                    self.program, request.rule
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| StepflowError::Runner("runner stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| StepflowError::Runner("runner stderr was not captured".to_string()))?;

        // Both streams are drained while the process runs so it cannot
        // block on a full pipe; lines are appended stdout first, then
        // stderr.
        let stderr_task = tokio::spawn(collect_lines(stderr));
        let mut lines = collect_lines(stdout).await?;
        let status = child.wait().await?;
        let stderr_lines = stderr_task
            .await
            .map_err(|err| StepflowError::Runner(format!("runner output task failed: {err}")))??;
        lines.extend(stderr_lines);

        Ok(RunnerOutcome {
            exit_code: status.code(),
            lines,
        })
    }

    fn output_adapter(&self) -> &dyn RunnerOutputAdapter {
        &self.adapter
    }
}

/// Runs the target step and its stale upstream dependencies.
///
/// `subgraph` is the ordered chain of steps sharing the target's
/// classification. Returns the step whose execution determines
/// pass/fail: the last freshly-executed step, or the target itself when
/// everything was served from cache (or the subgraph is empty, which is
/// a no-op for steps outside any chain).
pub async fn run_step(
    execution_dir: &ExecutionDirectory,
    subgraph: &[Arc<dyn Step>],
    target_step: &Arc<dyn Step>,
    template: &PipelineTemplate,
    runner: &dyn ExternalRunner,
) -> Result<Arc<dyn Step>, StepflowError> {
    if subgraph.is_empty() {
        debug!(step = target_step.name(), "Step belongs to no subgraph; nothing to run");
        return Ok(Arc::clone(target_step));
    }

    execution_dir.ensure(subgraph, template)?;

    // Ingestion is never cacheable: clearing the target's own state
    // forces the build tool to re-execute it.
    if target_step.never_cached() {
        clear_step_state(execution_dir, target_step.name())?;
    }

    let mut environment: HashMap<String, String> = HashMap::new();
    for step in subgraph {
        environment.extend(step.environment());
    }
    environment.insert(
        TARGET_STEP_ENV_VAR.to_string(),
        target_step.name().to_string(),
    );
    environment.insert(
        PIPELINE_ROOT_ENV_VAR.to_string(),
        execution_dir.pipeline_root().to_string_lossy().to_string(),
    );

    info!(
        step = target_step.name(),
        subgraph_len = subgraph.len(),
        "Invoking external runner"
    );
    let outcome = runner
        .run(RunnerRequest {
            execution_dir: execution_dir.path().to_path_buf(),
            rule: target_step.name().to_string(),
            environment,
        })
        .await?;

    let subgraph_names: Vec<String> = subgraph.iter().map(|s| s.name().to_string()).collect();
    let plan = ExecutionPlan::new(
        target_step.name(),
        &outcome.lines,
        &subgraph_names,
        runner.output_adapter(),
    );
    debug!(cached = ?plan.steps_cached, executed = ?plan.steps_executed, "Execution plan");

    let executed: Vec<&Arc<dyn Step>> = plan
        .steps_executed
        .iter()
        .filter_map(|name| subgraph.iter().find(|s| s.name() == name.as_str()))
        .collect();

    // A non-zero exit with no step-start marker means the build tool
    // failed before reaching any step command (a missing rule, a
    // corrupted execution directory). Attribute the failure to the
    // target so the caller does not mistake it for a cache hit.
    if executed.is_empty() && !outcome.success() {
        warn!(step = target_step.name(), "Runner failed before any step started");
        ExecutionState::failed(outcome.trace_tail())
            .write(&execution_dir.step_output_dir(target_step.name()))?;
        return Ok(Arc::clone(target_step));
    }

    // Record state for freshly-executed steps. The build tool stops at
    // the first failure, so on a non-zero exit the last step it started
    // is the one that failed. Every step recorded here is protected
    // from the invalidation sweep below.
    let mut protected: HashSet<String> = HashSet::new();
    for (index, step) in executed.iter().enumerate() {
        let is_last = index + 1 == executed.len();
        let state = if is_last && !outcome.success() {
            warn!(step = step.name(), "Step failed");
            ExecutionState::failed(outcome.trace_tail())
        } else {
            ExecutionState::succeeded()
        };
        state.write(&execution_dir.step_output_dir(step.name()))?;
        protected.insert(step.name().to_string());
    }

    for step in &executed {
        invalidate_downstream(execution_dir, subgraph, step.as_ref(), &protected)?;
    }

    Ok(executed
        .last()
        .map_or_else(|| Arc::clone(target_step), |step| Arc::clone(step)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{StepClass, StepStatus};
    use crate::steps::test_support::FakeStep;
    use crate::testing::ScriptedRunner;
    use pretty_assertions::assert_eq;

    fn chain(names: &[&str]) -> Vec<Arc<dyn Step>> {
        names
            .iter()
            .map(|name| Arc::new(FakeStep::new(*name, StepClass::Training)) as Arc<dyn Step>)
            .collect()
    }

    fn execution_dir() -> (tempfile::TempDir, tempfile::TempDir, ExecutionDirectory) {
        let base = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let dir = ExecutionDirectory::with_base(base.path(), root.path());
        (base, root, dir)
    }

    fn state_of(dir: &ExecutionDirectory, step: &str) -> ExecutionState {
        ExecutionState::load(&dir.step_output_dir(step)).unwrap()
    }

    #[tokio::test]
    async fn test_empty_subgraph_is_noop() {
        let (_base, _root, dir) = execution_dir();
        let target: Arc<dyn Step> = Arc::new(FakeStep::new("lonely", StepClass::Unknown));
        let runner = ScriptedRunner::succeeding(&[]);

        let result = run_step(&dir, &[], &target, &PipelineTemplate::RegressionV1, &runner)
            .await
            .unwrap();

        assert_eq!(result.name(), "lonely");
        assert!(!dir.path().exists());
    }

    #[tokio::test]
    async fn test_executed_steps_are_marked_succeeded() {
        let (_base, _root, dir) = execution_dir();
        let steps = chain(&["ingest", "split"]);
        let runner = ScriptedRunner::succeeding(&["# Run step: ingest", "# Run step: split"]);

        let result = run_step(
            &dir,
            &steps,
            &steps[1],
            &PipelineTemplate::RegressionV1,
            &runner,
        )
        .await
        .unwrap();

        assert_eq!(result.name(), "split");
        assert_eq!(state_of(&dir, "ingest").status, StepStatus::Succeeded);
        assert_eq!(state_of(&dir, "split").status, StepStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_full_cache_hit_touches_no_state() {
        let (_base, _root, dir) = execution_dir();
        let steps = chain(&["ingest", "split"]);
        let runner = ScriptedRunner::succeeding(&["make: Nothing to be done for 'split'."]);

        let result = run_step(
            &dir,
            &steps,
            &steps[1],
            &PipelineTemplate::RegressionV1,
            &runner,
        )
        .await
        .unwrap();

        assert_eq!(result.name(), "split");
        // No execution happened, so no state was written.
        assert_eq!(state_of(&dir, "ingest"), ExecutionState::default());
        assert_eq!(state_of(&dir, "split"), ExecutionState::default());
    }

    #[tokio::test]
    async fn test_failure_marks_last_started_step_failed() {
        let (_base, _root, dir) = execution_dir();
        let steps = chain(&["ingest", "split"]);
        let runner = ScriptedRunner::failing(&["# Run step: ingest", "read error: no such file"]);

        let result = run_step(
            &dir,
            &steps,
            &steps[1],
            &PipelineTemplate::RegressionV1,
            &runner,
        )
        .await
        .unwrap();

        // The failing step is returned, not the target.
        assert_eq!(result.name(), "ingest");
        let ingest = state_of(&dir, "ingest");
        assert_eq!(ingest.status, StepStatus::Failed);
        assert!(ingest.stack_trace.unwrap().contains("no such file"));
        // The target never started and keeps the never-run invariant.
        assert_eq!(state_of(&dir, "split"), ExecutionState::default());
    }

    #[tokio::test]
    async fn test_markerless_failure_is_recorded_on_target() {
        let (_base, _root, dir) = execution_dir();
        let steps = chain(&["ingest", "split"]);
        // The runner dies before any step command starts, so its output
        // carries neither a step-start marker nor a cache-hit signal.
        let runner = ScriptedRunner::failing(&[
            "make: *** No rule to make target 'steps/split/conf.json'. Stop.",
        ]);

        let result = run_step(
            &dir,
            &steps,
            &steps[1],
            &PipelineTemplate::RegressionV1,
            &runner,
        )
        .await
        .unwrap();

        assert_eq!(result.name(), "split");
        let split = state_of(&dir, "split");
        assert_eq!(split.status, StepStatus::Failed);
        assert!(split.stack_trace.unwrap().contains("No rule to make target"));
        // Nothing started, so ingest keeps its never-run default.
        assert_eq!(state_of(&dir, "ingest"), ExecutionState::default());
    }

    #[tokio::test]
    async fn test_failure_invalidates_downstream_succeeded_state() {
        let (_base, _root, dir) = execution_dir();
        let steps = chain(&["ingest", "split"]);

        // First run: both steps succeed.
        let runner = ScriptedRunner::succeeding(&["# Run step: ingest", "# Run step: split"]);
        run_step(
            &dir,
            &steps,
            &steps[1],
            &PipelineTemplate::RegressionV1,
            &runner,
        )
        .await
        .unwrap();
        assert_eq!(state_of(&dir, "split").status, StepStatus::Succeeded);

        // Second run: ingest re-executes and fails; split's stale state
        // must be cleared.
        let runner = ScriptedRunner::failing(&["# Run step: ingest", "boom"]);
        let result = run_step(
            &dir,
            &steps,
            &steps[1],
            &PipelineTemplate::RegressionV1,
            &runner,
        )
        .await
        .unwrap();

        assert_eq!(result.name(), "ingest");
        assert_eq!(state_of(&dir, "split"), ExecutionState::default());
    }

    #[tokio::test]
    async fn test_downstream_of_executed_step_is_invalidated() {
        let (_base, _root, dir) = execution_dir();
        let steps = chain(&["ingest", "split", "transform"]);

        // Mark transform as previously succeeded.
        ExecutionState::succeeded()
            .write(&dir.step_output_dir("transform"))
            .unwrap();

        // Re-run split only (ingest cached).
        let runner = ScriptedRunner::succeeding(&["# Run step: split"]);
        run_step(
            &dir,
            &steps,
            &steps[1],
            &PipelineTemplate::RegressionV1,
            &runner,
        )
        .await
        .unwrap();

        assert_eq!(state_of(&dir, "split").status, StepStatus::Succeeded);
        assert_eq!(state_of(&dir, "transform"), ExecutionState::default());
    }

    #[tokio::test]
    async fn test_never_cached_target_state_cleared_before_run() {
        let (_base, _root, dir) = execution_dir();
        let ingest: Arc<dyn Step> = Arc::new(
            FakeStep::new("ingest", StepClass::Training).with_never_cached(true),
        );
        let steps = vec![Arc::clone(&ingest)];

        ExecutionState::succeeded()
            .write(&dir.step_output_dir("ingest"))
            .unwrap();
        std::fs::write(dir.step_output_dir("ingest").join("dataset.bin"), b"old").unwrap();

        // A runner that reports nothing would leave the cleared state
        // visible, proving the pre-run clear happened.
        let runner = ScriptedRunner::succeeding(&[]);
        run_step(
            &dir,
            &steps,
            &ingest,
            &PipelineTemplate::RegressionV1,
            &runner,
        )
        .await
        .unwrap();

        assert_eq!(state_of(&dir, "ingest"), ExecutionState::default());
        assert!(!dir.step_output_dir("ingest").join("dataset.bin").exists());
    }

    #[tokio::test]
    async fn test_environment_union_includes_reserved_vars() {
        let (_base, _root, dir) = execution_dir();
        let steps: Vec<Arc<dyn Step>> = vec![
            Arc::new(FakeStep::new("one", StepClass::Training).with_env("A", "B")),
            Arc::new(FakeStep::new("two", StepClass::Training).with_env("C", "D")),
        ];
        let runner = ScriptedRunner::succeeding(&[]);

        run_step(
            &dir,
            &steps,
            &steps[0],
            &PipelineTemplate::RegressionV1,
            &runner,
        )
        .await
        .unwrap();

        let request = runner.last_request().unwrap();
        assert_eq!(request.environment.get("A"), Some(&"B".to_string()));
        assert_eq!(request.environment.get("C"), Some(&"D".to_string()));
        assert_eq!(
            request.environment.get(TARGET_STEP_ENV_VAR),
            Some(&"one".to_string())
        );
        assert_eq!(request.rule, "one");
        assert_eq!(request.execution_dir, dir.path());
    }
}
