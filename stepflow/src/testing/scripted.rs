//! A runner double that replays canned output.

use crate::errors::StepflowError;
use crate::execution::{
    ExternalRunner, MakeOutputAdapter, RunnerOutcome, RunnerOutputAdapter, RunnerRequest,
};
use async_trait::async_trait;
use std::sync::Mutex;

/// An [`ExternalRunner`] that performs no work: it records the request
/// it was given and returns a fixed outcome. Speaks the make output
/// dialect so driver tests exercise the real classification path.
#[derive(Debug)]
pub struct ScriptedRunner {
    exit_code: i32,
    lines: Vec<String>,
    adapter: MakeOutputAdapter,
    last_request: Mutex<Option<RunnerRequest>>,
}

impl ScriptedRunner {
    /// A runner that exits 0 with the given output lines.
    #[must_use]
    pub fn succeeding(lines: &[&str]) -> Self {
        Self::with_exit_code(0, lines)
    }

    /// A runner that exits 2 (make's build-failure code) with the given
    /// output lines.
    #[must_use]
    pub fn failing(lines: &[&str]) -> Self {
        Self::with_exit_code(2, lines)
    }

    /// A runner with an explicit exit code.
    #[must_use]
    pub fn with_exit_code(exit_code: i32, lines: &[&str]) -> Self {
        Self {
            exit_code,
            lines: lines.iter().map(ToString::to_string).collect(),
            adapter: MakeOutputAdapter::new(),
            last_request: Mutex::new(None),
        }
    }

    /// The request from the most recent [`ExternalRunner::run`] call.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn last_request(&self) -> Option<RunnerRequest> {
        self.last_request
            .lock()
            .expect("request mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl ExternalRunner for ScriptedRunner {
    #[allow(clippy::expect_used)]
    async fn run(&self, request: RunnerRequest) -> Result<RunnerOutcome, StepflowError> {
        *self.last_request.lock().expect("request mutex poisoned") = Some(request);
        Ok(RunnerOutcome {
            exit_code: Some(self.exit_code),
            lines: self.lines.clone(),
        })
    }

    fn output_adapter(&self) -> &dyn RunnerOutputAdapter {
        &self.adapter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_records_request_and_replays_outcome() {
        let runner = ScriptedRunner::failing(&["# Run step: train", "boom"]);
        let outcome = runner
            .run(RunnerRequest {
                execution_dir: "/tmp/exec".into(),
                rule: "train".to_string(),
                environment: HashMap::new(),
            })
            .await
            .unwrap();

        assert!(!outcome.success());
        assert_eq!(outcome.lines.len(), 2);
        assert_eq!(runner.last_request().unwrap().rule, "train");
    }
}
