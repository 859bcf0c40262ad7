//! Cache-vs-run classification of runner output.
//!
//! The external build tool reports, through its line-oriented output,
//! which steps it actually re-executed. Two signal shapes matter: a
//! terminal "nothing to do" message for the target rule (everything up
//! to the target was served from cache) and a per-step start marker
//! (everything from the first marker onward was re-executed). The
//! shapes are defined behind [`RunnerOutputAdapter`] so an alternate
//! build tool can be substituted with a different line matcher.

use regex::Regex;
use std::fmt::Debug;

/// Prefix of the step-start marker printed by generated rules.
pub const STEP_START_MARKER_PREFIX: &str = "# Run step: ";

/// Matches the two runner output signal shapes.
pub trait RunnerOutputAdapter: Send + Sync + Debug {
    /// Returns true if the line is the terminal "nothing to do" signal
    /// for the target rule.
    fn nothing_to_do(&self, line: &str, target_rule: &str) -> bool;

    /// If the line is a step-start marker, returns the step name.
    fn step_started<'a>(&self, line: &'a str) -> Option<&'a str>;
}

/// Adapter for GNU make output.
#[derive(Debug, Clone)]
pub struct MakeOutputAdapter {
    up_to_date: Regex,
    nothing_to_be_done: Regex,
}

impl MakeOutputAdapter {
    /// Creates the adapter.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self {
            // make: `register' is up to date.   (also seen with ' quoting)
            up_to_date: Regex::new(r"^make(?:\[\d+\])?: [`']([^']+)' is up to date\.?$")
                .expect("static regex"),
            // make: Nothing to be done for `register'.
            nothing_to_be_done: Regex::new(
                r"^make(?:\[\d+\])?: Nothing to be done for [`']([^']+)'\.?$",
            )
            .expect("static regex"),
        }
    }
}

impl Default for MakeOutputAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl RunnerOutputAdapter for MakeOutputAdapter {
    fn nothing_to_do(&self, line: &str, target_rule: &str) -> bool {
        let line = line.trim_end();
        [&self.up_to_date, &self.nothing_to_be_done].iter().any(|re| {
            re.captures(line)
                .and_then(|captures| captures.get(1))
                .is_some_and(|rule| rule.as_str() == target_rule)
        })
    }

    fn step_started<'a>(&self, line: &'a str) -> Option<&'a str> {
        line.trim_end()
            .strip_prefix(STEP_START_MARKER_PREFIX)
            .map(str::trim)
    }
}

/// The cache-vs-run classification of one runner invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// The ordered prefix of the subgraph that was served from cache.
    pub steps_cached: Vec<String>,

    /// The subgraph steps the runner actually started, in order.
    pub steps_executed: Vec<String>,
}

impl ExecutionPlan {
    /// Classifies the subgraph steps from the runner's output lines.
    ///
    /// `subgraph_names` is the ordered list of step names relevant to
    /// the target; marker lines naming anything else are ignored.
    #[must_use]
    pub fn new(
        target_step_name: &str,
        output_lines: &[String],
        subgraph_names: &[String],
        adapter: &dyn RunnerOutputAdapter,
    ) -> Self {
        let target_index = subgraph_names
            .iter()
            .position(|name| name == target_step_name);

        let mut steps_executed: Vec<String> = Vec::new();
        let mut saw_nothing_to_do = false;
        for line in output_lines {
            if adapter.nothing_to_do(line, target_step_name) {
                saw_nothing_to_do = true;
            }
            if let Some(step) = adapter.step_started(line) {
                if subgraph_names.iter().any(|name| name == step)
                    && !steps_executed.iter().any(|name| name == step)
                {
                    steps_executed.push(step.to_string());
                }
            }
        }

        let steps_cached = if steps_executed.is_empty() {
            if saw_nothing_to_do {
                // Full cache hit: everything up to and including the
                // target was reused.
                match target_index {
                    Some(index) => subgraph_names[..=index].to_vec(),
                    None => subgraph_names.to_vec(),
                }
            } else {
                // No signal at all (e.g. runner produced no output):
                // nothing can be classified as cached or executed.
                Vec::new()
            }
        } else {
            let first_executed = subgraph_names
                .iter()
                .position(|name| Some(name) == steps_executed.first())
                .unwrap_or(0);
            subgraph_names[..first_executed].to_vec()
        };

        Self {
            steps_cached,
            steps_executed,
        }
    }
}
