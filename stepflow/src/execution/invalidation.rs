//! Downstream state invalidation.
//!
//! After a step executes, any later step of the same classification may
//! hold outputs derived from data that no longer exists or from a stale
//! configuration. Its execution state record and its output artifacts
//! are removed together, restoring the never-run invariant
//! (UNKNOWN / timestamp 0 / no trace / empty output directory).

use crate::errors::StepflowError;
use crate::execution::directory::ExecutionDirectory;
use crate::steps::Step;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Clears one step's execution state record and empties its output
/// directory. A missing output directory is already clean.
pub fn clear_step_state(
    execution_dir: &ExecutionDirectory,
    step_name: &str,
) -> Result<(), StepflowError> {
    let outputs = execution_dir.step_output_dir(step_name);
    if !outputs.exists() {
        return Ok(());
    }
    // The state record lives inside the output directory, so emptying
    // the directory removes both together.
    for entry in std::fs::read_dir(&outputs)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(entry.path())?;
        } else {
            std::fs::remove_file(entry.path())?;
        }
    }
    debug!(step = step_name, "Cleared execution state and outputs");
    Ok(())
}

/// Clears the execution state of every given step.
///
/// This is the `clean` primitive: cleaned steps re-execute in their
/// entirety on the next run that needs them.
pub fn clean_execution_state(
    execution_dir: &ExecutionDirectory,
    steps: &[Arc<dyn Step>],
) -> Result<(), StepflowError> {
    for step in steps {
        clear_step_state(execution_dir, step.name())?;
    }
    Ok(())
}

/// Invalidates every step positioned after `executed` in `steps` that
/// shares its classification, except steps named in `protected` (those
/// whose state was just recorded in the same run).
pub fn invalidate_downstream(
    execution_dir: &ExecutionDirectory,
    steps: &[Arc<dyn Step>],
    executed: &dyn Step,
    protected: &HashSet<String>,
) -> Result<(), StepflowError> {
    let Some(position) = steps.iter().position(|s| s.name() == executed.name()) else {
        return Ok(());
    };
    for downstream in &steps[position + 1..] {
        if downstream.step_class() != executed.step_class() {
            continue;
        }
        if protected.contains(downstream.name()) {
            continue;
        }
        debug!(
            upstream = executed.name(),
            downstream = downstream.name(),
            "Invalidating downstream step"
        );
        clear_step_state(execution_dir, downstream.name())?;
    }
    Ok(())
}
