//! Build description generation.
//!
//! The engine drives an external build tool (GNU make) rather than
//! scheduling steps itself. One rule is generated per step: its target
//! is a sentinel file in the step's output directory, it depends on the
//! step's config snapshot and on the sentinel of the immediately
//! preceding step of the same classification (a linear chain per
//! classification group), and its recipe prints a step-start marker
//! before invoking the fixed-shape per-step command.
//!
//! Invalidating a step empties its output directory, removing the
//! sentinel, which makes the build tool re-execute the step and
//! everything after it in the chain.

use crate::steps::Step;
use std::fmt::Write as _;
use std::sync::Arc;

/// File name of the generated build description.
pub const MAKEFILE_NAME: &str = "Makefile";

/// Sentinel file a rule touches inside the step's output directory when
/// the step command completes.
pub const STEP_SENTINEL_FILE_NAME: &str = ".executed";

/// Renders the build description for an ordered step list.
#[must_use]
pub fn render_makefile(steps: &[Arc<dyn Step>]) -> String {
    let mut out = String::new();
    out.push_str("# Generated by stepflow. Do not edit: regenerated on every run.\n");
    out.push_str("RUN_STEP ?= stepflow-step\n\n");

    let names: Vec<&str> = steps.iter().map(|s| s.name()).collect();
    let _ = writeln!(out, ".PHONY: {}\n", names.join(" "));

    for (index, step) in steps.iter().enumerate() {
        let name = step.name();
        let sentinel = sentinel_path(name);
        let conf = format!("steps/{name}/conf.json");

        // The previous step of the same classification, if any.
        let upstream = steps[..index]
            .iter()
            .rev()
            .find(|other| other.step_class() == step.step_class())
            .map(|other| sentinel_path(other.name()));

        let _ = writeln!(out, "{name}: {sentinel}\n");
        match upstream {
            Some(upstream) => {
                let _ = writeln!(out, "{sentinel}: {conf} {upstream}");
            }
            None => {
                let _ = writeln!(out, "{sentinel}: {conf}");
            }
        }
        let _ = writeln!(out, "\t@printf '# Run step: {name}\\n'");
        let _ = writeln!(out, "\t@$(RUN_STEP) {name}");
        let _ = writeln!(out, "\t@mkdir -p steps/{name}/outputs");
        let _ = writeln!(out, "\t@touch $@\n");
    }
    out
}

fn sentinel_path(step_name: &str) -> String {
    format!("steps/{step_name}/outputs/{STEP_SENTINEL_FILE_NAME}")
}
