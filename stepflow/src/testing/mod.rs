//! Test fixtures and doubles.
//!
//! Public so downstream crates embedding the engine can reuse them in
//! their own tests.

mod fixtures;
mod scripted;

pub use fixtures::PipelineFixture;
pub use scripted::ScriptedRunner;
