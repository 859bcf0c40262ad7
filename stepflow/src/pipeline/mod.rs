//! The pipeline front door: the template registry and the [`Pipeline`]
//! type exposing `run`, `clean`, and artifact lookup.

mod front_door;
mod template;

pub use front_door::{subgraph_for_target, Pipeline, PipelineBuilder};
pub use template::PipelineTemplate;
