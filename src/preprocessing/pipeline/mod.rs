//! Pipeline for chaining preprocessing stages.

#[allow(clippy::module_inception)]
pub mod pipeline;

pub use pipeline::{FittedPipeline, FittedStep, Pipeline, PipelineParams, PipelineStep, StepParams};
