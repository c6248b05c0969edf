pub mod config;
mod orchestrator;
mod types;

pub use orchestrator::{run_and_export, run_pipeline, run_pipeline_reported};
pub use types::{CompositeSeries, PipelineStage, ProgressReporter, RunReport, WindowFailure};
