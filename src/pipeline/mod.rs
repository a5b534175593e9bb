//! Pipeline composition and execution for sequential gating.

mod runner;

pub use runner::{GateStep, Pipeline, PipelineConfig, PipelineResult, StepSummary};
