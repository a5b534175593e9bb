//! Composable gating of flow cytometry events.
//!
//! This library provides gate primitives that select subsets of events
//! (rows) from a dense point set (events × channels), plus a pipeline for
//! running them in sequence.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (PointSet, Mask, ChannelSelector, Contour)
//! - **density**: Histogram binning, Gaussian smoothing, density-ranked
//!   bin selection and iso-density contour tracing
//! - **gate**: Gates (start/end trimming, high/low bounds, ellipse, density)
//! - **pipeline**: Pipeline composition and execution
//!
//! # Example
//!
//! ```no_run
//! use flowgate::prelude::*;
//!
//! let events = PointSet::from_tsv("events.tsv").unwrap();
//!
//! let result = Pipeline::new()
//!     .start_end(250, 100)
//!     .high_low(None, None, None)
//!     .density2d(
//!         ChannelSelector::pair("FSC-H", "SSC-H"),
//!         BinSpec::Auto,
//!         0.65,
//!         10.0,
//!     )
//!     .run(&events)
//!     .unwrap();
//!
//! println!("{}", result);
//! ```

pub mod data;
pub mod density;
pub mod error;
pub mod gate;
pub mod pipeline;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::data::{
        Channel, ChannelInfo, ChannelSelector, Contour, GateEvaluation, GateOutput, Mask,
        PointSet,
    };
    pub use crate::density::{BinSpec, DensityField, Histogram2D, Selection};
    pub use crate::error::{GateError, Result};
    pub use crate::gate::{
        Density2dGate, DensityAnalysis, EllipseGate, Gate, HighLowGate, StartEndGate,
    };
    pub use crate::pipeline::{GateStep, Pipeline, PipelineConfig, PipelineResult, StepSummary};
}
