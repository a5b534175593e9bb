//! Gate functions over point sets.
//!
//! Every gate is a parameter struct implementing [`Gate`]. The default
//! output is a [`Mask`]; [`Gate::apply`] additionally returns the retained
//! events and any boundary contours.

pub mod density2d;
pub mod ellipse;
pub mod high_low;
pub mod start_end;

pub use density2d::{DensityAnalysis, Density2dGate};
pub use ellipse::{EllipseGate, CONTOUR_POINTS};
pub use high_low::HighLowGate;
pub use start_end::StartEndGate;

use crate::data::{GateEvaluation, GateOutput, Mask, PointSet};
use crate::error::Result;

/// Common contract of all gates.
pub trait Gate {
    /// Short identifier used in logs and summaries.
    fn name(&self) -> &'static str;

    /// Compute the mask, tracing boundary contours only when `trace` is set.
    fn evaluate(&self, points: &PointSet, trace: bool) -> Result<GateEvaluation>;

    /// Inclusion mask, one flag per event.
    fn mask(&self, points: &PointSet) -> Result<Mask> {
        Ok(self.evaluate(points, false)?.mask)
    }

    /// Retained events, mask and boundary contours.
    fn apply(&self, points: &PointSet) -> Result<GateOutput> {
        let GateEvaluation { mask, contours } = self.evaluate(points, true)?;
        let gated = points.select(&mask)?;
        Ok(GateOutput {
            gated,
            mask,
            contours,
        })
    }
}
