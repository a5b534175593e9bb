//! Gate outputs: masks, gated events and boundary contours.

use crate::data::{Mask, PointSet};
use serde::{Deserialize, Serialize};

/// One connected boundary polyline in data coordinates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contour {
    /// Ordered (x, y) vertices.
    pub points: Vec<[f64; 2]>,
}

impl Contour {
    pub fn new(points: Vec<[f64; 2]>) -> Self {
        Self { points }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when the last vertex repeats the first.
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => self.points.len() > 2 && first == last,
            _ => false,
        }
    }
}

/// Raw result of evaluating a gate: the mask plus any traced boundary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GateEvaluation {
    pub mask: Mask,
    pub contours: Vec<Contour>,
}

/// Extended gate output.
#[derive(Debug, Clone)]
pub struct GateOutput {
    /// Retained events, in their original order.
    pub gated: PointSet,
    /// One flag per input event.
    pub mask: Mask,
    /// Boundary curves; empty for gates without a geometric boundary.
    pub contours: Vec<Contour>,
}

impl GateOutput {
    /// Number of events retained.
    pub fn n_kept(&self) -> usize {
        self.gated.n_rows()
    }
}

impl std::fmt::Display for GateOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let n_total = self.mask.len();
        let n_kept = self.n_kept();
        let pct = if n_total > 0 {
            n_kept as f64 / n_total as f64 * 100.0
        } else {
            0.0
        };
        writeln!(f, "Gate Output")?;
        writeln!(f, "  Events before: {}", n_total)?;
        writeln!(f, "  Events kept:   {} ({:.1}%)", n_kept, pct)?;
        writeln!(f, "  Contours:      {}", self.contours.len())?;
        Ok(())
    }
}
