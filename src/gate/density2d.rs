//! Density-based gate keeping the events in the highest-density region.
//!
//! The two selected channels are binned into a 2D histogram, which is
//! blurred with a Gaussian and normalized into a probability mass function.
//! Cells are then accepted from densest to sparsest until they cover
//! `ceil(gate_fraction * N)` of the `N` binned events. The boundary of the
//! accepted region is the iso-density line at the last accepted cell's
//! density.

use crate::data::{ChannelSelector, GateEvaluation, Mask, PointSet};
use crate::density::{
    bin_points, estimate_density, resolve_edges, select_bins, trace_contours, BinPointIndex,
    BinSpec, DensityField, Histogram2D, Selection,
};
use crate::error::{GateError, Result};
use crate::gate::Gate;
use log::debug;
use serde::{Deserialize, Serialize};

/// Density gate parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Density2dGate {
    pub channels: ChannelSelector,
    pub bins: BinSpec,
    /// Fraction of binned events to keep, in (0, 1].
    pub gate_fraction: f64,
    /// Standard deviation of the smoothing kernel, in bins.
    pub sigma: f64,
}

impl Default for Density2dGate {
    fn default() -> Self {
        Self {
            channels: ChannelSelector::default(),
            bins: BinSpec::Auto,
            gate_fraction: 0.65,
            sigma: 10.0,
        }
    }
}

/// Intermediate products of one density gate evaluation.
#[derive(Debug, Clone)]
pub struct DensityAnalysis {
    pub histogram: Histogram2D,
    pub index: BinPointIndex,
    pub density: DensityField,
    pub selection: Selection,
}

impl Density2dGate {
    pub fn new(channels: ChannelSelector) -> Self {
        Self {
            channels,
            ..Self::default()
        }
    }

    pub fn with_bins(mut self, bins: BinSpec) -> Self {
        self.bins = bins;
        self
    }

    pub fn with_fraction(mut self, gate_fraction: f64) -> Self {
        self.gate_fraction = gate_fraction;
        self
    }

    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = sigma;
        self
    }

    /// Run binning, smoothing and selection without building a mask.
    pub fn analyze(&self, points: &PointSet) -> Result<DensityAnalysis> {
        let (cx, cy) = self.channels.resolve_pair(points)?;
        if !(self.gate_fraction > 0.0 && self.gate_fraction <= 1.0) {
            return Err(GateError::InvalidArgument(format!(
                "gate_fraction must be in (0, 1], got {}",
                self.gate_fraction
            )));
        }
        if !(self.sigma > 0.0) || !self.sigma.is_finite() {
            return Err(GateError::InvalidArgument(format!(
                "sigma must be positive and finite, got {}",
                self.sigma
            )));
        }
        if points.n_rows() < 2 {
            return Err(GateError::EmptyOrDegenerateInput(format!(
                "Data must have more than 1 event, got {}",
                points.n_rows()
            )));
        }

        let xs = points.column(cx);
        let ys = points.column(cy);
        let (edges_x, edges_y) = resolve_edges(
            &self.bins,
            &xs,
            &ys,
            points.channel_info(cx),
            points.channel_info(cy),
        )?;
        let (histogram, index) = bin_points(&xs, &ys, edges_x, edges_y)?;
        if histogram.total() == 0 {
            return Err(GateError::EmptyOrDegenerateInput(format!(
                "None of the {} events fall inside the histogram bins",
                points.n_rows()
            )));
        }

        let density = estimate_density(&histogram, self.sigma)?;
        let selection = select_bins(&density, &histogram, self.gate_fraction)?;

        debug!(
            "density2d on {}: {} of {} events in range, {} needed, cutoff rank {} of {} bins (density {:e})",
            self.channels,
            selection.n_in_range,
            points.n_rows(),
            selection.n_needed,
            selection.cutoff_rank,
            selection.order.len(),
            selection.cutoff_density
        );

        Ok(DensityAnalysis {
            histogram,
            index,
            density,
            selection,
        })
    }
}

impl Gate for Density2dGate {
    fn name(&self) -> &'static str {
        "density2d"
    }

    fn evaluate(&self, points: &PointSet, trace: bool) -> Result<GateEvaluation> {
        let analysis = self.analyze(points)?;
        let mask: Mask = analysis.selection.mask(&analysis.index, points.n_rows())?;

        let contours = if trace {
            let contours = trace_contours(
                &analysis.density,
                &analysis.histogram,
                analysis.selection.cutoff_density,
            )?;
            debug!("density2d traced {} contour(s)", contours.len());
            contours
        } else {
            Vec::new()
        };

        Ok(GateEvaluation { mask, contours })
    }
}
