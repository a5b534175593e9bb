//! Density cutoff selection with exact-count semantics.

use crate::data::Mask;
use crate::density::{BinPointIndex, DensityField, Histogram2D};
use crate::error::{GateError, Result};

/// Outcome of ranking cells by density and accumulating raw counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Flattened cell indices sorted by density, descending.
    pub order: Vec<usize>,
    /// Position in `order` of the last accepted cell.
    pub cutoff_rank: usize,
    /// Density of the last accepted cell.
    pub cutoff_density: f64,
    /// Events the accepted cells must cover: `ceil(fraction * n_in_range)`.
    pub n_needed: usize,
    /// Events inside the histogram range.
    pub n_in_range: usize,
    /// Events actually covered by the accepted cells.
    pub n_accepted: usize,
}

impl Selection {
    /// Accepted cells, densest first.
    pub fn accepted(&self) -> &[usize] {
        &self.order[..=self.cutoff_rank]
    }

    /// Mask over `n_rows` events keeping every row binned into an accepted cell.
    pub fn mask(&self, index: &BinPointIndex, n_rows: usize) -> Result<Mask> {
        let rows = self
            .accepted()
            .iter()
            .flat_map(|&flat| index.rows(flat).iter().copied());
        Mask::from_indices(n_rows, rows)
    }
}

/// Rank cells by density (descending; ties by ascending flattened index) and
/// accept the shortest prefix whose raw counts reach `ceil(fraction * N)`.
pub fn select_bins(
    density: &DensityField,
    histogram: &Histogram2D,
    fraction: f64,
) -> Result<Selection> {
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(GateError::InvalidArgument(format!(
            "gate_fraction must be in (0, 1], got {}",
            fraction
        )));
    }
    if density.shape() != histogram.shape() {
        let (nx, ny) = histogram.shape();
        let (dx, dy) = density.shape();
        return Err(GateError::DimensionMismatch {
            expected: nx * ny,
            actual: dx * dy,
        });
    }

    let counts = histogram.counts();
    let n_in_range = histogram.total() as usize;
    if n_in_range == 0 {
        return Err(GateError::EmptyOrDegenerateInput(
            "No events fall inside the histogram bins".to_string(),
        ));
    }
    let n_needed = (fraction * n_in_range as f64).ceil() as usize;

    let values = density.values();
    let mut order: Vec<usize> = (0..values.len()).collect();
    // Stable sort keeps ascending flat index among equal densities
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let mut cumulative = 0usize;
    let cutoff_rank = order
        .iter()
        .position(|&flat| {
            cumulative += counts[flat] as usize;
            cumulative >= n_needed
        })
        .ok_or(GateError::InternalInconsistency {
            target: n_needed,
            total: n_in_range,
            shape: histogram.shape(),
        })?;

    Ok(Selection {
        cutoff_density: values[order[cutoff_rank]],
        cutoff_rank,
        n_needed,
        n_in_range,
        n_accepted: cumulative,
        order,
    })
}
