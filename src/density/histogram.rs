//! Two-dimensional histogram binning with a per-bin index of source rows.

use crate::data::ChannelInfo;
use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};

/// Number of bins per axis when neither edges nor counts are given.
pub const DEFAULT_BIN_COUNT: usize = 10;

/// How histogram bin edges are chosen.
///
/// Serialized untagged, so configs read naturally: omitted or `null` for
/// `Auto`, `64` for `Count`, `[64, 32]` for `Counts` and two edge lists for
/// `Edges`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BinSpec {
    /// Instrument edges when both channels carry them, otherwise
    /// [`DEFAULT_BIN_COUNT`] equal-width bins over the data range.
    #[default]
    Auto,
    /// The same number of equal-width bins on both axes.
    Count(usize),
    /// Equal-width bins, counts given per axis (x, y).
    Counts(usize, usize),
    /// Explicit edges per axis (x, y).
    Edges(Vec<f64>, Vec<f64>),
}

/// Raw event counts on a regular 2D grid.
///
/// Cells are flattened x-major: `idx = ix * ny + iy`. Cell `(ix, iy)` holds
/// events with `edges_x[ix] <= x < edges_x[ix + 1]` (same for y), except
/// the last cell on each axis, which is closed on both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram2D {
    counts: Vec<u64>,
    edges_x: Vec<f64>,
    edges_y: Vec<f64>,
}

impl Histogram2D {
    /// Grid shape as (bins along x, bins along y).
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.edges_x.len() - 1, self.edges_y.len() - 1)
    }

    /// Flattened cell index.
    #[inline]
    pub fn flat_index(&self, ix: usize, iy: usize) -> usize {
        ix * self.shape().1 + iy
    }

    /// Count in cell (ix, iy).
    #[inline]
    pub fn count(&self, ix: usize, iy: usize) -> u64 {
        self.counts[self.flat_index(ix, iy)]
    }

    /// Flattened counts.
    #[inline]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn edges_x(&self) -> &[f64] {
        &self.edges_x
    }

    pub fn edges_y(&self) -> &[f64] {
        &self.edges_y
    }

    /// Total number of binned events.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Bin midpoints along x.
    pub fn centers_x(&self) -> Vec<f64> {
        centers(&self.edges_x)
    }

    /// Bin midpoints along y.
    pub fn centers_y(&self) -> Vec<f64> {
        centers(&self.edges_y)
    }
}

/// Source row indices per histogram cell, addressed like [`Histogram2D`].
#[derive(Debug, Clone, PartialEq)]
pub struct BinPointIndex {
    bins: Vec<Vec<usize>>,
}

impl BinPointIndex {
    /// Rows that landed in a flattened cell, ascending.
    #[inline]
    pub fn rows(&self, flat: usize) -> &[usize] {
        &self.bins[flat]
    }

    /// Number of cells.
    pub fn n_bins(&self) -> usize {
        self.bins.len()
    }

    /// Total number of indexed rows.
    pub fn population(&self) -> usize {
        self.bins.iter().map(Vec::len).sum()
    }
}

fn centers(edges: &[f64]) -> Vec<f64> {
    edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
}

/// Check that `edges` describes at least one bin and is strictly increasing.
pub fn validate_edges(edges: &[f64], axis: &str) -> Result<()> {
    if edges.len() < 2 {
        return Err(GateError::InvalidArgument(format!(
            "{} bin edges need at least 2 values, got {}",
            axis,
            edges.len()
        )));
    }
    if edges.iter().any(|e| !e.is_finite()) {
        return Err(GateError::InvalidArgument(format!(
            "{} bin edges must be finite",
            axis
        )));
    }
    if let Some(pos) = edges.windows(2).position(|w| w[0] >= w[1]) {
        return Err(GateError::InvalidArgument(format!(
            "{} bin edges must be strictly increasing (edge {} = {} >= edge {} = {})",
            axis,
            pos,
            edges[pos],
            pos + 1,
            edges[pos + 1]
        )));
    }
    Ok(())
}

/// `n_bins` equal-width bins spanning the finite range of `values`.
///
/// A constant input is widened to `[v - 0.5, v + 0.5]`. So is a range too
/// narrow (a few ULPs) to split into `n_bins` distinct edges; for very large
/// magnitudes the half-width grows to `1e-9 * |v|` so the edges stay
/// representable.
pub fn equal_width_edges(values: &[f64], n_bins: usize) -> Result<Vec<f64>> {
    if n_bins == 0 {
        return Err(GateError::InvalidArgument(
            "Number of bins must be positive".to_string(),
        ));
    }

    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return Err(GateError::EmptyOrDegenerateInput(
            "No finite values to derive bin edges from".to_string(),
        ));
    }
    let edges = linear_edges(lo, hi, n_bins);
    if strictly_increasing(&edges) {
        return Ok(edges);
    }

    let center = 0.5 * lo + 0.5 * hi;
    let half = 0.5f64.max(1e-9 * center.abs());
    Ok(linear_edges(center - half, center + half, n_bins))
}

fn linear_edges(lo: f64, hi: f64, n_bins: usize) -> Vec<f64> {
    let step = (hi - lo) / n_bins as f64;
    let mut edges: Vec<f64> = (0..n_bins).map(|i| lo + step * i as f64).collect();
    edges.push(hi);
    edges
}

fn strictly_increasing(edges: &[f64]) -> bool {
    edges.windows(2).all(|w| w[0] < w[1])
}

/// Choose edges for both axes according to `bins`.
pub fn resolve_edges(
    bins: &BinSpec,
    xs: &[f64],
    ys: &[f64],
    info_x: Option<&ChannelInfo>,
    info_y: Option<&ChannelInfo>,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let (edges_x, edges_y) = match bins {
        BinSpec::Auto => {
            let instrument = (
                info_x.and_then(|i| i.bin_edges.as_ref()),
                info_y.and_then(|i| i.bin_edges.as_ref()),
            );
            match instrument {
                (Some(ex), Some(ey)) => (ex.clone(), ey.clone()),
                _ => (
                    equal_width_edges(xs, DEFAULT_BIN_COUNT)?,
                    equal_width_edges(ys, DEFAULT_BIN_COUNT)?,
                ),
            }
        }
        BinSpec::Count(n) => (equal_width_edges(xs, *n)?, equal_width_edges(ys, *n)?),
        BinSpec::Counts(nx, ny) => (equal_width_edges(xs, *nx)?, equal_width_edges(ys, *ny)?),
        BinSpec::Edges(ex, ey) => (ex.clone(), ey.clone()),
    };

    validate_edges(&edges_x, "x")?;
    validate_edges(&edges_y, "y")?;
    Ok((edges_x, edges_y))
}

/// Bin index of `value`, or `None` when it falls outside the edges.
///
/// Uses the half-open "largest edge <= value" rule, then moves a value equal
/// to the final edge into the last bin so the outermost bin is closed.
pub fn digitize(value: f64, edges: &[f64]) -> Option<usize> {
    let n_bins = edges.len() - 1;
    if !value.is_finite() || value < edges[0] || value > edges[n_bins] {
        return None;
    }

    let idx = edges.partition_point(|&e| e <= value) - 1;
    if idx == n_bins {
        Some(n_bins - 1)
    } else {
        Some(idx)
    }
}

/// Bin paired coordinates into a histogram and record each row's cell.
///
/// Rows outside the edges on either axis are left out of both outputs.
pub fn bin_points(
    xs: &[f64],
    ys: &[f64],
    edges_x: Vec<f64>,
    edges_y: Vec<f64>,
) -> Result<(Histogram2D, BinPointIndex)> {
    if xs.len() != ys.len() {
        return Err(GateError::DimensionMismatch {
            expected: xs.len(),
            actual: ys.len(),
        });
    }
    validate_edges(&edges_x, "x")?;
    validate_edges(&edges_y, "y")?;

    let nx = edges_x.len() - 1;
    let ny = edges_y.len() - 1;
    let mut counts = vec![0u64; nx * ny];
    let mut bins: Vec<Vec<usize>> = vec![Vec::new(); nx * ny];

    for (row, (&x, &y)) in xs.iter().zip(ys).enumerate() {
        if let (Some(ix), Some(iy)) = (digitize(x, &edges_x), digitize(y, &edges_y)) {
            let flat = ix * ny + iy;
            counts[flat] += 1;
            bins[flat].push(row);
        }
    }

    let histogram = Histogram2D {
        counts,
        edges_x,
        edges_y,
    };
    let index = BinPointIndex { bins };
    debug_assert_eq!(histogram.total() as usize, index.population());

    Ok((histogram, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_digitize_half_open() {
        let edges = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(digitize(0.0, &edges), Some(0));
        assert_eq!(digitize(0.999, &edges), Some(0));
        assert_eq!(digitize(1.0, &edges), Some(1));
        assert_eq!(digitize(2.5, &edges), Some(2));
    }

    #[test]
    fn test_digitize_last_edge_closed() {
        let edges = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(digitize(3.0, &edges), Some(2));
    }

    #[test]
    fn test_digitize_out_of_range() {
        let edges = [0.0, 1.0, 2.0];
        assert_eq!(digitize(-0.001, &edges), None);
        assert_eq!(digitize(2.001, &edges), None);
        assert_eq!(digitize(f64::NAN, &edges), None);
        assert_eq!(digitize(f64::INFINITY, &edges), None);
    }

    #[test]
    fn test_equal_width_edges() {
        let edges = equal_width_edges(&[2.0, 4.0, 10.0, 6.0], 4).unwrap();
        assert_eq!(edges.len(), 5);
        assert_relative_eq!(edges[0], 2.0);
        assert_relative_eq!(edges[1], 4.0);
        assert_relative_eq!(edges[2], 6.0);
        assert_eq!(edges[4], 10.0);
    }

    #[test]
    fn test_equal_width_edges_constant() {
        let edges = equal_width_edges(&[3.0, 3.0, 3.0], 2).unwrap();
        assert_relative_eq!(edges[0], 2.5);
        assert_relative_eq!(edges[1], 3.0);
        assert_relative_eq!(edges[2], 3.5);
    }

    #[test]
    fn test_equal_width_edges_ulp_wide_range() {
        let lo = 1.0f64;
        let hi = f64::from_bits(lo.to_bits() + 2);
        let edges = equal_width_edges(&[lo, hi], 10).unwrap();
        assert_eq!(edges.len(), 11);
        assert!(validate_edges(&edges, "x").is_ok());
        assert!(edges[0] <= lo && edges[10] >= hi);
        assert_relative_eq!(edges[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(edges[10], 1.5, epsilon = 1e-12);

        // Both values still land in a bin
        let (hist, _) = bin_points(&[lo, hi], &[0.0, 0.0], edges, vec![-1.0, 1.0]).unwrap();
        assert_eq!(hist.total(), 2);
    }

    #[test]
    fn test_equal_width_edges_huge_constant() {
        let edges = equal_width_edges(&[1e300, 1e300], 4).unwrap();
        assert!(validate_edges(&edges, "x").is_ok());
        assert!(edges[0] < 1e300 && edges[4] > 1e300);
    }

    #[test]
    fn test_equal_width_edges_ignores_non_finite() {
        let edges = equal_width_edges(&[f64::NAN, 1.0, f64::INFINITY, 3.0], 2).unwrap();
        assert_eq!(edges, vec![1.0, 2.0, 3.0]);
        assert!(equal_width_edges(&[f64::NAN], 2).is_err());
    }

    #[test]
    fn test_validate_edges() {
        assert!(validate_edges(&[0.0, 1.0], "x").is_ok());
        assert!(validate_edges(&[0.0], "x").is_err());
        assert!(validate_edges(&[0.0, 1.0, 1.0], "x").is_err());
        assert!(validate_edges(&[0.0, f64::NAN], "x").is_err());
    }

    #[test]
    fn test_bin_points_counts_and_index_agree() {
        let xs = [0.5, 1.5, 1.5, 2.0, 5.0];
        let ys = [0.5, 0.5, 1.5, 2.0, 0.5];
        let (hist, index) =
            bin_points(&xs, &ys, vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0]).unwrap();

        assert_eq!(hist.shape(), (2, 2));
        assert_eq!(hist.count(0, 0), 1);
        assert_eq!(hist.count(1, 0), 1);
        // (1.5, 1.5) and the max-edge point (2.0, 2.0) share the last cell
        assert_eq!(hist.count(1, 1), 2);
        assert_eq!(index.rows(hist.flat_index(1, 1)), &[2, 3]);
        // x = 5.0 is outside the edges
        assert_eq!(hist.total(), 4);
        assert_eq!(index.population(), 4);
    }

    #[test]
    fn test_resolve_edges_uses_instrument_edges() {
        let info = ChannelInfo {
            range: None,
            bin_edges: Some(vec![0.0, 256.0, 512.0, 768.0, 1024.0]),
        };
        let (ex, ey) = resolve_edges(&BinSpec::Auto, &[1.0], &[2.0], Some(&info), Some(&info))
            .unwrap();
        assert_eq!(ex.len(), 5);
        assert_eq!(ey[4], 1024.0);
    }

    #[test]
    fn test_resolve_edges_auto_default_count() {
        let xs: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let (ex, ey) = resolve_edges(&BinSpec::Auto, &xs, &xs, None, None).unwrap();
        assert_eq!(ex.len(), DEFAULT_BIN_COUNT + 1);
        assert_eq!(ey.len(), DEFAULT_BIN_COUNT + 1);
    }

    #[test]
    fn test_resolve_edges_rejects_malformed() {
        let bins = BinSpec::Edges(vec![0.0, 2.0, 1.0], vec![0.0, 1.0]);
        assert!(matches!(
            resolve_edges(&bins, &[], &[], None, None),
            Err(GateError::InvalidArgument(_))
        ));
        assert!(resolve_edges(&BinSpec::Count(0), &[1.0], &[1.0], None, None).is_err());
    }
}
