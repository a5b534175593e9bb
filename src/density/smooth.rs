//! Gaussian smoothing of a raw histogram into a probability mass function.
//!
//! The kernel is a truncated, normalized discrete Gaussian applied
//! separably along each axis. Cells beyond the grid are treated as zero.

use crate::density::Histogram2D;
use crate::error::{GateError, Result};
use rayon::prelude::*;

/// Kernel support in standard deviations.
pub const TRUNCATE: f64 = 6.0;

/// Smoothed, normalized density over histogram cells (sums to 1).
#[derive(Debug, Clone, PartialEq)]
pub struct DensityField {
    values: Vec<f64>,
    nx: usize,
    ny: usize,
}

impl DensityField {
    /// Grid shape as (bins along x, bins along y).
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Density at cell (ix, iy).
    #[inline]
    pub fn get(&self, ix: usize, iy: usize) -> f64 {
        self.values[ix * self.ny + iy]
    }

    /// Flattened values, x-major like [`Histogram2D`].
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Kernel radius in cells: `floor(truncate * sigma + 0.5)`, saturating.
pub fn kernel_radius(sigma: f64, truncate: f64) -> usize {
    (truncate * sigma + 0.5) as usize
}

/// Normalized discrete Gaussian weights over `-radius..=radius`.
pub fn gaussian_kernel(sigma: f64, radius: usize) -> Vec<f64> {
    let denom = -0.5 / (sigma * sigma);
    let mut weights: Vec<f64> = (0..=2 * radius)
        .map(|k| {
            let d = k as f64 - radius as f64;
            (denom * d * d).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Convolve an `nx × ny` x-major grid with an isotropic Gaussian.
///
/// Zero padding at the borders; mass near the edges leaks out of the grid.
/// The radius is capped at the grid extent, since taps further out only
/// ever meet padding. Capping rescales the output by a constant factor,
/// which [`estimate_density`] normalizes away.
pub fn gaussian_filter(grid: &[f64], nx: usize, ny: usize, sigma: f64) -> Result<Vec<f64>> {
    if !(sigma > 0.0) || !sigma.is_finite() {
        return Err(GateError::InvalidArgument(format!(
            "sigma must be positive and finite, got {}",
            sigma
        )));
    }
    if grid.len() != nx * ny {
        return Err(GateError::DimensionMismatch {
            expected: nx * ny,
            actual: grid.len(),
        });
    }
    if grid.is_empty() {
        return Ok(Vec::new());
    }

    let max_radius = nx.max(ny) - 1;
    let kernel = gaussian_kernel(sigma, kernel_radius(sigma, TRUNCATE).min(max_radius));
    let radius = (kernel.len() / 2) as isize;

    // Pass along x: output cell (i, j) mixes input cells (i + k, j)
    let mut along_x = vec![0.0; nx * ny];
    along_x
        .par_chunks_mut(ny)
        .enumerate()
        .for_each(|(i, out_row)| {
            for (k, &w) in kernel.iter().enumerate() {
                let src = i as isize + k as isize - radius;
                if src < 0 || src >= nx as isize {
                    continue;
                }
                let in_row = &grid[src as usize * ny..(src as usize + 1) * ny];
                for (out, &v) in out_row.iter_mut().zip(in_row) {
                    *out += w * v;
                }
            }
        });

    // Pass along y within each x row
    let mut smoothed = vec![0.0; nx * ny];
    smoothed
        .par_chunks_mut(ny)
        .zip(along_x.par_chunks(ny))
        .for_each(|(out_row, in_row)| {
            for (j, out) in out_row.iter_mut().enumerate() {
                let mut acc = 0.0;
                for (k, &w) in kernel.iter().enumerate() {
                    let src = j as isize + k as isize - radius;
                    if src >= 0 && src < ny as isize {
                        acc += w * in_row[src as usize];
                    }
                }
                *out = acc;
            }
        });

    Ok(smoothed)
}

/// Smooth raw counts with a Gaussian of standard deviation `sigma` (in bins)
/// and normalize the result into a probability mass function.
pub fn estimate_density(histogram: &Histogram2D, sigma: f64) -> Result<DensityField> {
    let (nx, ny) = histogram.shape();
    let raw: Vec<f64> = histogram.counts().iter().map(|&c| c as f64).collect();
    let mut values = gaussian_filter(&raw, nx, ny, sigma)?;

    let total: f64 = values.iter().sum();
    if !(total > 0.0) || !total.is_finite() {
        return Err(GateError::EmptyOrDegenerateInput(format!(
            "Smoothed histogram has no mass (sum = {}), cannot normalize",
            total
        )));
    }
    for v in &mut values {
        *v /= total;
    }

    Ok(DensityField { values, nx, ny })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::bin_points;
    use approx::assert_relative_eq;

    #[test]
    fn test_kernel_normalized_and_symmetric() {
        let kernel = gaussian_kernel(2.0, kernel_radius(2.0, TRUNCATE));
        assert_eq!(kernel.len(), 2 * 12 + 1);
        assert_relative_eq!(kernel.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        for k in 0..kernel.len() / 2 {
            assert_relative_eq!(kernel[k], kernel[kernel.len() - 1 - k]);
        }
        assert!(kernel[12] > kernel[11]);
    }

    #[test]
    fn test_filter_impulse_matches_outer_product() {
        // A single impulse in the middle spreads into the separable kernel
        let (nx, ny) = (9, 9);
        let mut grid = vec![0.0; nx * ny];
        grid[4 * ny + 4] = 1.0;
        let kernel = gaussian_kernel(0.5, kernel_radius(0.5, TRUNCATE));
        let r = kernel.len() / 2;

        let smoothed = gaussian_filter(&grid, nx, ny, 0.5).unwrap();
        assert_relative_eq!(smoothed.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(smoothed[4 * ny + 4], kernel[r] * kernel[r], epsilon = 1e-12);
        assert_relative_eq!(smoothed[5 * ny + 4], kernel[r + 1] * kernel[r], epsilon = 1e-12);
    }

    #[test]
    fn test_filter_zero_padding_loses_edge_mass() {
        let (nx, ny) = (5, 5);
        let mut grid = vec![0.0; nx * ny];
        grid[0] = 1.0;
        let smoothed = gaussian_filter(&grid, nx, ny, 1.0).unwrap();
        let total: f64 = smoothed.iter().sum();
        assert!(total < 0.5);
        assert!(total > 0.0);
    }

    #[test]
    fn test_filter_rejects_bad_sigma() {
        let grid = vec![1.0; 4];
        assert!(gaussian_filter(&grid, 2, 2, 0.0).is_err());
        assert!(gaussian_filter(&grid, 2, 2, -1.0).is_err());
        assert!(gaussian_filter(&grid, 2, 2, f64::NAN).is_err());
    }

    #[test]
    fn test_estimate_density_sums_to_one() {
        let xs = [0.1, 0.2, 1.5, 2.5, 2.6, 2.7];
        let ys = [0.1, 0.3, 1.5, 2.5, 2.6, 2.9];
        let edges = vec![0.0, 1.0, 2.0, 3.0];
        let (hist, _) = bin_points(&xs, &ys, edges.clone(), edges).unwrap();

        let density = estimate_density(&hist, 1.0).unwrap();
        assert_eq!(density.shape(), (3, 3));
        assert_relative_eq!(density.values().iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert!(density.get(2, 2) > density.get(0, 2));
    }

    #[test]
    fn test_huge_sigma_capped_to_grid() {
        let (nx, ny) = (3, 4);
        let mut grid = vec![0.0; nx * ny];
        grid[0] = 2.0;
        grid[7] = 1.0;
        let smoothed = gaussian_filter(&grid, nx, ny, 1e17).unwrap();
        assert_eq!(smoothed.len(), nx * ny);
        assert!(smoothed.iter().all(|v| v.is_finite() && *v > 0.0));
        // Weights are flat at this width, so every cell sees the same mass
        for v in &smoothed {
            assert_relative_eq!(*v, smoothed[0], max_relative = 1e-9);
        }
    }

    #[test]
    fn test_capped_radius_matches_after_normalization() {
        // sigma 3 reaches past a 4x4 grid; the capped kernel must agree
        // with the full one once both are normalized
        let (nx, ny) = (4, 4);
        let grid: Vec<f64> = (0..nx * ny).map(|i| (i % 5) as f64).collect();
        let capped = gaussian_filter(&grid, nx, ny, 3.0).unwrap();

        let full = gaussian_kernel(3.0, kernel_radius(3.0, TRUNCATE));
        let r = (full.len() / 2) as isize;
        let mut expected = vec![0.0; nx * ny];
        for i in 0..nx as isize {
            for j in 0..ny as isize {
                let mut acc = 0.0;
                for si in 0..nx as isize {
                    for sj in 0..ny as isize {
                        let (di, dj) = (si - i + r, sj - j + r);
                        acc += full[di as usize] * full[dj as usize]
                            * grid[(si as usize) * ny + sj as usize];
                    }
                }
                expected[(i as usize) * ny + j as usize] = acc;
            }
        }

        let capped_total: f64 = capped.iter().sum();
        let expected_total: f64 = expected.iter().sum();
        for (c, e) in capped.iter().zip(&expected) {
            assert_relative_eq!(c / capped_total, e / expected_total, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_density_gate_sized_grid_with_huge_sigma() {
        let xs: Vec<f64> = (0..50).map(|i| (i % 7) as f64).collect();
        let ys: Vec<f64> = (0..50).map(|i| (i % 3) as f64).collect();
        let edges_x = crate::density::equal_width_edges(&xs, 10).unwrap();
        let edges_y = crate::density::equal_width_edges(&ys, 10).unwrap();
        let (hist, _) = bin_points(&xs, &ys, edges_x, edges_y).unwrap();

        let density = estimate_density(&hist, 1e17).unwrap();
        assert_relative_eq!(density.values().iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_estimate_density_zero_mass() {
        let (hist, _) = bin_points(&[5.0], &[5.0], vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        assert!(matches!(
            estimate_density(&hist, 1.0),
            Err(GateError::EmptyOrDegenerateInput(_))
        ));
    }
}
