//! Iso-density boundary extraction using marching squares.
//!
//! The field is sampled at bin centers. Each grid cell (four neighbouring
//! samples) is classified by which corners are at or above the level, the
//! crossing points on its edges are linearly interpolated, and the
//! resulting segments are chained into polylines through the grid edges
//! they share.

use crate::data::Contour;
use crate::density::{DensityField, Histogram2D};
use crate::error::{GateError, Result};
use log::trace;
use std::collections::HashMap;

/// Vertex classification of a traced path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathCode {
    /// Start a new sub-path at this vertex.
    MoveTo,
    /// Draw a line from the previous vertex.
    LineTo,
    /// Close the current sub-path.
    ClosePoly,
}

/// A traced polyline with one code per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedPath {
    pub vertices: Vec<[f64; 2]>,
    pub codes: Vec<PathCode>,
}

impl TracedPath {
    fn from_vertices(vertices: Vec<[f64; 2]>) -> Self {
        let codes = (0..vertices.len())
            .map(|i| if i == 0 { PathCode::MoveTo } else { PathCode::LineTo })
            .collect();
        Self { vertices, codes }
    }

    /// Convert into a contour, accepting only move/line vertices.
    pub fn into_contour(self) -> Result<Contour> {
        if self.codes.len() != self.vertices.len() {
            return Err(GateError::ContourExtraction(format!(
                "{} path codes for {} vertices",
                self.codes.len(),
                self.vertices.len()
            )));
        }
        if let Some(pos) = self
            .codes
            .iter()
            .position(|c| !matches!(c, PathCode::MoveTo | PathCode::LineTo))
        {
            return Err(GateError::ContourExtraction(format!(
                "unrecognized path code {:?} at vertex {}",
                self.codes[pos], pos
            )));
        }
        Ok(Contour::new(self.vertices))
    }
}

/// Grid edges are numbered: first the x-directed edges between (i, j) and
/// (i + 1, j), then the y-directed edges between (i, j) and (i, j + 1).
struct EdgeLayout {
    nx: usize,
    ny: usize,
}

impl EdgeLayout {
    #[inline]
    fn x_edge(&self, i: usize, j: usize) -> usize {
        i * self.ny + j
    }

    #[inline]
    fn y_edge(&self, i: usize, j: usize) -> usize {
        (self.nx - 1) * self.ny + i * (self.ny - 1) + j
    }

    /// The two sample nodes an edge joins, lower node first.
    fn nodes(&self, edge: usize) -> ((usize, usize), (usize, usize)) {
        let n_x_edges = (self.nx - 1) * self.ny;
        if edge < n_x_edges {
            let (i, j) = (edge / self.ny, edge % self.ny);
            ((i, j), (i + 1, j))
        } else {
            let e = edge - n_x_edges;
            let (i, j) = (e / (self.ny - 1), e % (self.ny - 1));
            ((i, j), (i, j + 1))
        }
    }
}

/// Trace the iso-level polylines of an `xs.len() × ys.len()` x-major field.
///
/// Open polylines (those running into the grid border) come first, then
/// closed loops, whose last vertex repeats the first.
pub fn trace_isolines(values: &[f64], xs: &[f64], ys: &[f64], level: f64) -> Vec<TracedPath> {
    let (nx, ny) = (xs.len(), ys.len());
    if nx < 2 || ny < 2 || values.len() != nx * ny {
        return Vec::new();
    }

    let layout = EdgeLayout { nx, ny };
    let at = |i: usize, j: usize| values[i * ny + j];
    let inside = |i: usize, j: usize| at(i, j) >= level;

    let mut segments: Vec<(usize, usize)> = Vec::new();
    for i in 0..nx - 1 {
        for j in 0..ny - 1 {
            let case = (inside(i, j) as u8)
                | (inside(i + 1, j) as u8) << 1
                | (inside(i + 1, j + 1) as u8) << 2
                | (inside(i, j + 1) as u8) << 3;

            let bottom = layout.x_edge(i, j);
            let right = layout.y_edge(i + 1, j);
            let top = layout.x_edge(i, j + 1);
            let left = layout.y_edge(i, j);

            match case {
                0 | 15 => {}
                5 | 10 => {
                    let center =
                        0.25 * (at(i, j) + at(i + 1, j) + at(i + 1, j + 1) + at(i, j + 1));
                    // Cut off the corners that are on the other side from the center
                    let cut_lower_left = (case == 5) != (center >= level);
                    if cut_lower_left {
                        segments.push((bottom, left));
                        segments.push((right, top));
                    } else {
                        segments.push((bottom, right));
                        segments.push((left, top));
                    }
                }
                _ => {
                    let crossed = |a: bool, b: bool| a != b;
                    let c00 = inside(i, j);
                    let c10 = inside(i + 1, j);
                    let c11 = inside(i + 1, j + 1);
                    let c01 = inside(i, j + 1);
                    let ends: Vec<usize> = [
                        (crossed(c00, c10), bottom),
                        (crossed(c10, c11), right),
                        (crossed(c01, c11), top),
                        (crossed(c00, c01), left),
                    ]
                    .iter()
                    .filter(|(hit, _)| *hit)
                    .map(|&(_, edge)| edge)
                    .collect();
                    segments.push((ends[0], ends[1]));
                }
            }
        }
    }

    let point = |edge: usize| -> [f64; 2] {
        let ((ia, ja), (ib, jb)) = layout.nodes(edge);
        let (za, zb) = (at(ia, ja), at(ib, jb));
        let t = (level - za) / (zb - za);
        [
            xs[ia] + t * (xs[ib] - xs[ia]),
            ys[ja] + t * (ys[jb] - ys[ja]),
        ]
    };

    let mut by_edge: HashMap<usize, Vec<usize>> = HashMap::new();
    for (s, &(a, b)) in segments.iter().enumerate() {
        by_edge.entry(a).or_default().push(s);
        by_edge.entry(b).or_default().push(s);
    }
    let degree = |edge: usize| by_edge.get(&edge).map_or(0, Vec::len);

    let mut used = vec![false; segments.len()];
    let walk = |start_edge: usize, first: usize, used: &mut Vec<bool>| -> Vec<usize> {
        let mut chain = vec![start_edge];
        let mut seg = first;
        let mut edge = start_edge;
        loop {
            used[seg] = true;
            let (a, b) = segments[seg];
            edge = if a == edge { b } else { a };
            chain.push(edge);
            if edge == start_edge {
                break;
            }
            let next = by_edge
                .get(&edge)
                .and_then(|segs| segs.iter().copied().find(|&s| !used[s]));
            match next {
                Some(s) => seg = s,
                None => break,
            }
        }
        chain
    };

    let mut chains: Vec<Vec<usize>> = Vec::new();
    for s in 0..segments.len() {
        if used[s] {
            continue;
        }
        let (a, b) = segments[s];
        if degree(a) == 1 {
            chains.push(walk(a, s, &mut used));
        } else if degree(b) == 1 {
            chains.push(walk(b, s, &mut used));
        }
    }
    let n_open = chains.len();
    for s in 0..segments.len() {
        if !used[s] {
            chains.push(walk(segments[s].0, s, &mut used));
        }
    }

    trace!(
        "level {:e}: {} segments, {} open and {} closed paths",
        level,
        segments.len(),
        n_open,
        chains.len() - n_open
    );

    chains
        .into_iter()
        .map(|chain| TracedPath::from_vertices(chain.into_iter().map(&point).collect()))
        .collect()
}

/// Boundary of the region where `density >= level`, in data coordinates.
pub fn trace_contours(
    density: &DensityField,
    histogram: &Histogram2D,
    level: f64,
) -> Result<Vec<Contour>> {
    let xs = histogram.centers_x();
    let ys = histogram.centers_y();
    if density.shape() != (xs.len(), ys.len()) {
        return Err(GateError::DimensionMismatch {
            expected: xs.len() * ys.len(),
            actual: density.values().len(),
        });
    }

    trace_isolines(density.values(), &xs, &ys, level)
        .into_iter()
        .map(TracedPath::into_contour)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn axis(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_single_peak_closed_loop() {
        // 3x3 field with a single peak in the middle
        let values = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        let paths = trace_isolines(&values, &axis(3), &axis(3), 0.5);

        assert_eq!(paths.len(), 1);
        let contour = paths[0].clone().into_contour().unwrap();
        assert!(contour.is_closed());
        // Diamond through the four edge midpoints, plus the closing vertex
        assert_eq!(contour.len(), 5);
        for p in &contour.points {
            let d = (p[0] - 1.0).abs() + (p[1] - 1.0).abs();
            assert_relative_eq!(d, 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_step_open_line() {
        // Left column low, right columns high: vertical line at x = 0.5
        let values = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let paths = trace_isolines(&values, &axis(3), &axis(3), 0.5);

        assert_eq!(paths.len(), 1);
        let contour = paths[0].clone().into_contour().unwrap();
        assert!(!contour.is_closed());
        assert_eq!(contour.len(), 3);
        for p in &contour.points {
            assert_relative_eq!(p[0], 0.5);
        }
    }

    #[test]
    fn test_two_peaks_two_loops() {
        // 5x3 field with peaks at x = 1 and x = 3
        let mut values = vec![0.0; 15];
        values[1 * 3 + 1] = 1.0;
        values[3 * 3 + 1] = 1.0;
        let paths = trace_isolines(&values, &axis(5), &axis(3), 0.5);

        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.vertices.first() == p.vertices.last()));
    }

    /// 2x2 field (x-major) with the high samples on the main diagonal.
    const DIAGONAL: [f64; 4] = [1.0, 0.0, 0.0, 1.0];

    fn assert_path(path: &TracedPath, expected: &[[f64; 2]]) {
        assert_eq!(path.vertices.len(), expected.len());
        for (v, e) in path.vertices.iter().zip(expected) {
            assert_relative_eq!(v[0], e[0], epsilon = 1e-12);
            assert_relative_eq!(v[1], e[1], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_saddle_center_inside_joins_diagonal() {
        // Center average 0.5 >= 0.25: the two outside corners are cut off
        let paths = trace_isolines(&DIAGONAL, &axis(2), &axis(2), 0.25);

        assert_eq!(paths.len(), 2);
        // bottom edge -> right edge, around corner (1, 0)
        assert_path(&paths[0], &[[0.75, 0.0], [1.0, 0.25]]);
        // left edge -> top edge, around corner (0, 1)
        assert_path(&paths[1], &[[0.0, 0.75], [0.25, 1.0]]);
        assert!(paths.iter().all(|p| !p.clone().into_contour().unwrap().is_closed()));
    }

    #[test]
    fn test_saddle_center_outside_separates_diagonal() {
        // Center average 0.5 < 0.75: the two inside corners are cut off
        let paths = trace_isolines(&DIAGONAL, &axis(2), &axis(2), 0.75);

        assert_eq!(paths.len(), 2);
        // bottom edge -> left edge, around corner (0, 0)
        assert_path(&paths[0], &[[0.25, 0.0], [0.0, 0.25]]);
        // right edge -> top edge, around corner (1, 1)
        assert_path(&paths[1], &[[1.0, 0.75], [0.75, 1.0]]);
    }

    #[test]
    fn test_saddle_anti_diagonal() {
        // High samples at (1, 0) and (0, 1); center 0.5 >= 0.25 keeps them joined
        let values = [0.0, 1.0, 1.0, 0.0];
        let paths = trace_isolines(&values, &axis(2), &axis(2), 0.25);

        assert_eq!(paths.len(), 2);
        // bottom edge -> left edge, around corner (0, 0)
        assert_path(&paths[0], &[[0.25, 0.0], [0.0, 0.25]]);
        // right edge -> top edge, around corner (1, 1)
        assert_path(&paths[1], &[[1.0, 0.75], [0.75, 1.0]]);
    }

    #[test]
    fn test_flat_field_has_no_contour() {
        let values = vec![1.0; 9];
        assert!(trace_isolines(&values, &axis(3), &axis(3), 0.5).is_empty());
        assert!(trace_isolines(&values, &axis(3), &axis(3), 2.0).is_empty());
    }

    #[test]
    fn test_degenerate_grid() {
        assert!(trace_isolines(&[1.0, 2.0], &axis(2), &axis(1), 1.5).is_empty());
    }

    #[test]
    fn test_codes_move_then_line() {
        let values = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        let path = &trace_isolines(&values, &axis(3), &axis(3), 0.5)[0];
        assert_eq!(path.codes[0], PathCode::MoveTo);
        assert!(path.codes[1..].iter().all(|&c| c == PathCode::LineTo));
    }

    #[test]
    fn test_unrecognized_code_rejected() {
        let path = TracedPath {
            vertices: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]],
            codes: vec![PathCode::MoveTo, PathCode::LineTo, PathCode::ClosePoly],
        };
        assert!(matches!(
            path.into_contour(),
            Err(GateError::ContourExtraction(_))
        ));
    }
}
