//! Elliptical region gate.
//!
//! An event is kept when, after subtracting the center and rotating by
//! `-theta` into the ellipse's own frame, it satisfies
//! `(x/a)^2 + (y/b)^2 <= 1`. With `log` set, both coordinates are taken
//! as `log10` first and the boundary is mapped back with `10^v`.

use crate::data::{ChannelSelector, Contour, GateEvaluation, Mask, PointSet};
use crate::error::{GateError, Result};
use crate::gate::Gate;
use nalgebra::{Rotation2, Vector2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Number of vertices in the boundary contour.
pub const CONTOUR_POINTS: usize = 100;

/// Ellipse with semi-axes `a` (along the rotated x axis) and `b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EllipseGate {
    #[serde(default)]
    pub channels: ChannelSelector,
    pub center: [f64; 2],
    pub a: f64,
    pub b: f64,
    /// Rotation of the ellipse in radians.
    #[serde(default)]
    pub theta: f64,
    /// Gate on `log10` of the channel values.
    #[serde(default)]
    pub log: bool,
}

impl EllipseGate {
    pub fn new(channels: ChannelSelector, center: [f64; 2], a: f64, b: f64) -> Self {
        Self {
            channels,
            center,
            a,
            b,
            theta: 0.0,
            log: false,
        }
    }

    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    pub fn with_log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    fn validate(&self) -> Result<()> {
        for (name, v) in [("a", self.a), ("b", self.b)] {
            if !(v > 0.0) || !v.is_finite() {
                return Err(GateError::InvalidArgument(format!(
                    "Semi-axis {} must be positive and finite, got {}",
                    name, v
                )));
            }
        }
        if !self.theta.is_finite() || self.center.iter().any(|c| !c.is_finite()) {
            return Err(GateError::InvalidArgument(
                "Ellipse center and angle must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Value of `(x'/a)^2 + (y'/b)^2` for a point in gating space.
    fn level(&self, to_frame: &Rotation2<f64>, x: f64, y: f64) -> f64 {
        let p = to_frame * Vector2::new(x - self.center[0], y - self.center[1]);
        (p.x / self.a).powi(2) + (p.y / self.b).powi(2)
    }

    /// Whether a point given in data coordinates lies inside the ellipse.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let to_frame = Rotation2::new(-self.theta);
        self.contains_with(&to_frame, x, y)
    }

    fn contains_with(&self, to_frame: &Rotation2<f64>, x: f64, y: f64) -> bool {
        let (x, y) = if self.log { (x.log10(), y.log10()) } else { (x, y) };
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        self.level(to_frame, x, y) <= 1.0
    }

    /// Boundary sampled at [`CONTOUR_POINTS`] equally spaced angles in `[0, 2π)`.
    pub fn boundary(&self) -> Contour {
        let to_data = Rotation2::new(self.theta);
        let center = Vector2::new(self.center[0], self.center[1]);
        let points = (0..CONTOUR_POINTS)
            .map(|k| {
                let t = 2.0 * PI * k as f64 / CONTOUR_POINTS as f64;
                let p = to_data * Vector2::new(self.a * t.cos(), self.b * t.sin()) + center;
                if self.log {
                    [10f64.powf(p.x), 10f64.powf(p.y)]
                } else {
                    [p.x, p.y]
                }
            })
            .collect();
        Contour::new(points)
    }
}

impl Gate for EllipseGate {
    fn name(&self) -> &'static str {
        "ellipse"
    }

    fn evaluate(&self, points: &PointSet, trace: bool) -> Result<GateEvaluation> {
        let (cx, cy) = self.channels.resolve_pair(points)?;
        self.validate()?;

        let to_frame = Rotation2::new(-self.theta);
        let flags: Vec<bool> = (0..points.n_rows())
            .into_par_iter()
            .map(|row| self.contains_with(&to_frame, points.get(row, cx), points.get(row, cy)))
            .collect();
        let mask = Mask::from(flags);

        let contours = if trace { vec![self.boundary()] } else { Vec::new() };
        Ok(GateEvaluation { mask, contours })
    }
}
