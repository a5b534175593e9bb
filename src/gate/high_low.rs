//! Per-channel open-interval thresholding.

use crate::data::{ChannelSelector, GateEvaluation, PointSet};
use crate::error::{GateError, Result};
use crate::gate::Gate;
use serde::{Deserialize, Serialize};

/// Keep events whose value on every selected channel lies strictly between
/// `low` and `high`.
///
/// Missing bounds fall back to the channel's instrument range when one is
/// attached, otherwise to negative/positive infinity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HighLowGate {
    /// Channels to test; all channels when `None`.
    pub channels: Option<ChannelSelector>,
    pub high: Option<f64>,
    pub low: Option<f64>,
}

impl HighLowGate {
    pub fn new(channels: Option<ChannelSelector>, low: Option<f64>, high: Option<f64>) -> Self {
        Self {
            channels,
            high,
            low,
        }
    }

    /// Effective (low, high) bounds for one channel.
    fn bounds(&self, points: &PointSet, channel: usize) -> (f64, f64) {
        let range = points.channel_info(channel).and_then(|info| info.range);
        let low = self
            .low
            .or(range.map(|r| r.0))
            .unwrap_or(f64::NEG_INFINITY);
        let high = self.high.or(range.map(|r| r.1)).unwrap_or(f64::INFINITY);
        (low, high)
    }
}

impl Gate for HighLowGate {
    fn name(&self) -> &'static str {
        "high_low"
    }

    fn evaluate(&self, points: &PointSet, _trace: bool) -> Result<GateEvaluation> {
        let channels = match &self.channels {
            Some(selector) => selector.resolve(points)?,
            None => (0..points.n_channels()).collect(),
        };
        if let (Some(low), Some(high)) = (self.low, self.high) {
            if high < low {
                return Err(GateError::InvalidArgument(format!(
                    "high ({}) cannot be less than low ({})",
                    high, low
                )));
            }
        }

        let bounds: Vec<(usize, f64, f64)> = channels
            .iter()
            .map(|&c| {
                let (low, high) = self.bounds(points, c);
                (c, low, high)
            })
            .collect();

        let mask = (0..points.n_rows())
            .map(|row| {
                bounds.iter().all(|&(c, low, high)| {
                    let v = points.get(row, c);
                    v > low && v < high
                })
            })
            .collect();

        Ok(GateEvaluation {
            mask,
            contours: Vec::new(),
        })
    }
}
