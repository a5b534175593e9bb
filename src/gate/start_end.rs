//! Positional trimming of the first and last events of an acquisition.

use crate::data::{GateEvaluation, Mask, PointSet};
use crate::error::{GateError, Result};
use crate::gate::Gate;
use serde::{Deserialize, Serialize};

/// Discard the first `num_start` and last `num_end` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartEndGate {
    pub num_start: usize,
    pub num_end: usize,
}

impl Default for StartEndGate {
    fn default() -> Self {
        Self {
            num_start: 250,
            num_end: 100,
        }
    }
}

impl StartEndGate {
    pub fn new(num_start: usize, num_end: usize) -> Self {
        Self { num_start, num_end }
    }
}

impl Gate for StartEndGate {
    fn name(&self) -> &'static str {
        "start_end"
    }

    fn evaluate(&self, points: &PointSet, _trace: bool) -> Result<GateEvaluation> {
        let n = points.n_rows();
        let discarded = self.num_start.checked_add(self.num_end);
        if discarded.map_or(true, |total| total > n) {
            return Err(GateError::InvalidArgument(format!(
                "Number of events to discard ({} + {}) greater than total number ({})",
                self.num_start, self.num_end, n
            )));
        }

        let end = n - self.num_end;
        let mask: Mask = (0..n).map(|i| i >= self.num_start && i < end).collect();

        Ok(GateEvaluation {
            mask,
            contours: Vec::new(),
        })
    }
}
