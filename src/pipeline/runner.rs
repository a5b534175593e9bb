//! Pipeline runner for applying gates in sequence.

use crate::data::{ChannelSelector, Contour, Mask, PointSet};
use crate::density::BinSpec;
use crate::error::{GateError, Result};
use crate::gate::{Density2dGate, EllipseGate, Gate, HighLowGate, StartEndGate};
use log::info;
use serde::{Deserialize, Serialize};

/// A step in the gating pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum GateStep {
    /// Discard the first and last events of the acquisition.
    StartEnd(StartEndGate),
    /// Keep events strictly inside per-channel bounds.
    HighLow(HighLowGate),
    /// Keep events inside an ellipse.
    Ellipse(EllipseGate),
    /// Keep events in the highest-density region.
    Density2d(Density2dGate),
}

impl GateStep {
    /// The gate this step runs.
    pub fn as_gate(&self) -> &dyn Gate {
        match self {
            GateStep::StartEnd(g) => g,
            GateStep::HighLow(g) => g,
            GateStep::Ellipse(g) => g,
            GateStep::Density2d(g) => g,
        }
    }
}

/// Pipeline configuration for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the pipeline.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Steps to execute.
    pub steps: Vec<GateStep>,
}

impl PipelineConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(GateError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(GateError::from)
    }
}

/// What one step did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSummary {
    /// Gate name.
    pub gate: String,
    /// Events entering the step.
    pub n_before: usize,
    /// Events surviving the step.
    pub n_after: usize,
    /// Boundary contours drawn by the gate.
    pub contours: Vec<Contour>,
}

/// Result of running a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Events surviving every step, in original order.
    pub gated: PointSet,
    /// Mask over the original events.
    pub mask: Mask,
    /// Per-step summaries, in execution order.
    pub steps: Vec<StepSummary>,
}

impl PipelineResult {
    /// Contours of every step, tagged with the step position.
    pub fn contours(&self) -> Vec<(usize, &Contour)> {
        self.steps
            .iter()
            .enumerate()
            .flat_map(|(i, s)| s.contours.iter().map(move |c| (i, c)))
            .collect()
    }

    /// Write the per-step summaries (with contours) as JSON.
    pub fn steps_to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.steps).map_err(GateError::from)
    }
}

impl std::fmt::Display for PipelineResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Gating Pipeline Result")?;
        writeln!(f, "  Events before: {}", self.mask.len())?;
        writeln!(f, "  Events after:  {}", self.gated.n_rows())?;
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(
                f,
                "  [{}] {:<10} {} -> {} ({} contour(s))",
                i + 1,
                step.gate,
                step.n_before,
                step.n_after,
                step.contours.len()
            )?;
        }
        Ok(())
    }
}

/// Builder for constructing and running gating pipelines.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<GateStep>,
    name: String,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            name: "unnamed".to_string(),
        }
    }

    /// Create from a config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            steps: config.steps.clone(),
            name: config.name.clone(),
        }
    }

    /// Set the pipeline name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Add an arbitrary step.
    pub fn step(mut self, step: GateStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Discard the first `num_start` and last `num_end` events.
    pub fn start_end(self, num_start: usize, num_end: usize) -> Self {
        self.step(GateStep::StartEnd(StartEndGate::new(num_start, num_end)))
    }

    /// Keep events strictly between `low` and `high` on the given channels.
    pub fn high_low(
        self,
        channels: Option<ChannelSelector>,
        low: Option<f64>,
        high: Option<f64>,
    ) -> Self {
        self.step(GateStep::HighLow(HighLowGate::new(channels, low, high)))
    }

    /// Keep events inside an ellipse.
    pub fn ellipse(self, gate: EllipseGate) -> Self {
        self.step(GateStep::Ellipse(gate))
    }

    /// Keep the densest `gate_fraction` of events on two channels.
    pub fn density2d(
        self,
        channels: ChannelSelector,
        bins: BinSpec,
        gate_fraction: f64,
        sigma: f64,
    ) -> Self {
        self.step(GateStep::Density2d(Density2dGate {
            channels,
            bins,
            gate_fraction,
            sigma,
        }))
    }

    /// Get the steps.
    pub fn steps(&self) -> &[GateStep] {
        &self.steps
    }

    /// Convert to a serializable config.
    pub fn to_config(&self, description: Option<&str>) -> PipelineConfig {
        PipelineConfig {
            name: self.name.clone(),
            description: description.map(|s| s.to_string()),
            steps: self.steps.clone(),
        }
    }

    /// Run every step on the survivors of the previous one.
    pub fn run(&self, points: &PointSet) -> Result<PipelineResult> {
        let mut current = points.clone();
        let mut mask = Mask::filled(points.n_rows(), true);
        let mut summaries = Vec::with_capacity(self.steps.len());

        for (i, step) in self.steps.iter().enumerate() {
            let gate = step.as_gate();
            let n_before = current.n_rows();
            let output = gate.apply(&current)?;
            mask = mask.compose(&output.mask)?;

            info!(
                "pipeline '{}' step {} ({}): {} -> {} events",
                self.name,
                i + 1,
                gate.name(),
                n_before,
                output.gated.n_rows()
            );

            summaries.push(StepSummary {
                gate: gate.name().to_string(),
                n_before,
                n_after: output.gated.n_rows(),
                contours: output.contours,
            });
            current = output.gated;
        }

        Ok(PipelineResult {
            gated: current,
            mask,
            steps: summaries,
        })
    }
}
