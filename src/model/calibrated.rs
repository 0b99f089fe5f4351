//! Calibrated model loaded from a JSON artifact.
//!
//! The external training pipeline exports a table of target bins with
//! calibrated hit probabilities. Scoring interpolates linearly between
//! bins and clamps outside the bin range. Artifacts are validated at
//! load time so a malformed export fails startup, not a predict call.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::types::{CrashcastError, HistorySummary};

use super::ScoringModel;

/// One calibration bin: the probability that a round reaches `target`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationBin {
    pub target: f64,
    pub probability: f64,
}

/// The JSON artifact exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    /// Bins sorted by strictly increasing target.
    pub bins: Vec<CalibrationBin>,
}

/// Scoring model backed by a calibrated bin table.
#[derive(Debug, Clone)]
pub struct CalibratedModel {
    name: String,
    bins: Vec<CalibrationBin>,
}

impl CalibratedModel {
    /// Load and validate an artifact from a JSON file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model artifact: {path}"))?;
        let artifact: ModelArtifact = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse model artifact: {path}"))?;
        Self::from_artifact(artifact)
    }

    /// Validate an already-parsed artifact.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        if artifact.bins.is_empty() {
            anyhow::bail!("Model artifact '{}' has no bins", artifact.name);
        }

        for bin in &artifact.bins {
            if !bin.target.is_finite() || bin.target < 1.0 {
                anyhow::bail!(
                    "Model artifact '{}': bin target {} must be finite and >= 1.0",
                    artifact.name,
                    bin.target
                );
            }
            if !bin.probability.is_finite() || !(0.0..=1.0).contains(&bin.probability) {
                anyhow::bail!(
                    "Model artifact '{}': bin probability {} out of [0, 1]",
                    artifact.name,
                    bin.probability
                );
            }
        }

        let sorted = artifact
            .bins
            .windows(2)
            .all(|w| w[0].target < w[1].target);
        if !sorted {
            anyhow::bail!(
                "Model artifact '{}': bin targets must be strictly increasing",
                artifact.name
            );
        }

        Ok(Self {
            name: artifact.name,
            bins: artifact.bins,
        })
    }

    /// Interpolate the calibrated probability for a target.
    fn interpolate(&self, target: f64) -> f64 {
        let first = &self.bins[0];
        let last = &self.bins[self.bins.len() - 1];

        if target <= first.target {
            return first.probability;
        }
        if target >= last.target {
            return last.probability;
        }

        for w in self.bins.windows(2) {
            let (lo, hi) = (&w[0], &w[1]);
            if target >= lo.target && target <= hi.target {
                let t = (target - lo.target) / (hi.target - lo.target);
                return lo.probability + t * (hi.probability - lo.probability);
            }
        }

        // Unreachable given the bounds checks above.
        last.probability
    }
}

impl ScoringModel for CalibratedModel {
    fn score(&self, _summary: &HistorySummary, target: f64) -> Result<f64, CrashcastError> {
        Ok(self.interpolate(target).clamp(0.0, 1.0))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
