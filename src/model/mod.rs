//! Scoring models.
//!
//! Defines the `ScoringModel` trait — the opaque scoring capability
//! supplied by an external training pipeline — and provides two
//! implementations: an analytic house-edge baseline and a calibrated
//! model loaded from a JSON artifact.

pub mod baseline;
pub mod calibrated;

use anyhow::Result;
use tracing::info;

use crate::config::ModelConfig;
use crate::types::{CrashcastError, HistorySummary};

pub use baseline::HouseEdgeModel;
pub use calibrated::CalibratedModel;

/// Abstraction over probability scoring models.
///
/// Implementors map a history summary and a target multiplier to a
/// probability that the next round reaches the target. Scoring is pure
/// computation — no I/O happens inside `score`.
#[cfg_attr(test, mockall::automock)]
pub trait ScoringModel: Send + Sync {
    /// Score the probability that the next round reaches `target`.
    /// Must return a finite value in [0, 1].
    fn score(&self, summary: &HistorySummary, target: f64) -> Result<f64, CrashcastError>;

    /// Model identifier string.
    fn name(&self) -> &str;
}

/// Select and construct the configured scoring model.
///
/// Falls back to the analytic baseline when no artifact is configured.
pub fn load_model(cfg: &ModelConfig) -> Result<Box<dyn ScoringModel>> {
    match cfg.artifact_path.as_deref() {
        Some(path) => {
            let path = crate::config::resolve_placeholders(path)?;
            let model = CalibratedModel::load(&path)?;
            info!(model = model.name(), path = %path, "Loaded calibrated model artifact");
            Ok(Box::new(model))
        }
        None => {
            let model = HouseEdgeModel::new(cfg.house_edge);
            info!(
                model = model.name(),
                house_edge = cfg.house_edge,
                "Using analytic house-edge model"
            );
            Ok(Box::new(model))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;

    #[test]
    fn test_load_defaults_to_house_edge() {
        let cfg = ModelConfig::default();
        let model = load_model(&cfg).unwrap();
        assert_eq!(model.name(), "house-edge");
    }

    #[test]
    fn test_load_missing_artifact_fails() {
        let cfg = ModelConfig {
            artifact_path: Some("/nonexistent/model.json".into()),
            ..ModelConfig::default()
        };
        assert!(load_model(&cfg).is_err());
    }
}
