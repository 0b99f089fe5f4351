//! Analytic baseline model.
//!
//! Crash games publish a survival curve of the form P(M >= t) = (1 - e) / t
//! where `e` is the operator's house edge. The instant-bust mass at 1.0x
//! equals the edge. This is the default model when no trained artifact is
//! configured.

use crate::types::{CrashcastError, HistorySummary};

use super::ScoringModel;

/// Survival-curve model parameterised only by the house edge.
#[derive(Debug, Clone)]
pub struct HouseEdgeModel {
    house_edge: f64,
}

impl HouseEdgeModel {
    /// Build a model with the given house edge, clamped to [0, 1).
    pub fn new(house_edge: f64) -> Self {
        let house_edge = if house_edge.is_finite() {
            house_edge.clamp(0.0, 0.99)
        } else {
            0.0
        };
        Self { house_edge }
    }

    pub fn house_edge(&self) -> f64 {
        self.house_edge
    }
}

impl Default for HouseEdgeModel {
    fn default() -> Self {
        Self::new(0.01)
    }
}

impl ScoringModel for HouseEdgeModel {
    fn score(&self, _summary: &HistorySummary, target: f64) -> Result<f64, CrashcastError> {
        Ok(((1.0 - self.house_edge) / target).clamp(0.0, 1.0))
    }

    fn name(&self) -> &str {
        "house-edge"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_summary() -> HistorySummary {
        HistorySummary {
            count: 10,
            mean: 2.0,
            std_dev: 1.0,
            min: 1.0,
            max: 5.0,
            hit_fraction: 0.5,
            retained: 50,
        }
    }

    #[test]
    fn test_survival_curve() {
        let model = HouseEdgeModel::new(0.01);
        let s = make_summary();
        // P(M >= 2.0) = 0.99 / 2.0 = 0.495
        let p = model.score(&s, 2.0).unwrap();
        assert!((p - 0.495).abs() < 1e-10);
    }

    #[test]
    fn test_score_clamped_at_one() {
        let model = HouseEdgeModel::new(0.0);
        let s = make_summary();
        assert_eq!(model.score(&s, 1.0).unwrap(), 1.0);
    }

    #[test]
    fn test_score_monotone_in_target() {
        let model = HouseEdgeModel::default();
        let s = make_summary();
        let p2 = model.score(&s, 2.0).unwrap();
        let p5 = model.score(&s, 5.0).unwrap();
        assert!(p2 > p5);
    }

    #[test]
    fn test_edge_clamped() {
        assert_eq!(HouseEdgeModel::new(-0.5).house_edge(), 0.0);
        assert_eq!(HouseEdgeModel::new(1.5).house_edge(), 0.99);
        assert_eq!(HouseEdgeModel::new(f64::NAN).house_edge(), 0.0);
    }

    #[test]
    fn test_name() {
        assert_eq!(HouseEdgeModel::default().name(), "house-edge");
    }
}
