//! The estimator core.
//!
//! Owns the bounded outcome history and the scoring model, and answers
//! "how likely does the next round reach target t, and should this stake
//! be placed" queries by blending the empirical hit fraction with the
//! model score.
//!
//! Synchronous and single-threaded by design: callers accessing it from
//! concurrent request handlers must wrap it in a mutual-exclusion
//! boundary (the dashboard uses a `tokio::sync::RwLock`).

use tracing::debug;

use crate::history::History;
use crate::model::ScoringModel;
use crate::types::{expected_value, CrashcastError, Outcome, Prediction, Query, Recommendation};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Estimator tuning parameters (defaults overridden by config.toml).
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// Maximum outcomes retained; oldest evicted first.
    pub capacity: usize,
    /// Minimum outcomes before predictions are served. Below this,
    /// `predict` refuses rather than produce false confidence.
    pub min_history: usize,
    /// Rolling window for summary statistics.
    pub summary_window: usize,
    /// Weight of the empirical hit fraction in the blend; the model
    /// score gets the complement.
    pub empirical_weight: f64,
    /// Blended probability at or above which the recommendation is Bet.
    pub bet_threshold: f64,
    /// History length at which coverage confidence saturates.
    pub confidence_saturation: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            capacity: 500,
            min_history: 10,
            summary_window: 10,
            empirical_weight: 0.5,
            bet_threshold: 0.5,
            confidence_saturation: 50,
        }
    }
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

/// Request/response prediction engine over a mutable bounded history.
pub struct Estimator {
    history: History,
    model: Box<dyn ScoringModel>,
    config: EstimatorConfig,
}

impl Estimator {
    pub fn new(config: EstimatorConfig, model: Box<dyn ScoringModel>) -> Self {
        Self {
            history: History::new(config.capacity),
            model,
            config,
        }
    }

    /// Append an observed crash multiplier.
    ///
    /// Rejects multipliers below 1.0 or non-finite values with
    /// `InvalidOutcome`; the history is unchanged on error. At capacity,
    /// the oldest outcome is evicted.
    pub fn record(&mut self, multiplier: f64) -> Result<(), CrashcastError> {
        let outcome = Outcome::new(multiplier)?;
        self.history.push(outcome);
        debug!(
            multiplier,
            retained = self.history.len(),
            revision = self.history.revision(),
            "Outcome recorded"
        );
        Ok(())
    }

    /// Estimate the probability that the next round reaches the queried
    /// target, and derive a bet/skip recommendation.
    ///
    /// Fails with `InsufficientHistory` below `min_history`, and with
    /// `Model` when the scoring model errors or returns a value outside
    /// [0, 1]. Either failure is fatal to this call only — the estimator
    /// stays valid and usable.
    pub fn predict(&self, query: &Query) -> Result<Prediction, CrashcastError> {
        query.validate()?;

        let have = self.history.len();
        if have < self.config.min_history {
            return Err(CrashcastError::InsufficientHistory {
                have,
                need: self.config.min_history,
            });
        }

        let empirical = self.history.hit_fraction(query.target);
        // Non-empty by the min_history check above.
        let summary = self
            .history
            .summary(self.config.summary_window, query.target)
            .ok_or(CrashcastError::InsufficientHistory {
                have,
                need: self.config.min_history,
            })?;

        let score = self.model.score(&summary, query.target)?;
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(CrashcastError::Model {
                name: self.model.name().to_string(),
                message: format!("score {score} outside [0, 1]"),
            });
        }

        let w = self.config.empirical_weight.clamp(0.0, 1.0);
        let probability = (w * empirical + (1.0 - w) * score).clamp(0.0, 1.0);

        let recommendation = if probability >= self.config.bet_threshold {
            Recommendation::Bet
        } else {
            Recommendation::Skip
        };

        let confidence = self.confidence(have, empirical, score);
        let ev = expected_value(query.stake, query.target, probability);

        debug!(
            target = query.target,
            stake = query.stake,
            probability = format!("{:.1}%", probability * 100.0),
            empirical = format!("{:.1}%", empirical * 100.0),
            model_score = format!("{:.1}%", score * 100.0),
            confidence = format!("{:.0}%", confidence * 100.0),
            recommendation = %recommendation,
            ev = format!("${:+.2}", ev),
            "Prediction computed"
        );

        Ok(Prediction {
            probability,
            recommendation,
            confidence,
            empirical,
            model_score: score,
            expected_value: ev,
            revision: self.history.revision(),
        })
    }

    /// Clear the history. Used when switching to a new game session.
    pub fn reset(&mut self) {
        self.history.clear();
        debug!("History reset");
    }

    /// Coverage (how full the window is) scaled down by disagreement
    /// between the empirical and model components.
    fn confidence(&self, have: usize, empirical: f64, score: f64) -> f64 {
        let saturation = self
            .config
            .confidence_saturation
            .min(self.config.capacity)
            .max(1);
        let coverage = (have as f64 / saturation as f64).min(1.0);
        let agreement = 1.0 - (empirical - score).abs();
        (coverage * agreement).clamp(0.0, 1.0)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HouseEdgeModel, MockScoringModel};
    use crate::types::HistorySummary;

    fn make_estimator(config: EstimatorConfig) -> Estimator {
        Estimator::new(config, Box::new(HouseEdgeModel::new(0.01)))
    }

    fn mock_model(score: f64) -> Box<MockScoringModel> {
        let mut model = MockScoringModel::new();
        model.expect_score().returning(move |_, _| Ok(score));
        model.expect_name().return_const("mock".to_string());
        Box::new(model)
    }

    fn fill(est: &mut Estimator, multipliers: &[f64]) {
        for &m in multipliers {
            est.record(m).unwrap();
        }
    }

    /// Five rounds each hitting 2x or busting before it, plus padding so
    /// min_history is satisfied.
    const SERIES: [f64; 10] = [1.5, 2.0, 3.0, 1.2, 5.0, 1.1, 2.5, 1.8, 4.0, 1.3];

    #[test]
    fn test_record_invalid_leaves_history_unchanged() {
        let mut est = make_estimator(EstimatorConfig::default());
        est.record(2.0).unwrap();
        let revision_before = est.history().revision();

        let err = est.record(0.5).unwrap_err();
        assert!(matches!(err, CrashcastError::InvalidOutcome { .. }));
        assert_eq!(est.history().len(), 1);
        assert_eq!(est.history().revision(), revision_before);
    }

    #[test]
    fn test_capacity_bound_respected() {
        let mut est = make_estimator(EstimatorConfig {
            capacity: 5,
            min_history: 3,
            ..Default::default()
        });
        for i in 0..50 {
            est.record(1.0 + i as f64 * 0.1).unwrap();
        }
        assert_eq!(est.history().len(), 5);
    }

    #[test]
    fn test_predict_insufficient_history() {
        let mut est = make_estimator(EstimatorConfig {
            min_history: 10,
            ..Default::default()
        });
        fill(&mut est, &[1.5, 2.0, 3.0]);

        let err = est.predict(&Query::new(2.0, 10.0)).unwrap_err();
        assert!(matches!(
            err,
            CrashcastError::InsufficientHistory { have: 3, need: 10 }
        ));
    }

    #[test]
    fn test_predict_empty_history() {
        let est = make_estimator(EstimatorConfig::default());
        let err = est.predict(&Query::new(2.0, 10.0)).unwrap_err();
        assert!(matches!(
            err,
            CrashcastError::InsufficientHistory { have: 0, .. }
        ));
    }

    #[test]
    fn test_reset_then_predict_refuses() {
        let mut est = make_estimator(EstimatorConfig {
            min_history: 5,
            ..Default::default()
        });
        fill(&mut est, &SERIES);
        assert!(est.predict(&Query::new(2.0, 10.0)).is_ok());

        est.reset();
        let err = est.predict(&Query::new(2.0, 10.0)).unwrap_err();
        assert!(matches!(
            err,
            CrashcastError::InsufficientHistory { have: 0, need: 5 }
        ));
    }

    #[test]
    fn test_predict_invalid_query() {
        let mut est = make_estimator(EstimatorConfig::default());
        fill(&mut est, &SERIES);

        assert!(matches!(
            est.predict(&Query::new(0.5, 10.0)).unwrap_err(),
            CrashcastError::InvalidQuery(_)
        ));
        assert!(matches!(
            est.predict(&Query::new(2.0, -1.0)).unwrap_err(),
            CrashcastError::InvalidQuery(_)
        ));
    }

    #[test]
    fn test_probability_within_bounds() {
        let mut est = make_estimator(EstimatorConfig::default());
        fill(&mut est, &SERIES);

        for target in [1.0, 1.5, 2.0, 5.0, 100.0] {
            let p = est.predict(&Query::new(target, 10.0)).unwrap();
            assert!((0.0..=1.0).contains(&p.probability), "target {target}");
            assert!((0.0..=1.0).contains(&p.confidence));
        }
    }

    #[test]
    fn test_full_empirical_weight_reproduces_hit_fraction() {
        let mut est = Estimator::new(
            EstimatorConfig {
                min_history: 5,
                empirical_weight: 1.0,
                ..Default::default()
            },
            mock_model(0.9),
        );
        fill(&mut est, &[1.5, 2.0, 3.0, 1.2, 5.0]);

        // A 2.5x target is reached by 2 of 5 retained rounds.
        let p = est.predict(&Query::new(2.5, 10.0)).unwrap();
        assert!((p.probability - 0.4).abs() < 1e-10);
        assert!((p.empirical - 0.4).abs() < 1e-10);
    }

    #[test]
    fn test_zero_empirical_weight_reproduces_model_score() {
        let mut est = Estimator::new(
            EstimatorConfig {
                min_history: 5,
                empirical_weight: 0.0,
                ..Default::default()
            },
            mock_model(0.73),
        );
        fill(&mut est, &SERIES);

        let p = est.predict(&Query::new(2.0, 10.0)).unwrap();
        assert!((p.probability - 0.73).abs() < 1e-10);
        assert!((p.model_score - 0.73).abs() < 1e-10);
    }

    #[test]
    fn test_recommendation_threshold() {
        let mut est = Estimator::new(
            EstimatorConfig {
                min_history: 5,
                empirical_weight: 0.0,
                bet_threshold: 0.5,
                ..Default::default()
            },
            mock_model(0.5),
        );
        fill(&mut est, &SERIES);
        // Exactly at the threshold counts as Bet.
        let p = est.predict(&Query::new(2.0, 10.0)).unwrap();
        assert_eq!(p.recommendation, Recommendation::Bet);

        let mut est = Estimator::new(
            EstimatorConfig {
                min_history: 5,
                empirical_weight: 0.0,
                bet_threshold: 0.5,
                ..Default::default()
            },
            mock_model(0.49),
        );
        fill(&mut est, &SERIES);
        let p = est.predict(&Query::new(2.0, 10.0)).unwrap();
        assert_eq!(p.recommendation, Recommendation::Skip);
    }

    #[test]
    fn test_model_score_out_of_range_fails_call_only() {
        let mut model = MockScoringModel::new();
        model.expect_score().returning(|_, _| Ok(1.5));
        model.expect_name().return_const("broken".to_string());

        let mut est = Estimator::new(
            EstimatorConfig {
                min_history: 5,
                ..Default::default()
            },
            Box::new(model),
        );
        fill(&mut est, &SERIES);

        let err = est.predict(&Query::new(2.0, 10.0)).unwrap_err();
        assert!(matches!(err, CrashcastError::Model { .. }));

        // The estimator stays usable: recording and later predicts work.
        est.record(3.0).unwrap();
        assert_eq!(est.history().len(), 11);
    }

    #[test]
    fn test_model_error_propagates() {
        let mut model = MockScoringModel::new();
        model.expect_score().returning(|_, _| {
            Err(CrashcastError::Model {
                name: "mock".into(),
                message: "artifact gone".into(),
            })
        });
        model.expect_name().return_const("mock".to_string());

        let mut est = Estimator::new(
            EstimatorConfig {
                min_history: 5,
                ..Default::default()
            },
            Box::new(model),
        );
        fill(&mut est, &SERIES);

        assert!(matches!(
            est.predict(&Query::new(2.0, 10.0)).unwrap_err(),
            CrashcastError::Model { .. }
        ));
    }

    #[test]
    fn test_expected_value_in_prediction() {
        let mut est = Estimator::new(
            EstimatorConfig {
                min_history: 5,
                empirical_weight: 0.0,
                ..Default::default()
            },
            mock_model(0.4),
        );
        fill(&mut est, &SERIES);

        // stake=10, target=3, p=0.4: EV = 10*2*0.4 - 10*0.6 = 2.0
        let p = est.predict(&Query::new(3.0, 10.0)).unwrap();
        assert!((p.expected_value - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_confidence_grows_with_coverage() {
        let config = EstimatorConfig {
            min_history: 5,
            confidence_saturation: 50,
            ..Default::default()
        };

        let mut small = Estimator::new(config.clone(), mock_model(0.5));
        fill(&mut small, &SERIES);
        let p_small = small.predict(&Query::new(2.0, 10.0)).unwrap();

        let mut large = Estimator::new(config, mock_model(0.5));
        for _ in 0..10 {
            fill(&mut large, &SERIES);
        }
        let p_large = large.predict(&Query::new(2.0, 10.0)).unwrap();

        assert!(p_large.confidence > p_small.confidence);
    }

    #[test]
    fn test_prediction_carries_history_revision() {
        let mut est = make_estimator(EstimatorConfig {
            min_history: 5,
            ..Default::default()
        });
        fill(&mut est, &SERIES);

        let p1 = est.predict(&Query::new(2.0, 10.0)).unwrap();
        est.record(2.0).unwrap();
        let p2 = est.predict(&Query::new(2.0, 10.0)).unwrap();
        // A stale prediction is detectable by its revision.
        assert!(p2.revision > p1.revision);
    }
}
