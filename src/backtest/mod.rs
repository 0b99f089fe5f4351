//! Walk-forward backtesting.
//!
//! Replays a recorded outcome series through the estimator: after a
//! warmup of `min_history` rounds, each round is predicted before it is
//! recorded, so the estimator never sees an outcome ahead of its own
//! forecast. Collects prediction-outcome pairs for calibration and
//! settles a fixed-stake ledger on every Bet recommendation.

pub mod calibration;

use serde::Serialize;
use tracing::{debug, info};

use crate::estimator::Estimator;
use crate::types::{CrashcastError, Query, Recommendation};
use calibration::{CalibrationReport, Calibrator};

// ---------------------------------------------------------------------------
// Replay configuration & report
// ---------------------------------------------------------------------------

/// Replay parameters: the fixed bet evaluated at every round.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    pub target: f64,
    pub stake: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            target: 2.0,
            stake: 10.0,
        }
    }
}

/// Aggregate results of a walk-forward replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub rounds_replayed: usize,
    pub predictions_made: usize,
    pub bets_advised: usize,
    pub wins: usize,
    pub losses: usize,
    /// Net profit of following every Bet recommendation at the fixed stake.
    pub net_profit: f64,
    pub calibration: CalibrationReport,
}

impl ReplayReport {
    pub fn win_rate(&self) -> f64 {
        let settled = self.wins + self.losses;
        if settled == 0 {
            0.0
        } else {
            self.wins as f64 / settled as f64
        }
    }
}

// ---------------------------------------------------------------------------
// Replayer
// ---------------------------------------------------------------------------

/// Drives an estimator over a historical multiplier series.
pub struct Replayer {
    config: ReplayConfig,
}

impl Replayer {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }

    /// Replay the series through the given (fresh) estimator.
    ///
    /// Rounds inside the warmup window are recorded without predicting.
    /// Invalid multipliers in the series fail the whole replay — a
    /// recorded series should never contain them.
    pub fn run(
        &self,
        estimator: &mut Estimator,
        series: &[f64],
    ) -> Result<ReplayReport, CrashcastError> {
        let query = Query::new(self.config.target, self.config.stake);
        query.validate()?;

        let mut calibrator = Calibrator::new();
        let mut predictions_made = 0;
        let mut bets_advised = 0;
        let mut wins = 0;
        let mut losses = 0;
        let mut net_profit = 0.0;

        for &multiplier in series {
            match estimator.predict(&query) {
                Ok(prediction) => {
                    predictions_made += 1;
                    let hit = multiplier >= self.config.target;
                    calibrator.add_point(prediction.probability, hit);

                    if prediction.recommendation == Recommendation::Bet {
                        bets_advised += 1;
                        if hit {
                            wins += 1;
                            net_profit += self.config.stake * (self.config.target - 1.0);
                        } else {
                            losses += 1;
                            net_profit -= self.config.stake;
                        }
                    }
                }
                Err(CrashcastError::InsufficientHistory { .. }) => {
                    // Still in warmup — record and move on.
                }
                Err(e) => return Err(e),
            }

            estimator.record(multiplier)?;
            debug!(multiplier, predictions_made, "Round replayed");
        }

        let report = ReplayReport {
            rounds_replayed: series.len(),
            predictions_made,
            bets_advised,
            wins,
            losses,
            net_profit,
            calibration: calibrator.report(),
        };

        info!(
            rounds = report.rounds_replayed,
            predictions = report.predictions_made,
            bets = report.bets_advised,
            win_rate = format!("{:.1}%", report.win_rate() * 100.0),
            net_profit = format!("${:+.2}", report.net_profit),
            brier = format!("{:.4}", report.calibration.brier_score),
            "Replay complete"
        );

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
