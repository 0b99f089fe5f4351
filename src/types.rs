//! Shared types for the CRASHCAST estimator.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that history, model, estimator,
//! and dashboard modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// A single observed crash multiplier from a completed round.
///
/// Immutable once recorded. The constructor validates the multiplier,
/// so an `Outcome` in a `History` is always finite and >= 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Outcome {
    pub multiplier: f64,
    pub observed_at: DateTime<Utc>,
}

impl Outcome {
    /// Build an outcome observed now. Rejects multipliers below 1.0
    /// or non-finite values.
    pub fn new(multiplier: f64) -> Result<Self, CrashcastError> {
        Self::at(multiplier, Utc::now())
    }

    /// Build an outcome with an explicit observation timestamp.
    pub fn at(multiplier: f64, observed_at: DateTime<Utc>) -> Result<Self, CrashcastError> {
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(CrashcastError::InvalidOutcome { multiplier });
        }
        Ok(Self {
            multiplier,
            observed_at,
        })
    }

    /// Whether this round reached the given target multiplier.
    pub fn reaches(&self, target: f64) -> bool {
        self.multiplier >= target
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2}x @ {}",
            self.multiplier,
            self.observed_at.format("%H:%M:%S"),
        )
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// A prediction request: hypothetical cash-out target and stake.
/// Transient — never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Query {
    /// Cash-out multiplier the player would exit at.
    pub target: f64,
    /// Stake in currency units.
    pub stake: f64,
}

impl Query {
    pub fn new(target: f64, stake: f64) -> Self {
        Self { target, stake }
    }

    /// Validate the query parameters. Targets below 1.0 pay nothing;
    /// non-positive stakes make no sense.
    pub fn validate(&self) -> Result<(), CrashcastError> {
        if !self.target.is_finite() || self.target < 1.0 {
            return Err(CrashcastError::InvalidQuery(format!(
                "target multiplier must be finite and >= 1.0, got {}",
                self.target
            )));
        }
        if !self.stake.is_finite() || self.stake <= 0.0 {
            return Err(CrashcastError::InvalidQuery(format!(
                "stake must be finite and positive, got {}",
                self.stake
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target={:.2}x stake=${:.2}", self.target, self.stake)
    }
}

// ---------------------------------------------------------------------------
// History summary
// ---------------------------------------------------------------------------

/// Rolling statistics over the most recent outcomes, plus the empirical
/// hit fraction for a queried target over the full retained window.
///
/// This is the feature set consumed by the opaque scoring model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySummary {
    /// Outcomes in the rolling window (may be fewer than the window size).
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Fraction of the full retained history that reached the target.
    pub hit_fraction: f64,
    /// Total outcomes retained when the summary was taken.
    pub retained: usize,
}

impl fmt::Display for HistorySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} mean={:.2}x std={:.2} range=[{:.2}x, {:.2}x] hit={:.0}%",
            self.count,
            self.mean,
            self.std_dev,
            self.min,
            self.max,
            self.hit_fraction * 100.0,
        )
    }
}

// ---------------------------------------------------------------------------
// Prediction
// ---------------------------------------------------------------------------

/// Bet-or-skip advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    Bet,
    Skip,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Bet => write!(f, "BET"),
            Recommendation::Skip => write!(f, "SKIP"),
        }
    }
}

/// The result of a prediction: probability that the next round reaches
/// the queried target, plus the derived recommendation.
///
/// The empirical and model components are included for transparency.
/// Always recomputed from the current history snapshot — `revision`
/// identifies the snapshot it was computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Blended probability in [0, 1].
    pub probability: f64,
    pub recommendation: Recommendation,
    /// Confidence in the estimate (0-1), distinct from the probability.
    pub confidence: f64,
    /// Empirical hit fraction component.
    pub empirical: f64,
    /// Opaque model score component.
    pub model_score: f64,
    /// Expected value of the queried stake at the blended probability.
    pub expected_value: f64,
    /// History revision this prediction was computed from.
    pub revision: u64,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} P={:.1}% conf={:.0}% (emp={:.1}% model={:.1}%) EV=${:+.2}",
            self.recommendation,
            self.probability * 100.0,
            self.confidence * 100.0,
            self.empirical * 100.0,
            self.model_score * 100.0,
            self.expected_value,
        )
    }
}

/// Expected value of a stake at the given win probability and target:
/// win pays `stake * (target - 1)`, a loss forfeits the stake.
pub fn expected_value(stake: f64, target: f64, probability: f64) -> f64 {
    stake * (target - 1.0) * probability - stake * (1.0 - probability)
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for CRASHCAST.
#[derive(Debug, thiserror::Error)]
pub enum CrashcastError {
    #[error("Invalid outcome: multiplier {multiplier} (must be finite and >= 1.0)")]
    InvalidOutcome { multiplier: f64 },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Insufficient history: have {have} outcomes, need {need}")]
    InsufficientHistory { have: usize, need: usize },

    #[error("Model error ({name}): {message}")]
    Model { name: String, message: String },

    #[error("Feed error ({source_name}): {message}")]
    Feed {
        source_name: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Outcome tests --

    #[test]
    fn test_outcome_valid() {
        let o = Outcome::new(2.5).unwrap();
        assert_eq!(o.multiplier, 2.5);
    }

    #[test]
    fn test_outcome_exactly_one_is_valid() {
        // Instant bust rounds crash at exactly 1.0x.
        assert!(Outcome::new(1.0).is_ok());
    }

    #[test]
    fn test_outcome_below_one_rejected() {
        let err = Outcome::new(0.5).unwrap_err();
        assert!(matches!(
            err,
            CrashcastError::InvalidOutcome { multiplier } if multiplier == 0.5
        ));
    }

    #[test]
    fn test_outcome_non_finite_rejected() {
        assert!(Outcome::new(f64::NAN).is_err());
        assert!(Outcome::new(f64::INFINITY).is_err());
        assert!(Outcome::new(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_outcome_reaches() {
        let o = Outcome::new(2.0).unwrap();
        assert!(o.reaches(1.5));
        assert!(o.reaches(2.0));
        assert!(!o.reaches(2.01));
    }

    #[test]
    fn test_outcome_serialization_roundtrip() {
        let o = Outcome::new(3.14).unwrap();
        let json = serde_json::to_string(&o).unwrap();
        let parsed: Outcome = serde_json::from_str(&json).unwrap();
        assert!((parsed.multiplier - 3.14).abs() < 1e-10);
    }

    #[test]
    fn test_outcome_display() {
        let o = Outcome::new(2.5).unwrap();
        assert!(format!("{o}").contains("2.50x"));
    }

    // -- Query tests --

    #[test]
    fn test_query_valid() {
        assert!(Query::new(2.0, 10.0).validate().is_ok());
        assert!(Query::new(1.0, 0.01).validate().is_ok());
    }

    #[test]
    fn test_query_bad_target() {
        assert!(Query::new(0.9, 10.0).validate().is_err());
        assert!(Query::new(f64::NAN, 10.0).validate().is_err());
        assert!(Query::new(f64::INFINITY, 10.0).validate().is_err());
    }

    #[test]
    fn test_query_bad_stake() {
        assert!(Query::new(2.0, 0.0).validate().is_err());
        assert!(Query::new(2.0, -5.0).validate().is_err());
        assert!(Query::new(2.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn test_query_display() {
        let q = Query::new(2.0, 25.0);
        let display = format!("{q}");
        assert!(display.contains("2.00x"));
        assert!(display.contains("25.00"));
    }

    // -- Recommendation tests --

    #[test]
    fn test_recommendation_display() {
        assert_eq!(format!("{}", Recommendation::Bet), "BET");
        assert_eq!(format!("{}", Recommendation::Skip), "SKIP");
    }

    #[test]
    fn test_recommendation_serialization_roundtrip() {
        for rec in [Recommendation::Bet, Recommendation::Skip] {
            let json = serde_json::to_string(&rec).unwrap();
            let parsed: Recommendation = serde_json::from_str(&json).unwrap();
            assert_eq!(rec, parsed);
        }
    }

    // -- Expected value tests --

    #[test]
    fn test_expected_value_break_even() {
        // At p = 1/target the bet is exactly fair.
        let ev = expected_value(10.0, 2.0, 0.5);
        assert!(ev.abs() < 1e-10);
    }

    #[test]
    fn test_expected_value_sign_flips_around_break_even() {
        assert!(expected_value(10.0, 2.0, 0.6) > 0.0);
        assert!(expected_value(10.0, 2.0, 0.4) < 0.0);
    }

    #[test]
    fn test_expected_value_formula() {
        // stake=10, target=3, p=0.4: 10*2*0.4 - 10*0.6 = 8 - 6 = 2
        let ev = expected_value(10.0, 3.0, 0.4);
        assert!((ev - 2.0).abs() < 1e-10);
    }

    // -- Prediction tests --

    #[test]
    fn test_prediction_display() {
        let p = Prediction {
            probability: 0.62,
            recommendation: Recommendation::Bet,
            confidence: 0.80,
            empirical: 0.60,
            model_score: 0.64,
            expected_value: 2.40,
            revision: 42,
        };
        let display = format!("{p}");
        assert!(display.contains("BET"));
        assert!(display.contains("62.0%"));
    }

    #[test]
    fn test_prediction_serialization_roundtrip() {
        let p = Prediction {
            probability: 0.45,
            recommendation: Recommendation::Skip,
            confidence: 0.5,
            empirical: 0.4,
            model_score: 0.5,
            expected_value: -1.0,
            revision: 7,
        };
        let json = serde_json::to_string(&p).unwrap();
        let parsed: Prediction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.recommendation, Recommendation::Skip);
        assert_eq!(parsed.revision, 7);
    }

    // -- HistorySummary tests --

    #[test]
    fn test_summary_display() {
        let s = HistorySummary {
            count: 10,
            mean: 2.5,
            std_dev: 1.1,
            min: 1.0,
            max: 8.2,
            hit_fraction: 0.4,
            retained: 100,
        };
        let display = format!("{s}");
        assert!(display.contains("n=10"));
        assert!(display.contains("40%"));
    }

    // -- CrashcastError tests --

    #[test]
    fn test_error_display() {
        let e = CrashcastError::InsufficientHistory { have: 3, need: 10 };
        assert_eq!(
            format!("{e}"),
            "Insufficient history: have 3 outcomes, need 10"
        );

        let e = CrashcastError::InvalidOutcome { multiplier: 0.5 };
        assert!(format!("{e}").contains("0.5"));

        let e = CrashcastError::Model {
            name: "calibrated".into(),
            message: "score out of range".into(),
        };
        assert!(format!("{e}").contains("calibrated"));
    }
}
