//! Calibration analysis.
//!
//! Measures how well served probabilities match observed round outcomes.
//! Computes Brier scores, a binned reliability curve, and an
//! over/under-confidence diagnosis.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Calibration data
// ---------------------------------------------------------------------------

/// A single prediction-outcome pair for calibration tracking.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationPoint {
    /// Probability served before the round completed.
    pub probability: f64,
    /// Whether the round reached the queried target.
    pub hit: bool,
}

/// Calibration analysis results.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationReport {
    pub total_predictions: usize,
    pub brier_score: f64,
    /// Reliability curve: for each bin, predicted vs actual hit rate.
    pub curve: Vec<CalibrationBucket>,
    pub diagnosis: CalibrationDiagnosis,
}

/// A bucket in the reliability curve (e.g. all predictions in 0.60-0.70).
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationBucket {
    pub bin_start: f64,
    pub bin_end: f64,
    pub mean_predicted: f64,
    pub actual_rate: f64,
    pub count: usize,
    /// Absolute deviation: |mean_predicted - actual_rate|
    pub deviation: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CalibrationDiagnosis {
    WellCalibrated,
    OverConfident,    // Served probabilities too extreme
    UnderConfident,   // Served probabilities too central
    InsufficientData, // Not enough predictions to diagnose
}

// ---------------------------------------------------------------------------
// Calibrator
// ---------------------------------------------------------------------------

pub struct Calibrator {
    points: Vec<CalibrationPoint>,
    /// Number of bins for the reliability curve.
    num_bins: usize,
}

impl Calibrator {
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            num_bins: 10,
        }
    }

    /// Add a settled prediction.
    pub fn add_point(&mut self, probability: f64, hit: bool) {
        self.points.push(CalibrationPoint { probability, hit });
    }

    /// Number of tracked predictions.
    pub fn count(&self) -> usize {
        self.points.len()
    }

    /// Generate a full calibration report.
    pub fn report(&self) -> CalibrationReport {
        if self.points.is_empty() {
            return CalibrationReport {
                total_predictions: 0,
                brier_score: 0.0,
                curve: Vec::new(),
                diagnosis: CalibrationDiagnosis::InsufficientData,
            };
        }

        let brier_score = self.compute_brier();
        let curve = self.compute_curve();
        let diagnosis = self.diagnose(&curve);

        CalibrationReport {
            total_predictions: self.points.len(),
            brier_score,
            curve,
            diagnosis,
        }
    }

    /// Brier = (1/N) * Σ(predicted - outcome)²
    /// Lower is better. 0.0 = perfect, 0.25 = random at 50/50.
    fn compute_brier(&self) -> f64 {
        let sum: f64 = self
            .points
            .iter()
            .map(|p| {
                let outcome = if p.hit { 1.0 } else { 0.0 };
                (p.probability - outcome).powi(2)
            })
            .sum();
        sum / self.points.len() as f64
    }

    /// Bin predictions and compare mean predicted to actual hit rates.
    fn compute_curve(&self) -> Vec<CalibrationBucket> {
        let bin_width = 1.0 / self.num_bins as f64;
        let mut buckets = Vec::with_capacity(self.num_bins);

        for i in 0..self.num_bins {
            let bin_start = i as f64 * bin_width;
            let bin_end = bin_start + bin_width;
            let last_bin = i == self.num_bins - 1;

            let in_bin: Vec<&CalibrationPoint> = self
                .points
                .iter()
                .filter(|p| {
                    p.probability >= bin_start
                        && (p.probability < bin_end || (last_bin && p.probability <= bin_end))
                })
                .collect();

            if in_bin.is_empty() {
                buckets.push(CalibrationBucket {
                    bin_start,
                    bin_end,
                    mean_predicted: (bin_start + bin_end) / 2.0,
                    actual_rate: 0.0,
                    count: 0,
                    deviation: 0.0,
                });
                continue;
            }

            let count = in_bin.len();
            let mean_predicted = in_bin.iter().map(|p| p.probability).sum::<f64>() / count as f64;
            let actual_rate = in_bin.iter().filter(|p| p.hit).count() as f64 / count as f64;
            let deviation = (mean_predicted - actual_rate).abs();

            buckets.push(CalibrationBucket {
                bin_start,
                bin_end,
                mean_predicted,
                actual_rate,
                count,
                deviation,
            });
        }

        buckets
    }

    /// Diagnose overall calibration quality from the extreme bins.
    fn diagnose(&self, curve: &[CalibrationBucket]) -> CalibrationDiagnosis {
        let populated: Vec<&CalibrationBucket> =
            curve.iter().filter(|b| b.count >= 3).collect();

        if populated.len() < 3 || self.points.len() < 20 {
            return CalibrationDiagnosis::InsufficientData;
        }

        let mut overconfident_signals = 0;
        let mut underconfident_signals = 0;

        for bucket in &populated {
            if bucket.deviation < 0.05 {
                continue; // Well-calibrated bucket
            }

            let mid = (bucket.bin_start + bucket.bin_end) / 2.0;

            if mid < 0.3 {
                // Low-probability bin
                if bucket.actual_rate > bucket.mean_predicted {
                    overconfident_signals += 1; // Predicted too low
                } else {
                    underconfident_signals += 1;
                }
            } else if mid > 0.7 {
                // High-probability bin
                if bucket.actual_rate < bucket.mean_predicted {
                    overconfident_signals += 1; // Predicted too high
                } else {
                    underconfident_signals += 1;
                }
            }
        }

        if overconfident_signals > underconfident_signals + 1 {
            CalibrationDiagnosis::OverConfident
        } else if underconfident_signals > overconfident_signals + 1 {
            CalibrationDiagnosis::UnderConfident
        } else {
            CalibrationDiagnosis::WellCalibrated
        }
    }
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_calibrator() {
        let report = Calibrator::new().report();
        assert_eq!(report.total_predictions, 0);
        assert_eq!(report.diagnosis, CalibrationDiagnosis::InsufficientData);
    }

    #[test]
    fn test_perfect_brier() {
        let mut c = Calibrator::new();
        c.add_point(1.0, true);
        c.add_point(0.0, false);
        assert_eq!(c.report().brier_score, 0.0);
    }

    #[test]
    fn test_random_brier() {
        let mut c = Calibrator::new();
        c.add_point(0.5, true);
        c.add_point(0.5, false);
        assert!((c.report().brier_score - 0.25).abs() < 1e-10);
    }

    #[test]
    fn test_brier_worst_case() {
        let mut c = Calibrator::new();
        c.add_point(1.0, false);
        c.add_point(0.0, true);
        assert!((c.report().brier_score - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_curve_bins_points() {
        let mut c = Calibrator::new();
        for _ in 0..5 {
            c.add_point(0.65, true);
        }
        let report = c.report();
        assert_eq!(report.curve.len(), 10);
        // 0.65 lands in the [0.6, 0.7) bin.
        let bucket = &report.curve[6];
        assert_eq!(bucket.count, 5);
        assert!((bucket.mean_predicted - 0.65).abs() < 1e-10);
        assert_eq!(bucket.actual_rate, 1.0);
    }

    #[test]
    fn test_probability_one_lands_in_last_bin() {
        let mut c = Calibrator::new();
        c.add_point(1.0, true);
        let report = c.report();
        assert_eq!(report.curve[9].count, 1);
    }

    #[test]
    fn test_overconfident_diagnosis() {
        let mut c = Calibrator::new();
        // High-probability predictions that mostly miss.
        for i in 0..15 {
            c.add_point(0.9, i % 2 == 0);
        }
        // Low-probability predictions that often hit.
        for i in 0..15 {
            c.add_point(0.1, i % 2 == 0);
        }
        // A well-behaved middle bin to satisfy the population requirement.
        for i in 0..10 {
            c.add_point(0.5, i % 2 == 0);
        }
        let report = c.report();
        assert_eq!(report.diagnosis, CalibrationDiagnosis::OverConfident);
    }

    #[test]
    fn test_well_calibrated_diagnosis() {
        let mut c = Calibrator::new();
        for i in 0..20 {
            c.add_point(0.25, i % 4 == 0);
        }
        for i in 0..20 {
            c.add_point(0.5, i % 2 == 0);
        }
        for i in 0..20 {
            c.add_point(0.75, i % 4 != 0);
        }
        let report = c.report();
        assert_eq!(report.diagnosis, CalibrationDiagnosis::WellCalibrated);
    }

    #[test]
    fn test_insufficient_data_below_twenty_points() {
        let mut c = Calibrator::new();
        for _ in 0..10 {
            c.add_point(0.5, true);
        }
        assert_eq!(c.report().diagnosis, CalibrationDiagnosis::InsufficientData);
    }
}
