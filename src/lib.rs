//! CRASHCAST — crash-game probability estimator and bet advisor.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod history;
pub mod model;
pub mod estimator;
pub mod session;
pub mod feed;
pub mod backtest;
pub mod dashboard;

pub use estimator::{Estimator, EstimatorConfig};
pub use types::{CrashcastError, Outcome, Prediction, Query, Recommendation};
