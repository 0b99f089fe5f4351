//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section has defaults, so a partial file (or none in tests) is
//! usable. Paths may reference environment variables as `${VAR}` and
//! are resolved at runtime.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub estimator: EstimatorSection,
    pub model: ModelConfig,
    pub feed: FeedConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EstimatorSection {
    /// Maximum outcomes retained; oldest evicted first.
    pub capacity: usize,
    /// Minimum outcomes before predictions are served.
    pub min_history: usize,
    /// Rolling window for summary statistics.
    pub summary_window: usize,
    /// Weight of the empirical hit fraction in the blend.
    pub empirical_weight: f64,
    /// Blended probability at or above which the advice is Bet.
    pub bet_threshold: f64,
    /// History length at which coverage confidence saturates.
    pub confidence_saturation: usize,
}

impl Default for EstimatorSection {
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

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    /// House edge for the analytic baseline model.
    pub house_edge: f64,
    /// Path to a calibrated model artifact (JSON). When set, the
    /// calibrated model is used instead of the baseline. May contain
    /// `${VAR}` references.
    pub artifact_path: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            house_edge: 0.01,
            artifact_path: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedConfig {
    /// House edge of the simulated game.
    pub house_edge: f64,
    /// Cap on simulated crash multipliers.
    pub max_multiplier: f64,
    /// Seconds between simulated rounds.
    pub round_interval_secs: u64,
    /// Fixed RNG seed for reproducible sessions (tests, demos).
    pub seed: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            house_edge: 0.01,
            max_multiplier: 1000.0,
            round_interval_secs: 5,
            seed: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8080,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }
}

/// Resolve `${VAR}` references in a configured value.
pub fn resolve_placeholders(value: &str) -> Result<String> {
    let mut resolved = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        resolved.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .with_context(|| format!("Unclosed ${{}} reference in: {value}"))?;
        let var = &after[..end];
        let val = std::env::var(var)
            .with_context(|| format!("Environment variable not set: {var}"))?;
        resolved.push_str(&val);
        rest = &after[end + 1..];
    }
    resolved.push_str(rest);
    Ok(resolved)
}
