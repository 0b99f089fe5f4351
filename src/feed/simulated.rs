//! Simulated round source.
//!
//! Samples crash multipliers by inverting the survival curve
//! P(M >= t) = (1 - e) / t: draw U uniform in (0, 1] and take
//! M = (1 - e) / U, floored at 1.0 and capped at a configured maximum.
//! The instant-bust probability (M = 1.0) equals the house edge.

use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::FeedConfig;
use crate::types::Outcome;

use super::OutcomeFeed;

pub struct SimulatedFeed {
    rng: StdRng,
    house_edge: f64,
    max_multiplier: f64,
}

impl SimulatedFeed {
    pub fn new(cfg: &FeedConfig) -> Self {
        let rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            house_edge: cfg.house_edge.clamp(0.0, 0.99),
            max_multiplier: cfg.max_multiplier.max(1.0),
        }
    }

    /// Draw one crash multiplier from the survival distribution.
    pub fn sample(&mut self) -> f64 {
        // random::<f64>() is [0, 1); flip to (0, 1] so division is safe.
        let u = 1.0 - self.rng.random::<f64>();
        ((1.0 - self.house_edge) / u).clamp(1.0, self.max_multiplier)
    }
}

#[async_trait]
impl OutcomeFeed for SimulatedFeed {
    async fn next_outcome(&mut self) -> Result<Outcome> {
        let multiplier = self.sample();
        Ok(Outcome::new(multiplier)?)
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
