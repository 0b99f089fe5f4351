//! Outcome feeds.
//!
//! Defines the `OutcomeFeed` trait — the seam to whatever external
//! source supplies completed rounds (a scraper in production) — and
//! ships a simulated feed that fabricates rounds from the crash-game
//! survival distribution.

pub mod simulated;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::Outcome;

pub use simulated::SimulatedFeed;

/// Abstraction over round sources.
///
/// Implementors deliver one completed round per call, in arrival order.
/// No ordering guarantee beyond that is provided.
#[async_trait]
pub trait OutcomeFeed: Send + Sync {
    /// Fetch the next completed round.
    async fn next_outcome(&mut self) -> Result<Outcome>;

    /// Feed name for logging and identification.
    fn name(&self) -> &str;
}
