//! Session tracking — round aggregates and a simulated wager ledger.
//!
//! Mirrors the metrics panel the dashboard exposes: rounds seen, average
//! and maximum crash point, prediction counters, and the results of
//! following the estimator's Bet advice with simulated tickets.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{Prediction, Query, Recommendation};

// ---------------------------------------------------------------------------
// Simulated ticket
// ---------------------------------------------------------------------------

/// A simulated wager opened on a Bet recommendation, settled by the next
/// recorded outcome.
#[derive(Debug, Clone)]
pub struct SimulatedTicket {
    pub id: Uuid,
    pub target: f64,
    pub stake: Decimal,
    pub opened_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Session metrics snapshot
// ---------------------------------------------------------------------------

/// Serializable snapshot of the session for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct SessionMetrics {
    pub rounds_recorded: u64,
    pub avg_multiplier: f64,
    pub max_multiplier: f64,
    pub predictions_served: u64,
    pub bets_advised: u64,
    pub skips_advised: u64,
    pub tickets_settled: u64,
    pub tickets_won: u64,
    pub hit_rate: f64,
    pub total_staked: Decimal,
    pub net_profit: Decimal,
    pub roi_pct: f64,
    pub uptime_secs: i64,
}

// ---------------------------------------------------------------------------
// Session tracker
// ---------------------------------------------------------------------------

/// Running statistics for the current game session.
pub struct SessionTracker {
    started_at: DateTime<Utc>,
    rounds_recorded: u64,
    sum_multiplier: f64,
    max_multiplier: f64,
    predictions_served: u64,
    bets_advised: u64,
    skips_advised: u64,
    /// At most one simulated ticket rides at a time.
    open_ticket: Option<SimulatedTicket>,
    tickets_settled: u64,
    tickets_won: u64,
    total_staked: Decimal,
    net_profit: Decimal,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            rounds_recorded: 0,
            sum_multiplier: 0.0,
            max_multiplier: 0.0,
            predictions_served: 0,
            bets_advised: 0,
            skips_advised: 0,
            open_ticket: None,
            tickets_settled: 0,
            tickets_won: 0,
            total_staked: Decimal::ZERO,
            net_profit: Decimal::ZERO,
        }
    }

    /// Record a completed round: update aggregates and settle any open
    /// simulated ticket against the crash point.
    pub fn record_round(&mut self, multiplier: f64) {
        self.rounds_recorded += 1;
        self.sum_multiplier += multiplier;
        if multiplier > self.max_multiplier {
            self.max_multiplier = multiplier;
        }

        if let Some(ticket) = self.open_ticket.take() {
            self.settle(ticket, multiplier);
        }
    }

    /// Record a served prediction. A Bet recommendation opens a simulated
    /// ticket unless one is already riding.
    pub fn record_prediction(&mut self, query: &Query, prediction: &Prediction) {
        self.predictions_served += 1;
        match prediction.recommendation {
            Recommendation::Bet => {
                self.bets_advised += 1;
                if self.open_ticket.is_none() {
                    let ticket = SimulatedTicket {
                        id: Uuid::new_v4(),
                        target: query.target,
                        stake: Decimal::from_f64_retain(query.stake)
                            .unwrap_or(Decimal::ZERO)
                            .round_dp(2),
                        opened_at: Utc::now(),
                    };
                    debug!(
                        ticket_id = %ticket.id,
                        target = ticket.target,
                        stake = %ticket.stake,
                        "Simulated ticket opened"
                    );
                    self.open_ticket = Some(ticket);
                }
            }
            Recommendation::Skip => self.skips_advised += 1,
        }
    }

    /// Abandon session state. Used alongside the estimator's reset when
    /// switching to a new game session.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn settle(&mut self, ticket: SimulatedTicket, multiplier: f64) {
        let won = multiplier >= ticket.target;
        let profit = if won {
            let payout = Decimal::from_f64_retain(ticket.target - 1.0).unwrap_or(Decimal::ZERO);
            (ticket.stake * payout).round_dp(2)
        } else {
            -ticket.stake
        };

        self.tickets_settled += 1;
        if won {
            self.tickets_won += 1;
        }
        self.total_staked += ticket.stake;
        self.net_profit += profit;

        info!(
            ticket_id = %ticket.id,
            target = ticket.target,
            crash = multiplier,
            won,
            profit = %profit,
            net = %self.net_profit,
            "Simulated ticket settled"
        );
    }

    /// Whether a simulated ticket is currently riding.
    pub fn has_open_ticket(&self) -> bool {
        self.open_ticket.is_some()
    }

    pub fn net_profit(&self) -> Decimal {
        self.net_profit
    }

    pub fn rounds_recorded(&self) -> u64 {
        self.rounds_recorded
    }

    /// Snapshot the session for the dashboard.
    pub fn snapshot(&self) -> SessionMetrics {
        let avg = if self.rounds_recorded > 0 {
            self.sum_multiplier / self.rounds_recorded as f64
        } else {
            0.0
        };
        let hit_rate = if self.tickets_settled > 0 {
            self.tickets_won as f64 / self.tickets_settled as f64
        } else {
            0.0
        };
        let roi = if self.total_staked > Decimal::ZERO {
            (self.net_profit / self.total_staked * Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or(0.0)
        } else {
            0.0
        };

        SessionMetrics {
            rounds_recorded: self.rounds_recorded,
            avg_multiplier: avg,
            max_multiplier: self.max_multiplier,
            predictions_served: self.predictions_served,
            bets_advised: self.bets_advised,
            skips_advised: self.skips_advised,
            tickets_settled: self.tickets_settled,
            tickets_won: self.tickets_won,
            hit_rate,
            total_staked: self.total_staked,
            net_profit: self.net_profit,
            roi_pct: roi,
            uptime_secs: (Utc::now() - self.started_at).num_seconds(),
        }
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
