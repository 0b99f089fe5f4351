//! Bounded outcome history.
//!
//! Append-only ring buffer of observed crash multipliers: a fixed-capacity
//! arena plus a write cursor. Once the arena is full, each append overwrites
//! the oldest slot. Entries are never reordered or mutated in place.

use crate::types::{HistorySummary, Outcome};

/// Bounded, append-only sequence of outcomes with oldest-first eviction.
///
/// Every mutation bumps `revision`, so derived values (summaries,
/// predictions) can be tied to the snapshot they were computed from and
/// are never reused across appends.
#[derive(Debug, Clone)]
pub struct History {
    slots: Vec<Outcome>,
    capacity: usize,
    /// Index of the next slot to write (only meaningful once full).
    cursor: usize,
    revision: u64,
}

impl History {
    /// Create an empty history retaining at most `capacity` outcomes.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
            revision: 0,
        }
    }

    /// Append an outcome, evicting the oldest entry if at capacity.
    pub fn push(&mut self, outcome: Outcome) {
        if self.slots.len() < self.capacity {
            self.slots.push(outcome);
        } else {
            self.slots[self.cursor] = outcome;
            self.cursor = (self.cursor + 1) % self.capacity;
        }
        self.revision += 1;
    }

    /// Remove all outcomes. Used when switching to a new game session.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.cursor = 0;
        self.revision += 1;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Monotonically increasing mutation counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Iterate outcomes in chronological order (oldest first), across
    /// any ring wrap.
    pub fn iter(&self) -> impl Iterator<Item = &Outcome> {
        let (older, newer) = if self.slots.len() < self.capacity {
            (&self.slots[..0], &self.slots[..])
        } else {
            (&self.slots[self.cursor..], &self.slots[..self.cursor])
        };
        older.iter().chain(newer.iter())
    }

    /// The `n` most recent outcomes, newest last.
    pub fn recent(&self, n: usize) -> Vec<Outcome> {
        let skip = self.slots.len().saturating_sub(n);
        self.iter().skip(skip).copied().collect()
    }

    /// Fraction of retained outcomes that reached `target`.
    /// Returns 0.0 on an empty history.
    pub fn hit_fraction(&self, target: f64) -> f64 {
        if self.slots.is_empty() {
            return 0.0;
        }
        let hits = self.iter().filter(|o| o.reaches(target)).count();
        hits as f64 / self.slots.len() as f64
    }

    /// Rolling statistics over the last `window` outcomes, plus the hit
    /// fraction for `target` over the full retained history.
    /// Returns `None` on an empty history.
    pub fn summary(&self, window: usize, target: f64) -> Option<HistorySummary> {
        if self.slots.is_empty() {
            return None;
        }

        let recent = self.recent(window);
        let count = recent.len();
        let mean = recent.iter().map(|o| o.multiplier).sum::<f64>() / count as f64;
        let variance = recent
            .iter()
            .map(|o| (o.multiplier - mean).powi(2))
            .sum::<f64>()
            / count as f64;
        let min = recent
            .iter()
            .map(|o| o.multiplier)
            .fold(f64::INFINITY, f64::min);
        let max = recent
            .iter()
            .map(|o| o.multiplier)
            .fold(f64::NEG_INFINITY, f64::max);

        Some(HistorySummary {
            count,
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
            hit_fraction: self.hit_fraction(target),
            retained: self.slots.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
