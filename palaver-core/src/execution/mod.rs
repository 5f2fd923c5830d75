//! Execution-limit tracking.
//!
//! An execution-limit condition says "this action may fire at most N times
//! per interval for each player". The [`ExecutionTracker`] keeps the history
//! needed to answer that, per world, and writes every change through to an
//! [`ExecutionStore`] so the history survives restarts.

pub mod interval;
pub mod store;
pub mod tracker;

pub use interval::ExecutionInterval;
pub use store::{ExecutionStore, MemoryExecutionStore};
pub use tracker::ExecutionTracker;

use serde::{Deserialize, Serialize};

use crate::types::Millis;

/// Execution history of one action for one player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Invocation times still relevant to some window, oldest first.
    pub timestamps: Vec<Millis>,
    /// Invocations over the record's whole lifetime.
    pub total: u64,
    /// Time of the most recent invocation.
    pub last_execution: Millis,
}

impl ExecutionRecord {
    /// Number of invocations that count against `interval` at time `now`.
    #[must_use]
    pub fn count_within(
        &self,
        interval: ExecutionInterval,
        now: Millis,
        session_start: Millis,
    ) -> u64 {
        match interval {
            ExecutionInterval::Lifetime => self.total,
            ExecutionInterval::PerSession => {
                self.timestamps.iter().filter(|&&t| t >= session_start).count() as u64
            }
            fixed => {
                let window = fixed.window_millis().unwrap_or(Millis::MAX);
                self.timestamps
                    .iter()
                    .filter(|&&t| now.saturating_sub(t) < window)
                    .count() as u64
            }
        }
    }

    /// Append an invocation and drop timestamps that can no longer count
    /// against `interval`.
    pub fn push(&mut self, interval: ExecutionInterval, now: Millis, session_start: Millis) {
        self.timestamps.push(now);
        self.total = self.total.saturating_add(1);
        self.last_execution = now;
        self.evict(interval, now, session_start);
    }

    fn evict(&mut self, interval: ExecutionInterval, now: Millis, session_start: Millis) {
        match interval {
            ExecutionInterval::PerSession => self.timestamps.retain(|&t| t >= session_start),
            other => {
                // Lifetime counts from `total`; the month of history kept for
                // it lets a later, shorter limit on the same action still count.
                let window = other
                    .window_millis()
                    .or(ExecutionInterval::PerMonth.window_millis())
                    .unwrap_or(Millis::MAX);
                self.timestamps.retain(|&t| now.saturating_sub(t) < window);
            }
        }
    }
}

impl ExecutionInterval {
    /// The interval whose retention covers both `self` and `other`.
    #[must_use]
    pub fn widest(self, other: Self) -> Self {
        if self == other {
            return self;
        }
        match (self.window_millis(), other.window_millis()) {
            (Some(a), Some(b)) => {
                if a >= b {
                    self
                } else {
                    other
                }
            }
            _ => Self::Lifetime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_only_inside_window() {
        let mut record = ExecutionRecord::default();
        record.push(ExecutionInterval::PerDay, 0, 0);
        record.push(ExecutionInterval::PerDay, 30_000, 0);
        assert_eq!(record.count_within(ExecutionInterval::PerMinute, 59_999, 0), 2);
        assert_eq!(record.count_within(ExecutionInterval::PerMinute, 60_000, 0), 1);
        assert_eq!(record.count_within(ExecutionInterval::PerMinute, 90_000, 0), 0);
        assert_eq!(record.count_within(ExecutionInterval::Lifetime, 90_000, 0), 2);
    }

    #[test]
    fn push_evicts_expired_entries() {
        let mut record = ExecutionRecord::default();
        record.push(ExecutionInterval::PerMinute, 0, 0);
        record.push(ExecutionInterval::PerMinute, 120_000, 0);
        assert_eq!(record.timestamps, vec![120_000]);
        assert_eq!(record.total, 2);
        assert_eq!(record.last_execution, 120_000);
    }

    #[test]
    fn session_counts_from_session_start() {
        let mut record = ExecutionRecord::default();
        record.push(ExecutionInterval::PerSession, 100, 0);
        assert_eq!(record.count_within(ExecutionInterval::PerSession, 200, 0), 1);
        assert_eq!(record.count_within(ExecutionInterval::PerSession, 200, 150), 0);
    }

    #[test]
    fn widest_interval() {
        use ExecutionInterval::*;
        assert_eq!(PerMinute.widest(PerDay), PerDay);
        assert_eq!(PerWeek.widest(PerHour), PerWeek);
        assert_eq!(PerHour.widest(PerSession), Lifetime);
        assert_eq!(PerSession.widest(PerSession), PerSession);
    }
}
