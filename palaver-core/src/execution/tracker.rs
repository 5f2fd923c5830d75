//! Per-world execution-limit tracker.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::execution::{ExecutionInterval, ExecutionRecord, ExecutionStore, MemoryExecutionStore};
use crate::types::{ActionId, Millis, PlayerId, WorldId};

const DAY_MS: Millis = 86_400_000;

struct TrackerState {
    records: HashMap<PlayerId, HashMap<ActionId, ExecutionRecord>>,
    store: Box<dyn ExecutionStore>,
}

/// Rate limiter answering "may `player` run `action` again now?".
///
/// History is loaded from the store when the tracker opens and every change
/// is written through before it becomes visible in memory, so a failed write
/// leaves the tracker exactly as it was.
pub struct ExecutionTracker {
    world: WorldId,
    clock: Arc<dyn Clock>,
    session_start: Millis,
    state: Mutex<TrackerState>,
}

impl fmt::Debug for ExecutionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionTracker")
            .field("world", &self.world)
            .field("session_start", &self.session_start)
            .finish_non_exhaustive()
    }
}

impl ExecutionTracker {
    /// Open the tracker for `world`, loading its stored history.
    ///
    /// The current time becomes the start of the [`ExecutionInterval::PerSession`]
    /// window.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn open(
        world: WorldId,
        store: Box<dyn ExecutionStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let mut records: HashMap<PlayerId, HashMap<ActionId, ExecutionRecord>> = HashMap::new();
        let rows = store.load_world(world)?;
        let loaded = rows.len();
        for (player, action, record) in rows {
            records.entry(player).or_default().insert(action, record);
        }
        let session_start = clock.now_millis();
        info!(world = %world, records = loaded, "Execution tracker opened");
        Ok(Self {
            world,
            clock,
            session_start,
            state: Mutex::new(TrackerState { records, store }),
        })
    }

    /// A tracker backed by a fresh in-memory store and the system clock.
    #[must_use]
    pub fn in_memory(world: WorldId) -> Self {
        Self::with_clock(world, Arc::new(SystemClock))
    }

    /// A tracker backed by a fresh in-memory store and the given clock.
    #[must_use]
    pub fn with_clock(world: WorldId, clock: Arc<dyn Clock>) -> Self {
        let session_start = clock.now_millis();
        Self {
            world,
            clock,
            session_start,
            state: Mutex::new(TrackerState {
                records: HashMap::new(),
                store: Box::new(MemoryExecutionStore::new()),
            }),
        }
    }

    /// The world this tracker is scoped to.
    #[must_use]
    pub fn world(&self) -> WorldId {
        self.world
    }

    /// When the current session started.
    #[must_use]
    pub fn session_start(&self) -> Millis {
        self.session_start
    }

    /// Whether `player` may run `action` once more under `limit` per `interval`.
    ///
    /// A limit of zero means unlimited.
    #[must_use]
    pub fn can_execute(
        &self,
        player: PlayerId,
        action: ActionId,
        limit: u32,
        interval: ExecutionInterval,
    ) -> bool {
        if limit == 0 {
            return true;
        }
        let count = self.execution_count(player, action, interval);
        let allowed = count < u64::from(limit);
        if !allowed {
            debug!(
                player = %player,
                action = %action,
                count,
                limit,
                interval = %interval,
                "Execution limit reached"
            );
        }
        allowed
    }

    /// Invocations of `action` by `player` that count against `interval` now.
    #[must_use]
    pub fn execution_count(
        &self,
        player: PlayerId,
        action: ActionId,
        interval: ExecutionInterval,
    ) -> u64 {
        let now = self.clock.now_millis();
        let state = self.state.lock();
        state
            .records
            .get(&player)
            .and_then(|actions| actions.get(&action))
            .map_or(0, |record| record.count_within(interval, now, self.session_start))
    }

    /// Record one invocation of `action` by `player` and persist it.
    ///
    /// # Errors
    /// Returns an error if the store rejects the write; the in-memory state
    /// is then left unchanged.
    pub fn record_execution(
        &self,
        player: PlayerId,
        action: ActionId,
        interval: ExecutionInterval,
    ) -> Result<()> {
        let now = self.clock.now_millis();
        let mut state = self.state.lock();
        let mut record = state
            .records
            .get(&player)
            .and_then(|actions| actions.get(&action))
            .cloned()
            .unwrap_or_default();
        record.push(interval, now, self.session_start);
        state.store.put(self.world, player, action, &record)?;
        debug!(
            player = %player,
            action = %action,
            interval = %interval,
            total = record.total,
            "Execution recorded"
        );
        state.records.entry(player).or_default().insert(action, record);
        Ok(())
    }

    /// A copy of the stored record, if any.
    #[must_use]
    pub fn record(&self, player: PlayerId, action: ActionId) -> Option<ExecutionRecord> {
        self.state
            .lock()
            .records
            .get(&player)
            .and_then(|actions| actions.get(&action))
            .cloned()
    }

    /// Forget the history of `action` for `player`. Returns `true` if a
    /// record existed.
    ///
    /// # Errors
    /// Returns an error if the store rejects the delete.
    pub fn reset_execution(&self, player: PlayerId, action: ActionId) -> Result<bool> {
        let mut state = self.state.lock();
        let exists = state
            .records
            .get(&player)
            .is_some_and(|actions| actions.contains_key(&action));
        if !exists {
            return Ok(false);
        }
        state.store.delete(self.world, player, action)?;
        if let Some(actions) = state.records.get_mut(&player) {
            actions.remove(&action);
            if actions.is_empty() {
                state.records.remove(&player);
            }
        }
        info!(player = %player, action = %action, "Execution history reset");
        Ok(true)
    }

    /// Forget the history of `action` for every player. Returns the number
    /// of records removed.
    ///
    /// # Errors
    /// Returns an error if the store rejects a delete. Records deleted before
    /// the failure stay deleted.
    pub fn reset_for_all_players(&self, action: ActionId) -> Result<usize> {
        let mut state = self.state.lock();
        let players: Vec<PlayerId> = state
            .records
            .iter()
            .filter(|(_, actions)| actions.contains_key(&action))
            .map(|(player, _)| *player)
            .collect();
        let mut removed = 0;
        for player in players {
            state.store.delete(self.world, player, action)?;
            if let Some(actions) = state.records.get_mut(&player) {
                actions.remove(&action);
                if actions.is_empty() {
                    state.records.remove(&player);
                }
            }
            removed += 1;
        }
        info!(action = %action, removed, "Execution history reset for all players");
        Ok(removed)
    }

    /// Drop every record whose last execution is older than `days` days.
    /// Returns the number of records removed.
    ///
    /// # Errors
    /// Returns an error if the store rejects a delete.
    pub fn prune_expired(&self, days: u32) -> Result<usize> {
        let now = self.clock.now_millis();
        let cutoff = now.saturating_sub(u64::from(days) * DAY_MS);
        let mut state = self.state.lock();
        let expired: Vec<(PlayerId, ActionId)> = state
            .records
            .iter()
            .flat_map(|(player, actions)| {
                actions
                    .iter()
                    .filter(|(_, record)| record.last_execution < cutoff)
                    .map(|(action, _)| (*player, *action))
            })
            .collect();
        for (player, action) in &expired {
            state.store.delete(self.world, *player, *action)?;
            if let Some(actions) = state.records.get_mut(player) {
                actions.remove(action);
                if actions.is_empty() {
                    state.records.remove(player);
                }
            }
        }
        if !expired.is_empty() {
            info!(world = %self.world, pruned = expired.len(), "Pruned idle execution records");
        }
        Ok(expired.len())
    }

    /// Number of (player, action) records held.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.state.lock().records.values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::PalaverError;

    const MINUTE: Millis = 60_000;

    fn tracker(clock: &Arc<ManualClock>) -> ExecutionTracker {
        ExecutionTracker::with_clock(WorldId::new(), clock.clone())
    }

    struct BrokenStore;

    impl ExecutionStore for BrokenStore {
        fn load_world(
            &self,
            _world: WorldId,
        ) -> Result<Vec<(PlayerId, ActionId, ExecutionRecord)>> {
            Ok(Vec::new())
        }

        fn put(&self, _: WorldId, _: PlayerId, _: ActionId, _: &ExecutionRecord) -> Result<()> {
            Err(PalaverError::Io(std::io::Error::other("disk full")))
        }

        fn delete(&self, _: WorldId, _: PlayerId, _: ActionId) -> Result<bool> {
            Err(PalaverError::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn zero_limit_is_unlimited() {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let tracker = tracker(&clock);
        let (player, action) = (PlayerId::new(), ActionId(uuid::Uuid::new_v4()));
        for _ in 0..5 {
            tracker
                .record_execution(player, action, ExecutionInterval::PerMinute)
                .expect("record");
        }
        assert!(tracker.can_execute(player, action, 0, ExecutionInterval::PerMinute));
    }

    #[test]
    fn limit_saturates_then_recovers() {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let tracker = tracker(&clock);
        let (player, action) = (PlayerId::new(), ActionId(uuid::Uuid::new_v4()));

        assert!(tracker.can_execute(player, action, 2, ExecutionInterval::PerMinute));
        tracker.record_execution(player, action, ExecutionInterval::PerMinute).expect("record");
        clock.advance(1_000);
        tracker.record_execution(player, action, ExecutionInterval::PerMinute).expect("record");
        assert!(!tracker.can_execute(player, action, 2, ExecutionInterval::PerMinute));

        clock.advance(MINUTE);
        assert!(tracker.can_execute(player, action, 2, ExecutionInterval::PerMinute));
    }

    #[test]
    fn lifetime_never_recovers() {
        let clock = Arc::new(ManualClock::new(0));
        let tracker = tracker(&clock);
        let (player, action) = (PlayerId::new(), ActionId(uuid::Uuid::new_v4()));
        tracker.record_execution(player, action, ExecutionInterval::Lifetime).expect("record");
        clock.advance(365 * DAY_MS);
        assert!(!tracker.can_execute(player, action, 1, ExecutionInterval::Lifetime));
        assert!(tracker.can_execute(player, action, 2, ExecutionInterval::Lifetime));
    }

    #[test]
    fn players_are_independent() {
        let clock = Arc::new(ManualClock::new(0));
        let tracker = tracker(&clock);
        let action = ActionId(uuid::Uuid::new_v4());
        let (alice, bob) = (PlayerId::new(), PlayerId::new());
        tracker.record_execution(alice, action, ExecutionInterval::PerDay).expect("record");
        assert!(!tracker.can_execute(alice, action, 1, ExecutionInterval::PerDay));
        assert!(tracker.can_execute(bob, action, 1, ExecutionInterval::PerDay));
    }

    #[test]
    fn history_survives_reopen_and_stays_in_its_world() {
        let clock: Arc<ManualClock> = Arc::new(ManualClock::new(5_000));
        let store = MemoryExecutionStore::new();
        let world = WorldId::new();
        let (player, action) = (PlayerId::new(), ActionId(uuid::Uuid::new_v4()));

        let first = ExecutionTracker::open(world, Box::new(store.clone()), clock.clone())
            .expect("open");
        first.record_execution(player, action, ExecutionInterval::PerDay).expect("record");
        drop(first);

        let reopened = ExecutionTracker::open(world, Box::new(store.clone()), clock.clone())
            .expect("reopen");
        assert!(!reopened.can_execute(player, action, 1, ExecutionInterval::PerDay));

        let other = ExecutionTracker::open(WorldId::new(), Box::new(store), clock)
            .expect("other world");
        assert!(other.can_execute(player, action, 1, ExecutionInterval::PerDay));
    }

    #[test]
    fn session_window_starts_at_open() {
        let clock: Arc<ManualClock> = Arc::new(ManualClock::new(0));
        let store = MemoryExecutionStore::new();
        let world = WorldId::new();
        let (player, action) = (PlayerId::new(), ActionId(uuid::Uuid::new_v4()));

        let first = ExecutionTracker::open(world, Box::new(store.clone()), clock.clone())
            .expect("open");
        first.record_execution(player, action, ExecutionInterval::PerSession).expect("record");
        assert!(!first.can_execute(player, action, 1, ExecutionInterval::PerSession));

        clock.advance(10);
        let second = ExecutionTracker::open(world, Box::new(store), clock).expect("reopen");
        assert!(second.can_execute(player, action, 1, ExecutionInterval::PerSession));
    }

    #[test]
    fn failed_write_leaves_state_untouched() {
        let clock: Arc<ManualClock> = Arc::new(ManualClock::new(0));
        let tracker = ExecutionTracker::open(WorldId::new(), Box::new(BrokenStore), clock)
            .expect("open");
        let (player, action) = (PlayerId::new(), ActionId(uuid::Uuid::new_v4()));
        let err = tracker.record_execution(player, action, ExecutionInterval::PerDay);
        assert!(matches!(err, Err(PalaverError::Io(_))));
        assert!(tracker.record(player, action).is_none());
        assert!(tracker.can_execute(player, action, 1, ExecutionInterval::PerDay));
    }

    #[test]
    fn reset_and_prune() {
        let clock = Arc::new(ManualClock::new(0));
        let tracker = tracker(&clock);
        let action = ActionId(uuid::Uuid::new_v4());
        let other = ActionId(uuid::Uuid::new_v4());
        let (alice, bob) = (PlayerId::new(), PlayerId::new());

        tracker.record_execution(alice, action, ExecutionInterval::Lifetime).expect("record");
        tracker.record_execution(bob, action, ExecutionInterval::Lifetime).expect("record");
        assert!(tracker.reset_execution(alice, action).expect("reset"));
        assert!(!tracker.reset_execution(alice, action).expect("reset twice"));
        assert!(tracker.can_execute(alice, action, 1, ExecutionInterval::Lifetime));

        tracker.record_execution(alice, action, ExecutionInterval::Lifetime).expect("record");
        assert_eq!(tracker.reset_for_all_players(action).expect("reset all"), 2);
        assert_eq!(tracker.record_count(), 0);

        tracker.record_execution(alice, other, ExecutionInterval::Lifetime).expect("record");
        clock.advance(31 * DAY_MS);
        tracker.record_execution(bob, other, ExecutionInterval::Lifetime).expect("record");
        assert_eq!(tracker.prune_expired(30).expect("prune"), 1);
        assert!(tracker.record(alice, other).is_none());
        assert!(tracker.record(bob, other).is_some());
    }
}
