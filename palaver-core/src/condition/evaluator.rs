//! Evaluation of conditions against a player.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::condition::{ConditionEntry, ConditionKind, ConditionSet};
use crate::environment::PlayerContext;
use crate::error::Result;
use crate::execution::{ExecutionInterval, ExecutionTracker};
use crate::types::{ActionId, PlayerId, QuestId};

/// Score assumed for an objective the player has no score on.
pub const MISSING_SCORE: i32 = -1;

/// Evaluates [`ConditionEntry`]s, consulting the tracker for rate limits.
///
/// Holds no state of its own; cheap to build per call site.
#[derive(Debug, Clone, Copy)]
pub struct ConditionEvaluator<'t> {
    tracker: &'t ExecutionTracker,
    default_interval: ExecutionInterval,
}

impl<'t> ConditionEvaluator<'t> {
    /// Evaluator reading execution history from `tracker`. Unrecognised
    /// interval keywords fall back to `default_interval`.
    #[must_use]
    pub fn new(tracker: &'t ExecutionTracker, default_interval: ExecutionInterval) -> Self {
        Self {
            tracker,
            default_interval,
        }
    }

    /// The backing tracker.
    #[must_use]
    pub fn tracker(&self) -> &'t ExecutionTracker {
        self.tracker
    }

    /// Evaluate one condition.
    ///
    /// Without a player context every condition fails. `action` is required
    /// by execution limits and ignored otherwise.
    #[must_use]
    pub fn evaluate(
        &self,
        condition: &ConditionEntry,
        player: Option<&dyn PlayerContext>,
        action: Option<ActionId>,
    ) -> bool {
        let Some(player) = player else {
            return false;
        };
        if condition.kind == ConditionKind::None {
            debug!("Skipping condition without a type");
            return true;
        }
        if !condition.is_valid() {
            warn!(condition = %condition, "Invalid condition evaluates to false");
            return false;
        }

        match condition.kind {
            ConditionKind::None => true,
            ConditionKind::Scoreboard => {
                let actual = player.score(&condition.name).unwrap_or(MISSING_SCORE);
                condition.operation.evaluate(actual, condition.value)
            }
            ConditionKind::ExecutionLimit => {
                let Some(action) = action else {
                    warn!(condition = %condition, "Execution limit evaluated without an action id");
                    return false;
                };
                let limit = u32::try_from(condition.value).unwrap_or(0);
                self.tracker.can_execute(
                    player.id(),
                    action,
                    limit,
                    condition.interval_or(self.default_interval),
                )
            }
            ConditionKind::QuestNotAccepted => match Uuid::parse_str(condition.name.trim()) {
                Ok(quest) => !player.tracks_quest(QuestId(quest)),
                Err(_) => player.tracked_quest_ids().is_empty(),
            },
        }
    }

    /// Evaluate a conjunctive set.
    ///
    /// An empty set passes. Without a player context the set passes as well,
    /// so that dialogs stay reachable from contexts that carry no player.
    #[must_use]
    pub fn evaluate_all(
        &self,
        conditions: &ConditionSet,
        player: Option<&dyn PlayerContext>,
        action: Option<ActionId>,
    ) -> bool {
        if conditions.is_empty() {
            return true;
        }
        let Some(player) = player else {
            debug!("No player context, conditions pass");
            return true;
        };
        for condition in conditions {
            if !self.evaluate(condition, Some(player), action) {
                debug!(player = %player.id(), condition = %condition, "Condition failed");
                return false;
            }
        }
        true
    }

    /// Record one execution of `action` by `player` if `conditions` carry any
    /// valid execution limit. Several limits share one record, kept for the
    /// widest of their intervals.
    ///
    /// Returns whether anything was recorded.
    ///
    /// # Errors
    /// Returns an error if the tracker cannot persist the record.
    pub fn record_executions(
        &self,
        conditions: &ConditionSet,
        player: PlayerId,
        action: ActionId,
    ) -> Result<bool> {
        let widest = conditions
            .iter()
            .filter(|c| c.kind == ConditionKind::ExecutionLimit && c.is_valid())
            .map(|c| c.interval_or(self.default_interval))
            .reduce(ExecutionInterval::widest);
        match widest {
            Some(interval) => {
                self.tracker.record_execution(player, action, interval)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
