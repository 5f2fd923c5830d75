//! Action dispatch.
//!
//! Every action goes through the same pipeline:
//!
//! 1. **Validate**: supported kind, payload present, a player where the kind
//!    needs one.
//! 2. **Check conditions**: the action's own conditions, including execution
//!    limits, are re-checked right before dispatch.
//! 3. **Dispatch**: command, scoreboard mutation, or dialog transition.
//! 4. **Record**: execution limits are fed only after a successful dispatch.
//!
//! None of the refusals along the way are errors. Only a failure to persist
//! an execution record is returned as one.

pub mod command;
pub mod scoreboard;
pub mod transition;

use std::fmt;

use tracing::{debug, info, warn};

use crate::action::{ActionEntry, ActionKind};
use crate::condition::ConditionEvaluator;
use crate::config::PalaverConfig;
use crate::dialog::{ButtonKind, DialogButtonEntry};
use crate::environment::ActionEnvironment;
use crate::error::Result;
use crate::execution::{ExecutionInterval, ExecutionTracker};
use crate::metrics::DispatchCounters;
use crate::safety::CommandGuard;
use crate::types::{ActionId, NpcId, PlayerId};

/// What happened to one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The action took effect.
    Executed,
    /// The action was not attempted: its conditions failed or ordering
    /// rules dropped it.
    Skipped {
        /// Why.
        reason: String,
    },
    /// The action is malformed or lacks a required player.
    Refused {
        /// Why.
        reason: String,
    },
    /// The command's verb is on the blocklist.
    Blocked {
        /// The blocked verb.
        verb: String,
    },
    /// A dialog transition could not find its target and closed the dialog.
    Fallback {
        /// Why.
        reason: String,
    },
    /// The host rejected the command.
    Failed {
        /// Why.
        reason: String,
    },
}

impl DispatchOutcome {
    /// Whether the action took effect.
    #[must_use]
    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed)
    }

    pub(crate) fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped { reason: reason.into() }
    }

    pub(crate) fn refused(reason: impl Into<String>) -> Self {
        Self::Refused { reason: reason.into() }
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Executed => f.write_str("executed"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
            Self::Refused { reason } => write!(f, "refused: {reason}"),
            Self::Blocked { verb } => write!(f, "blocked command '{verb}'"),
            Self::Fallback { reason } => write!(f, "closed dialog: {reason}"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Who triggered an action, and on which NPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionContext {
    /// NPC owning the dialog.
    pub npc: NpcId,
    /// Initiating player, if any.
    pub player: Option<PlayerId>,
}

/// Outcome of one action within an activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Derived action id.
    pub action: ActionId,
    /// Action kind.
    pub kind: ActionKind,
    /// What happened.
    pub outcome: DispatchOutcome,
}

/// Everything that happened when a button was activated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Per-action outcomes, in dispatch order.
    pub outcomes: Vec<ActionOutcome>,
    /// Whether the button's own conditions failed, so nothing ran.
    pub denied: bool,
}

impl ActivationReport {
    /// Number of actions that took effect.
    #[must_use]
    pub fn executed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_executed()).count()
    }

    /// Outcomes of actions of `kind`.
    pub fn of_kind(&self, kind: ActionKind) -> impl Iterator<Item = &DispatchOutcome> {
        self.outcomes
            .iter()
            .filter(move |o| o.kind == kind)
            .map(|o| &o.outcome)
    }
}

/// Turns activated buttons into effects on the host.
#[derive(Debug)]
pub struct ActionDispatcher {
    guard: CommandGuard,
    max_permission_level: u8,
    entity_permission_ceiling: u8,
    default_interval: ExecutionInterval,
    command_namespace: String,
    counters: DispatchCounters,
}

impl Default for ActionDispatcher {
    fn default() -> Self {
        Self::new(&PalaverConfig::default())
    }
}

impl ActionDispatcher {
    /// Dispatcher configured from `config`.
    #[must_use]
    pub fn new(config: &PalaverConfig) -> Self {
        Self {
            guard: CommandGuard::from_config(&config.dispatch),
            max_permission_level: config.dispatch.max_permission_level,
            entity_permission_ceiling: config.dispatch.entity_permission_ceiling,
            default_interval: config.execution.default_interval,
            command_namespace: config.dispatch.command_namespace.clone(),
            counters: DispatchCounters::new(),
        }
    }

    /// Dispatch counters.
    #[must_use]
    pub fn counters(&self) -> &DispatchCounters {
        &self.counters
    }

    /// The command screen in use.
    #[must_use]
    pub fn guard(&self) -> &CommandGuard {
        &self.guard
    }

    /// Root command of the `dialog open` shorthand.
    #[must_use]
    pub fn command_namespace(&self) -> &str {
        &self.command_namespace
    }

    /// Evaluator bound to `tracker` with this dispatcher's default interval.
    #[must_use]
    pub fn evaluator<'t>(&self, tracker: &'t ExecutionTracker) -> ConditionEvaluator<'t> {
        ConditionEvaluator::new(tracker, self.default_interval)
    }

    /// Run the actions of an activated button.
    ///
    /// Close-dialog actions run last and only once; of several screen actions
    /// (open default or named dialog) only the first usable one runs. A
    /// [`ButtonKind::Close`] button closes the dialog at the end even without
    /// an explicit close action.
    ///
    /// # Errors
    /// Returns an error if an execution record cannot be persisted. Actions
    /// dispatched before the failure keep their effect.
    pub fn activate<E: ActionEnvironment>(
        &self,
        button: &DialogButtonEntry,
        ctx: ActionContext,
        tracker: &ExecutionTracker,
        env: &mut E,
    ) -> Result<ActivationReport> {
        let evaluator = self.evaluator(tracker);
        let mut report = ActivationReport::default();

        if !button.conditions.is_empty() {
            let passed = {
                let player = ctx.player.and_then(|p| env.player(p));
                evaluator.evaluate_all(
                    &button.conditions.valid(),
                    player.as_deref(),
                    Some(button.id().into()),
                )
            };
            if !passed {
                info!(button = %button.label(), npc = %ctx.npc, "Button conditions not met");
                report.denied = true;
                return Ok(report);
            }
        }

        let mut close_action: Option<&ActionEntry> = None;
        let mut screen_action_taken = false;

        for action in &button.actions {
            if action.kind == ActionKind::CloseDialog {
                if close_action.is_none() {
                    close_action = Some(action);
                } else {
                    warn!(
                        button = %button.label(),
                        "Multiple close dialog actions, only the first runs"
                    );
                    DispatchCounters::bump(&self.counters.actions_skipped);
                    report.outcomes.push(ActionOutcome {
                        action: action.id(),
                        kind: action.kind,
                        outcome: DispatchOutcome::skipped("duplicate close dialog action"),
                    });
                }
                continue;
            }

            if action.kind.is_screen_action() {
                let skip_reason = if screen_action_taken {
                    Some("another screen action already ran")
                } else if !transition::has_usable_target(action, ctx.npc, &*env) {
                    Some("no dialog available for screen action")
                } else {
                    None
                };
                if let Some(reason) = skip_reason {
                    debug!(action = %action, reason, "Ignoring screen action");
                    DispatchCounters::bump(&self.counters.actions_skipped);
                    report.outcomes.push(ActionOutcome {
                        action: action.id(),
                        kind: action.kind,
                        outcome: DispatchOutcome::skipped(reason),
                    });
                    continue;
                }
                screen_action_taken = true;
            }

            let outcome = self.execute_action(action, ctx, &evaluator, env)?;
            report.outcomes.push(ActionOutcome {
                action: action.id(),
                kind: action.kind,
                outcome,
            });
        }

        match close_action {
            Some(action) => {
                let outcome = self.execute_action(action, ctx, &evaluator, env)?;
                report.outcomes.push(ActionOutcome {
                    action: action.id(),
                    kind: action.kind,
                    outcome,
                });
            }
            None if button.kind == ButtonKind::Close => {
                if let Some(player) = ctx.player {
                    env.close_dialog(player);
                }
            }
            None => {}
        }

        if let Some(player) = ctx.player {
            if report.executed() > 0
                && evaluator.record_executions(
                    &button.conditions.valid(),
                    player,
                    button.id().into(),
                )?
            {
                DispatchCounters::bump(&self.counters.executions_recorded);
            }
        }

        debug!(
            button = %button.label(),
            npc = %ctx.npc,
            executed = report.executed(),
            total = report.outcomes.len(),
            "Button activated"
        );
        Ok(report)
    }

    /// Validate, check, dispatch and record a single action.
    ///
    /// # Errors
    /// Returns an error if the execution record cannot be persisted.
    pub fn execute_action<E: ActionEnvironment>(
        &self,
        action: &ActionEntry,
        ctx: ActionContext,
        evaluator: &ConditionEvaluator<'_>,
        env: &mut E,
    ) -> Result<DispatchOutcome> {
        if let Err(reason) = Self::validate(action, ctx) {
            warn!(action = %action, npc = %ctx.npc, reason, "Refusing action");
            DispatchCounters::bump(&self.counters.actions_refused);
            return Ok(DispatchOutcome::refused(reason));
        }

        if !action.conditions.is_empty() {
            let passed = {
                let player = ctx.player.and_then(|p| env.player(p));
                evaluator.evaluate_all(&action.conditions, player.as_deref(), Some(action.id()))
            };
            if !passed {
                debug!(action = %action, "Action conditions not met");
                DispatchCounters::bump(&self.counters.actions_skipped);
                return Ok(DispatchOutcome::skipped("conditions not met"));
            }
        }

        let outcome = match action.kind {
            ActionKind::None => DispatchOutcome::refused("action has no type"),
            ActionKind::Command => command::execute(self, action, ctx, env),
            ActionKind::Scoreboard => scoreboard::execute(action, ctx, env),
            ActionKind::CloseDialog => transition::close_dialog(ctx, env),
            ActionKind::OpenNamedDialog => transition::open_named_dialog(action, ctx, env),
            ActionKind::OpenDefaultDialog => {
                transition::open_default_dialog(action, ctx, evaluator, env)?
            }
        };

        match &outcome {
            DispatchOutcome::Executed => {
                DispatchCounters::bump(&self.counters.actions_dispatched);
                if let Some(player) = ctx.player {
                    if evaluator.record_executions(&action.conditions, player, action.id())? {
                        DispatchCounters::bump(&self.counters.executions_recorded);
                    }
                }
            }
            DispatchOutcome::Blocked { .. } => {
                DispatchCounters::bump(&self.counters.commands_blocked);
            }
            DispatchOutcome::Fallback { .. } => {
                DispatchCounters::bump(&self.counters.dialog_fallbacks);
            }
            DispatchOutcome::Refused { .. } => {
                DispatchCounters::bump(&self.counters.actions_refused);
            }
            DispatchOutcome::Skipped { .. } | DispatchOutcome::Failed { .. } => {
                DispatchCounters::bump(&self.counters.actions_skipped);
            }
        }
        Ok(outcome)
    }

    fn validate(action: &ActionEntry, ctx: ActionContext) -> std::result::Result<(), &'static str> {
        if action.kind == ActionKind::None {
            return Err("action has no type");
        }
        if action.kind.requires_payload() && action.command.is_empty() {
            return Err("action has no payload");
        }
        let needs_player = match action.kind {
            ActionKind::Command => action.execute_as_user,
            ActionKind::None => false,
            ActionKind::Scoreboard
            | ActionKind::CloseDialog
            | ActionKind::OpenDefaultDialog
            | ActionKind::OpenNamedDialog => true,
        };
        if needs_player && ctx.player.is_none() {
            return Err("action needs a player");
        }
        Ok(())
    }
}
