//! Dialog transitions: open another dialog or close the current one.
//!
//! A transition whose target NPC or dialog is missing closes the player's
//! dialog instead of leaving a dangling screen.

use tracing::{debug, warn};

use crate::action::{ActionEntry, ActionKind};
use crate::condition::ConditionEvaluator;
use crate::dispatch::{ActionContext, DispatchOutcome};
use crate::environment::{ActionEnvironment, DialogHost};
use crate::error::Result;
use crate::types::NpcId;

/// Whether a screen action has something to open, checked before it claims
/// the activation's single screen slot.
pub(crate) fn has_usable_target<E: DialogHost>(action: &ActionEntry, npc: NpcId, env: &E) -> bool {
    match action.kind {
        ActionKind::OpenDefaultDialog => {
            let target = action.target.unwrap_or(npc);
            env.dialogs_of(target).is_some_and(|set| set.has_dialogs())
        }
        ActionKind::OpenNamedDialog => {
            action.target.is_some()
                || env
                    .dialogs_of(npc)
                    .is_some_and(|set| set.has_dialog_label(&action.command))
        }
        _ => true,
    }
}

pub(crate) fn close_dialog<E: ActionEnvironment>(
    ctx: ActionContext,
    env: &mut E,
) -> DispatchOutcome {
    match ctx.player {
        Some(player) => {
            env.close_dialog(player);
            DispatchOutcome::Executed
        }
        None => DispatchOutcome::refused("close dialog needs a player"),
    }
}

/// Open dialog `action.command` of the target NPC.
pub(crate) fn open_named_dialog<E: ActionEnvironment>(
    action: &ActionEntry,
    ctx: ActionContext,
    env: &mut E,
) -> DispatchOutcome {
    let Some(player) = ctx.player else {
        return DispatchOutcome::refused("open dialog needs a player");
    };
    let target = action.target.unwrap_or(ctx.npc);
    let label = action.command.as_str();

    let dialog = match env.dialogs_of(target) {
        None => Err(format!("NPC {target} not found")),
        Some(set) => set
            .dialog_id(label)
            .ok_or_else(|| format!("NPC {target} has no dialog '{label}'")),
    };
    match dialog {
        Ok(dialog) => {
            debug!(player = %player, npc = %target, dialog = label, "Opening dialog");
            env.open_dialog(player, target, dialog);
            DispatchOutcome::Executed
        }
        Err(reason) => {
            warn!(player = %player, reason = %reason, "Dialog transition failed, closing dialog");
            env.close_dialog(player);
            DispatchOutcome::Fallback { reason }
        }
    }
}

/// Resolve and open the target NPC's best dialog for the player, feeding
/// that dialog's execution limits.
///
/// # Errors
/// Returns an error if the dialog's execution record cannot be persisted.
pub(crate) fn open_default_dialog<E: ActionEnvironment>(
    action: &ActionEntry,
    ctx: ActionContext,
    evaluator: &ConditionEvaluator<'_>,
    env: &mut E,
) -> Result<DispatchOutcome> {
    let Some(player) = ctx.player else {
        return Ok(DispatchOutcome::refused("open dialog needs a player"));
    };
    let target = action.target.unwrap_or(ctx.npc);

    let resolved = {
        let context = env.player(player);
        match env.dialogs_of(target) {
            None => Err(format!("NPC {target} not found")),
            Some(set) => set
                .next_available_dialog(context.as_deref(), evaluator)
                .map(|dialog| (dialog.id(), dialog.conditions.valid()))
                .ok_or_else(|| format!("NPC {target} has no available dialog")),
        }
    };

    match resolved {
        Ok((dialog, conditions)) => {
            env.open_dialog(player, target, dialog);
            evaluator.record_executions(&conditions, player, dialog.into())?;
            Ok(DispatchOutcome::Executed)
        }
        Err(reason) => {
            warn!(player = %player, reason = %reason, "Default dialog unavailable, closing dialog");
            env.close_dialog(player);
            Ok(DispatchOutcome::Fallback { reason })
        }
    }
}
