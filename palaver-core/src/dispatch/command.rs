//! Command actions.

use tracing::{debug, warn};

use crate::action::ActionEntry;
use crate::action::macros::{self, NpcRef};
use crate::dispatch::{ActionContext, ActionDispatcher, DispatchOutcome};
use crate::environment::{ActionEnvironment, CommandSource};
use crate::safety::{CommandVerdict, clamp_permission};

/// Expand macros, screen, clamp and hand the command to the host.
pub(crate) fn execute<E: ActionEnvironment>(
    dispatcher: &ActionDispatcher,
    action: &ActionEntry,
    ctx: ActionContext,
    env: &mut E,
) -> DispatchOutcome {
    let command = {
        let npc_name = env.npc_name(ctx.npc).unwrap_or_default();
        let player = ctx.player.and_then(|p| env.player(p));
        macros::expand(
            &action.command,
            Some(NpcRef {
                id: ctx.npc,
                name: &npc_name,
            }),
            player.as_deref(),
        )
    };

    match dispatcher.guard.check(&command) {
        CommandVerdict::Allowed => {}
        CommandVerdict::Empty => {
            return DispatchOutcome::refused("command is empty after expansion");
        }
        CommandVerdict::Blocked { verb } => {
            warn!(npc = %ctx.npc, verb = %verb, command = %command, "Blocked unsafe command");
            return DispatchOutcome::Blocked { verb };
        }
    }

    let cap = env.permission_cap(ctx.npc).min(dispatcher.max_permission_level);
    let ceiling = dispatcher.entity_permission_ceiling;
    let (source, level) = match (action.execute_as_user, ctx.player) {
        (true, Some(player)) => (
            CommandSource::Player(player),
            clamp_permission(action.permission_level, cap, false, ceiling),
        ),
        (true, None) => return DispatchOutcome::refused("command as user needs a player"),
        (false, _) => (
            CommandSource::Npc(ctx.npc),
            clamp_permission(action.permission_level, cap, true, ceiling),
        ),
    };

    if action.enable_debug {
        debug!(npc = %ctx.npc, command = %command, level, ?source, "Executing command");
    }
    if env.execute(&command, source, level, action.enable_debug) {
        DispatchOutcome::Executed
    } else {
        DispatchOutcome::Failed {
            reason: format!("host rejected '{command}'"),
        }
    }
}
