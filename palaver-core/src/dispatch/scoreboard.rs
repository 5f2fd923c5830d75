//! Scoreboard actions.

use tracing::{debug, warn};

use crate::action::{ActionEntry, ScoreboardCommand, ScoreboardOperation};
use crate::dispatch::{ActionContext, DispatchOutcome};
use crate::environment::ActionEnvironment;

/// Apply an `operation:objective[:value]` payload to the player's score,
/// creating the objective on first use.
pub(crate) fn execute<E: ActionEnvironment>(
    action: &ActionEntry,
    ctx: ActionContext,
    env: &mut E,
) -> DispatchOutcome {
    let Some(player) = ctx.player else {
        return DispatchOutcome::refused("scoreboard action needs a player");
    };
    let parsed: ScoreboardCommand = match action.command.parse() {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(
                npc = %ctx.npc,
                payload = %action.command,
                error = %e,
                "Malformed scoreboard action"
            );
            return DispatchOutcome::refused(e.to_string());
        }
    };

    if !env.has_objective(&parsed.objective) {
        env.add_objective(&parsed.objective);
        debug!(objective = %parsed.objective, "Created scoreboard objective");
    }

    let score = match parsed.operation {
        ScoreboardOperation::Increase => env.add_score(player, &parsed.objective, parsed.value),
        ScoreboardOperation::Decrease => {
            env.add_score(player, &parsed.objective, parsed.value.saturating_neg())
        }
        ScoreboardOperation::Set => {
            env.set_score(player, &parsed.objective, parsed.value);
            parsed.value
        }
    };
    if action.enable_debug {
        debug!(
            player = %player,
            objective = %parsed.objective,
            operation = parsed.operation.keyword(),
            value = parsed.value,
            score,
            "Scoreboard updated"
        );
    }
    DispatchOutcome::Executed
}
