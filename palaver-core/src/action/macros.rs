//! Macro expansion for authored command text.
//!
//! Runs right before a command is dispatched:
//!
//! | Macro                | Replaced by                        |
//! |----------------------|------------------------------------|
//! | `@npc-uuid`          | the NPC's id                       |
//! | `@npc`               | the NPC's display name             |
//! | `@initiator-uuid`    | the player's id                    |
//! | `@initiator`         | the player's name                  |
//! | `@score(objective)`  | the player's score, 0 when missing |
//!
//! Commands starting with `/error_message`, `/warn_message`, `/info_message`
//! or `/success_message` are first rewritten into a coloured `title` command
//! shown to the initiator.

use crate::environment::PlayerContext;
use crate::types::NpcId;

/// Objective names longer than this never resolve in `@score(...)`.
pub const MAX_OBJECTIVE_NAME_LENGTH: usize = 16;

const MESSAGE_SHORTCUTS: [(&str, &str); 4] = [
    ("/error_message", "dark_red"),
    ("/warn_message", "yellow"),
    ("/info_message", "aqua"),
    ("/success_message", "green"),
];

const SCORE_MACRO: &str = "@score(";

/// The NPC side of a macro expansion.
#[derive(Debug, Clone, Copy)]
pub struct NpcRef<'a> {
    /// NPC id.
    pub id: NpcId,
    /// Display name.
    pub name: &'a str,
}

/// Whether `text` contains any NPC or initiator macro.
#[must_use]
pub fn has_macros(text: &str) -> bool {
    text.contains("@npc") || text.contains("@initiator") || text.contains(SCORE_MACRO)
}

/// Expand every macro in `command`. Macros whose subject is absent are left
/// untouched.
#[must_use]
pub fn expand(
    command: &str,
    npc: Option<NpcRef<'_>>,
    player: Option<&dyn PlayerContext>,
) -> String {
    if command.is_empty() {
        return String::new();
    }
    let mut output = expand_message_shortcut(command);
    if !has_macros(&output) {
        return output;
    }

    if let Some(npc) = npc {
        output = output
            .replace("@npc-uuid", &npc.id.to_string())
            .replace("@npc", npc.name);
    }

    if let Some(player) = player {
        output = output
            .replace("@initiator-uuid", &player.id().to_string())
            .replace("@initiator", &player.name());
        output = expand_scores(&output, player);
    }
    output
}

fn expand_message_shortcut(command: &str) -> String {
    let slashed = if command.starts_with('/') {
        command.to_string()
    } else {
        format!("/{command}")
    };
    for (shortcut, color) in MESSAGE_SHORTCUTS {
        if let Some(rest) = slashed.strip_prefix(shortcut) {
            let message = rest.trim();
            let escaped = serde_json::Value::String(message.to_string()).to_string();
            return format!("/title @initiator title {{\"text\":{escaped},\"color\":\"{color}\"}}");
        }
    }
    command.to_string()
}

fn expand_scores(text: &str, player: &dyn PlayerContext) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(SCORE_MACRO) {
        out.push_str(&rest[..start]);
        let after = &rest[start + SCORE_MACRO.len()..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
            .unwrap_or(after.len());
        if name_len > 0 && after[name_len..].starts_with(')') {
            let objective = &after[..name_len];
            out.push_str(&score_of(player, objective).to_string());
            rest = &after[name_len + 1..];
        } else {
            out.push_str(SCORE_MACRO);
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

fn score_of(player: &dyn PlayerContext, objective: &str) -> i32 {
    if objective.len() > MAX_OBJECTIVE_NAME_LENGTH {
        return 0;
    }
    player.score(objective).unwrap_or(0)
}
