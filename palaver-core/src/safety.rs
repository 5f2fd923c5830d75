//! Command safety: the administrative-verb blocklist and permission clamping.
//!
//! NPC commands are authored content and run on the server. Anything that
//! changes who may administer the server, stops it, or touches its
//! persistence is refused no matter which permission level the action asks
//! for.

use std::collections::BTreeSet;

use crate::config::DispatchConfig;

/// Verbs that are never dispatched.
pub const BLOCKED_COMMANDS: [&str; 19] = [
    "ban-ip",
    "ban",
    "banlist",
    "debug",
    "deop",
    "difficulty",
    "forceload",
    "gamerule",
    "kick",
    "op",
    "pardon",
    "reload",
    "save-all",
    "save-off",
    "save-on",
    "setidletimeout",
    "setworldspawn",
    "stop",
    "whitelist",
];

/// Result of screening one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandVerdict {
    /// The command may run.
    Allowed,
    /// Nothing left to run after trimming.
    Empty,
    /// The effective verb is on the blocklist.
    Blocked {
        /// The offending verb, lowercased.
        verb: String,
    },
}

impl CommandVerdict {
    /// Whether the command may run.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Screens commands against the built-in blocklist plus configured extras.
#[derive(Debug, Clone)]
pub struct CommandGuard {
    blocked: BTreeSet<String>,
}

impl Default for CommandGuard {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl CommandGuard {
    /// Guard with the built-in list plus `extra` verbs.
    #[must_use]
    pub fn new(extra: &[String]) -> Self {
        let blocked = BLOCKED_COMMANDS
            .iter()
            .map(|verb| (*verb).to_string())
            .chain(
                extra
                    .iter()
                    .map(|verb| verb.trim().trim_start_matches('/').to_ascii_lowercase()),
            )
            .filter(|verb| !verb.is_empty())
            .collect();
        Self { blocked }
    }

    /// Guard configured from the dispatch section.
    #[must_use]
    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(&config.extra_blocked_commands)
    }

    /// Screen `command`.
    #[must_use]
    pub fn check(&self, command: &str) -> CommandVerdict {
        let Some(verb) = effective_verb(command) else {
            return CommandVerdict::Empty;
        };
        if self.blocked.contains(&verb) {
            CommandVerdict::Blocked { verb }
        } else {
            CommandVerdict::Allowed
        }
    }

    /// Whether `verb` is blocked.
    #[must_use]
    pub fn is_blocked(&self, verb: &str) -> bool {
        self.blocked.contains(&verb.to_ascii_lowercase())
    }
}

/// The verb a command finally runs: leading slashes are stripped, each
/// `execute ... run <command>` layer is unwrapped at its first `run`, and a
/// `namespace:` prefix on the verb is dropped.
#[must_use]
pub fn effective_verb(command: &str) -> Option<String> {
    let tokens: Vec<&str> = command.trim().trim_start_matches('/').split_whitespace().collect();
    let mut inner = &tokens[..];
    loop {
        let verb = strip_namespace(inner.first()?.trim_start_matches('/'));
        if !verb.eq_ignore_ascii_case("execute") {
            break;
        }
        match inner.iter().position(|t| t.eq_ignore_ascii_case("run")) {
            Some(run) => inner = &inner[run + 1..],
            None => break,
        }
    }
    let verb = strip_namespace(inner.first()?.trim_start_matches('/')).to_ascii_lowercase();
    (!verb.is_empty()).then_some(verb)
}

fn strip_namespace(verb: &str) -> &str {
    verb.rsplit_once(':').map_or(verb, |(_, name)| name)
}

/// Permission level a command actually gets.
///
/// The requested level is bounded by `cap` (the host's limit for this NPC);
/// commands run as the NPC itself are further bounded by `entity_ceiling`.
#[must_use]
pub fn clamp_permission(requested: u8, cap: u8, as_entity: bool, entity_ceiling: u8) -> u8 {
    let level = requested.min(cap);
    if as_entity { level.min(entity_ceiling) } else { level }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_administrative_verbs() {
        let guard = CommandGuard::default();
        assert_eq!(
            guard.check("deop Steve"),
            CommandVerdict::Blocked {
                verb: "deop".to_string()
            }
        );
        assert!(!guard.check("/STOP").is_allowed());
        assert!(!guard.check("minecraft:op Steve").is_allowed());
        assert!(guard.check("say hello").is_allowed());
        assert!(guard.check("give @p bread").is_allowed());
    }

    #[test]
    fn unwraps_execute_chains() {
        let guard = CommandGuard::default();
        assert!(!guard.check("execute as @a at @s run op @s").is_allowed());
        assert!(!guard.check("/execute if entity @p run /kick Steve").is_allowed());
        assert!(guard.check("execute as @a run say hi").is_allowed());
        assert!(guard.check("say I run fast").is_allowed());
    }

    #[test]
    fn trailing_run_words_do_not_hide_the_verb() {
        let guard = CommandGuard::default();
        assert_eq!(
            effective_verb("execute as @a run kick Steve run faster").as_deref(),
            Some("kick")
        );
        assert!(!guard.check("execute run ban Steve run away").is_allowed());
        assert!(!guard.check("execute as @a run execute at @s run op Steve run").is_allowed());
        assert!(guard.check("execute as @a run say run run run").is_allowed());
        assert_eq!(effective_verb("execute as @a").as_deref(), Some("execute"));
    }

    #[test]
    fn empty_commands() {
        let guard = CommandGuard::default();
        assert_eq!(guard.check("   "), CommandVerdict::Empty);
        assert_eq!(guard.check("/"), CommandVerdict::Empty);
        assert_eq!(guard.check("execute as @a run"), CommandVerdict::Empty);
    }

    #[test]
    fn extra_verbs() {
        let guard = CommandGuard::new(&["/TP".to_string(), " ".to_string()]);
        assert!(guard.is_blocked("tp"));
        assert!(!guard.check("tp @p 0 0 0").is_allowed());
        assert!(guard.check("say tp").is_allowed());
    }

    #[test]
    fn permission_clamping() {
        assert_eq!(clamp_permission(4, 2, false, 3), 2);
        assert_eq!(clamp_permission(1, 4, false, 3), 1);
        assert_eq!(clamp_permission(4, 4, true, 3), 3);
        assert_eq!(clamp_permission(0, 4, true, 3), 0);
    }
}
