//! The two small command languages authored into actions.
//!
//! - Scoreboard payloads: `operation:objective[:value]`, e.g. `INCREASE:kills:1`
//! - The dialog-open shorthand: `[/][<namespace> ]dialog open <npc-uuid> <world> <label>`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::NpcId;

/// Why an authored payload could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    /// The payload has no `:` separating operation and objective.
    #[error("expected 'operation:objective[:value]', got '{0}'")]
    MissingObjective(String),
    /// The objective part is blank.
    #[error("objective name is empty")]
    EmptyObjective,
    /// The operation is not one of INCREASE, DECREASE, SET.
    #[error("unknown scoreboard operation '{0}'")]
    UnknownOperation(String),
    /// The value part is not an integer.
    #[error("value '{0}' is not an integer")]
    InvalidValue(String),
}

/// How a scoreboard action changes a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreboardOperation {
    /// Add the value.
    Increase,
    /// Subtract the value.
    Decrease,
    /// Overwrite with the value.
    Set,
}

impl ScoreboardOperation {
    /// Canonical keyword.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Increase => "INCREASE",
            Self::Decrease => "DECREASE",
            Self::Set => "SET",
        }
    }
}

impl FromStr for ScoreboardOperation {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCREASE" => Ok(Self::Increase),
            "DECREASE" => Ok(Self::Decrease),
            "SET" => Ok(Self::Set),
            _ => Err(CommandParseError::UnknownOperation(s.to_string())),
        }
    }
}

/// A parsed scoreboard payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreboardCommand {
    /// Increase, decrease or set.
    pub operation: ScoreboardOperation,
    /// Objective name.
    pub objective: String,
    /// Amount; defaults to 1.
    pub value: i32,
}

impl ScoreboardCommand {
    /// Build a payload.
    #[must_use]
    pub fn new(operation: ScoreboardOperation, objective: &str, value: i32) -> Self {
        Self {
            operation,
            objective: objective.trim().to_string(),
            value,
        }
    }
}

impl FromStr for ScoreboardCommand {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(3, ':');
        let operation = parts.next().unwrap_or_default();
        let Some(objective) = parts.next() else {
            return Err(CommandParseError::MissingObjective(s.to_string()));
        };
        let operation: ScoreboardOperation = operation.parse()?;
        let objective = objective.trim();
        if objective.is_empty() {
            return Err(CommandParseError::EmptyObjective);
        }
        let value = match parts.next() {
            Some(raw) => raw
                .trim()
                .parse::<i32>()
                .map_err(|_| CommandParseError::InvalidValue(raw.to_string()))?,
            None => 1,
        };
        Ok(Self::new(operation, objective, value))
    }
}

impl fmt::Display for ScoreboardCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.operation.keyword(), self.objective, self.value)
    }
}

/// A recognised `dialog open` shorthand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogOpenCommand {
    /// NPC whose dialog is opened.
    pub target: NpcId,
    /// Label of the dialog.
    pub label: String,
}

impl DialogOpenCommand {
    /// Parse `[/][<namespace> ]dialog open <uuid> <world> <label>`.
    ///
    /// The world token is accepted but not interpreted. Anything else,
    /// including extra tokens, yields `None`.
    #[must_use]
    pub fn parse(text: &str, namespace: &str) -> Option<Self> {
        let text = text.trim();
        let text = text.strip_prefix('/').unwrap_or(text);
        let mut tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.first().is_some_and(|t| t.eq_ignore_ascii_case(namespace)) {
            tokens.remove(0);
        }
        match tokens.as_slice() {
            [dialog, open, uuid, _world, label]
                if dialog.eq_ignore_ascii_case("dialog") && open.eq_ignore_ascii_case("open") =>
            {
                let target = Uuid::parse_str(uuid).ok()?;
                Some(Self {
                    target: NpcId(target),
                    label: (*label).to_string(),
                })
            }
            _ => None,
        }
    }

    /// Render in canonical form under `namespace`.
    #[must_use]
    pub fn to_command(&self, namespace: &str, world: &str) -> String {
        format!("/{namespace} dialog open {} {world} {}", self.target, self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoreboard_payloads() {
        let cmd: ScoreboardCommand = "INCREASE:kills:1".parse().expect("parse");
        assert_eq!(cmd, ScoreboardCommand::new(ScoreboardOperation::Increase, "kills", 1));
        let cmd: ScoreboardCommand = "set:gold:-5".parse().expect("parse");
        assert_eq!(cmd.operation, ScoreboardOperation::Set);
        assert_eq!(cmd.value, -5);
        let cmd: ScoreboardCommand = "decrease:rep".parse().expect("parse");
        assert_eq!(cmd.value, 1);
        assert_eq!(cmd.to_string(), "DECREASE:rep:1");
    }

    #[test]
    fn display_parses_back() {
        let cmd = ScoreboardCommand::new(ScoreboardOperation::Decrease, "honor", 12);
        assert_eq!(cmd.to_string().parse::<ScoreboardCommand>(), Ok(cmd));
    }

    #[test]
    fn malformed_scoreboard_payloads() {
        assert!(matches!(
            "INCREASE".parse::<ScoreboardCommand>(),
            Err(CommandParseError::MissingObjective(_))
        ));
        assert_eq!(
            "INCREASE: :1".parse::<ScoreboardCommand>(),
            Err(CommandParseError::EmptyObjective)
        );
        assert!(matches!(
            "INCREASE:kills:many".parse::<ScoreboardCommand>(),
            Err(CommandParseError::InvalidValue(_))
        ));
        assert!(matches!(
            "MULTIPLY:kills:2".parse::<ScoreboardCommand>(),
            Err(CommandParseError::UnknownOperation(_))
        ));
    }

    #[test]
    fn dialog_open_shorthand() {
        let npc = Uuid::new_v4();
        let parse = |text: String| DialogOpenCommand::parse(&text, "palaver");
        let parsed =
            parse(format!("/palaver dialog open {npc} overworld shop")).expect("shorthand");
        assert_eq!(parsed.target, NpcId(npc));
        assert_eq!(parsed.label, "shop");

        assert!(parse(format!("dialog open {npc} w shop")).is_some());
        assert!(parse("dialog open not-a-uuid w shop".to_string()).is_none());
        assert!(parse(format!("dialog open {npc} w")).is_none());
        assert!(parse(format!("say dialog open {npc} w shop")).is_none());
    }

    #[test]
    fn shorthand_round_trip() {
        let cmd = DialogOpenCommand {
            target: NpcId(Uuid::new_v4()),
            label: "quest_hint".to_string(),
        };
        let text = cmd.to_command("palaver", "world");
        assert_eq!(DialogOpenCommand::parse(&text, "palaver"), Some(cmd));
    }
}
