//! Typed actions attached to dialog buttons.

pub mod command;
pub mod macros;

pub use command::{CommandParseError, DialogOpenCommand, ScoreboardCommand, ScoreboardOperation};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::condition::ConditionSet;
use crate::types::{ActionId, NpcId, derive_uuid};

/// Lowest permission level an action may request.
pub const MIN_PERMISSION_LEVEL: u8 = 0;
/// Highest permission level an action may request.
pub const MAX_PERMISSION_LEVEL: u8 = 4;

/// What an action does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// Does nothing.
    #[default]
    None,
    /// Run a textual command.
    Command,
    /// Mutate a scoreboard (`INCREASE:kills:1`).
    Scoreboard,
    /// Close the open dialog.
    CloseDialog,
    /// Re-resolve and open the target NPC's dialog.
    OpenDefaultDialog,
    /// Open the target NPC's dialog with the label in `command`.
    OpenNamedDialog,
}

impl ActionKind {
    /// Whether the kind needs a non-empty `command` payload.
    #[must_use]
    pub fn requires_payload(self) -> bool {
        matches!(self, Self::Command | Self::Scoreboard | Self::OpenNamedDialog)
    }

    /// Whether the kind switches what the player sees.
    #[must_use]
    pub fn is_screen_action(self) -> bool {
        matches!(self, Self::OpenDefaultDialog | Self::OpenNamedDialog)
    }

    /// Keyword used in logs and ids.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Command => "COMMAND",
            Self::Scoreboard => "SCOREBOARD",
            Self::CloseDialog => "CLOSE_DIALOG",
            Self::OpenDefaultDialog => "OPEN_DEFAULT_DIALOG",
            Self::OpenNamedDialog => "OPEN_NAMED_DIALOG",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One action. Default-valued fields are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredAction")]
pub struct ActionEntry {
    /// What the action does.
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Payload: command text, scoreboard expression or dialog label.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub command: String,
    /// Target NPC of dialog transitions; `None` means the owning NPC.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<NpcId>,
    /// Run commands as the player instead of the NPC.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub execute_as_user: bool,
    /// Ask the host to report command output.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub enable_debug: bool,
    /// Requested permission level, 0 to 4.
    #[serde(skip_serializing_if = "is_zero")]
    pub permission_level: u8,
    /// Conditions re-checked right before dispatch.
    #[serde(skip_serializing_if = "ConditionSet::is_empty")]
    pub conditions: ConditionSet,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &u8) -> bool {
    *value == 0
}

/// Lenient stored form; normalised into [`ActionEntry`].
#[derive(Deserialize)]
struct StoredAction {
    #[serde(rename = "type", default)]
    kind: ActionKind,
    #[serde(default)]
    command: String,
    #[serde(default)]
    target: Option<NpcId>,
    #[serde(default)]
    execute_as_user: bool,
    #[serde(default)]
    enable_debug: bool,
    #[serde(default)]
    permission_level: i64,
    #[serde(default)]
    conditions: ConditionSet,
}

impl From<StoredAction> for ActionEntry {
    fn from(stored: StoredAction) -> Self {
        let permission = stored
            .permission_level
            .clamp(i64::from(MIN_PERMISSION_LEVEL), i64::from(MAX_PERMISSION_LEVEL));
        Self {
            kind: stored.kind,
            command: stored.command.trim().to_string(),
            target: stored.target,
            execute_as_user: stored.execute_as_user,
            enable_debug: stored.enable_debug,
            permission_level: u8::try_from(permission).unwrap_or(MIN_PERMISSION_LEVEL),
            conditions: stored.conditions,
        }
    }
}

impl ActionEntry {
    /// An action of `kind` with `payload`, trimmed.
    #[must_use]
    pub fn new(kind: ActionKind, payload: &str) -> Self {
        Self {
            kind,
            command: payload.trim().to_string(),
            ..Self::default()
        }
    }

    /// Run `command` as the NPC with `permission_level`.
    #[must_use]
    pub fn command(command: &str, permission_level: u8) -> Self {
        Self::new(ActionKind::Command, command).with_permission_level(permission_level)
    }

    /// Apply a scoreboard expression.
    #[must_use]
    pub fn scoreboard(expression: &str) -> Self {
        Self::new(ActionKind::Scoreboard, expression)
    }

    /// Close the open dialog.
    #[must_use]
    pub fn close_dialog() -> Self {
        Self::new(ActionKind::CloseDialog, "")
    }

    /// Open the default dialog of `target` (or the owning NPC).
    #[must_use]
    pub fn open_default_dialog(target: Option<NpcId>) -> Self {
        Self {
            target,
            ..Self::new(ActionKind::OpenDefaultDialog, "")
        }
    }

    /// Open dialog `label` of `target` (or the owning NPC).
    #[must_use]
    pub fn open_named_dialog(label: &str, target: Option<NpcId>) -> Self {
        Self {
            target,
            ..Self::new(ActionKind::OpenNamedDialog, label)
        }
    }

    /// Turn authored command text into an action: the `dialog open`
    /// shorthand becomes a named-dialog transition, anything else a command.
    #[must_use]
    pub fn from_authored_command(text: &str, namespace: &str, permission_level: u8) -> Self {
        match DialogOpenCommand::parse(text, namespace) {
            Some(open) => Self::open_named_dialog(&open.label, Some(open.target)),
            None => Self::command(text, permission_level),
        }
    }

    /// Set the requested permission level, clamped to 0..=4.
    #[must_use]
    pub fn with_permission_level(mut self, level: u8) -> Self {
        self.permission_level = level.clamp(MIN_PERMISSION_LEVEL, MAX_PERMISSION_LEVEL);
        self
    }

    /// Run as the player instead of the NPC.
    #[must_use]
    pub fn as_user(mut self) -> Self {
        self.execute_as_user = true;
        self
    }

    /// Ask the host for command feedback.
    #[must_use]
    pub fn with_debug(mut self) -> Self {
        self.enable_debug = true;
        self
    }

    /// Gate the action on `conditions`.
    #[must_use]
    pub fn with_conditions(mut self, conditions: ConditionSet) -> Self {
        self.conditions = conditions;
        self
    }

    /// Deterministic id over the effect fields; conditions do not take part,
    /// so editing a rate limit keeps the execution history.
    #[must_use]
    pub fn id(&self) -> ActionId {
        let target = self.target.map(|t| t.to_string()).unwrap_or_default();
        ActionId(derive_uuid(&format!(
            "action:{}|{}|{}|{}|{}|{}",
            self.kind.keyword(),
            self.command,
            target,
            self.execute_as_user,
            self.enable_debug,
            self.permission_level
        )))
    }

    /// Whether the action has what its kind needs. Player presence is
    /// checked at dispatch time.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self.kind {
            ActionKind::None => false,
            kind if kind.requires_payload() => !self.command.is_empty(),
            _ => true,
        }
    }
}

impl fmt::Display for ActionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.command.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}({})", self.kind, self.command)
        }
    }
}

/// Ordered actions of one button.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSet {
    entries: Vec<ActionEntry>,
}

impl ActionSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action. `None` actions are ignored.
    pub fn add(&mut self, entry: ActionEntry) -> bool {
        if entry.kind == ActionKind::None {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Builder form of [`Self::add`].
    #[must_use]
    pub fn with(mut self, entry: ActionEntry) -> Self {
        self.add(entry);
        self
    }

    /// Remove every action with `id`.
    pub fn remove(&mut self, id: ActionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id() != id);
        self.entries.len() != before
    }

    /// Whether any action has `kind`.
    #[must_use]
    pub fn has_kind(&self, kind: ActionKind) -> bool {
        self.entries.iter().any(|entry| entry.kind == kind)
    }

    /// Iterate in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ActionEntry> {
        self.entries.iter()
    }

    /// Number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ActionEntry> for ActionSet {
    fn from_iter<I: IntoIterator<Item = ActionEntry>>(iter: I) -> Self {
        let mut set = Self::new();
        for entry in iter {
            set.add(entry);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ActionSet {
    type Item = &'a ActionEntry;
    type IntoIter = std::slice::Iter<'a, ActionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionEntry;
    use crate::execution::ExecutionInterval;
    use uuid::Uuid;

    #[test]
    fn payload_is_trimmed_and_permission_clamped() {
        let action = ActionEntry::command("  say hi  ", 9);
        assert_eq!(action.command, "say hi");
        assert_eq!(action.permission_level, MAX_PERMISSION_LEVEL);
    }

    #[test]
    fn id_ignores_conditions() {
        let plain = ActionEntry::command("say hi", 0);
        let limited = plain.clone().with_conditions(
            ConditionSet::new().with(ConditionEntry::execution_limit(1, ExecutionInterval::PerDay)),
        );
        assert_eq!(plain.id(), limited.id());
        assert_ne!(plain.id(), ActionEntry::command("say hi", 1).id());
        assert_ne!(plain.id(), plain.clone().as_user().id());
    }

    #[test]
    fn validity() {
        assert!(!ActionEntry::default().is_valid());
        assert!(!ActionEntry::command("   ", 0).is_valid());
        assert!(ActionEntry::close_dialog().is_valid());
        assert!(ActionEntry::open_default_dialog(None).is_valid());
        assert!(!ActionEntry::open_named_dialog("", None).is_valid());
    }

    #[test]
    fn serialization_omits_defaults_and_keeps_id() {
        let action = ActionEntry::command("say hi", 0);
        let json = serde_json::to_value(&action).expect("serialize");
        assert_eq!(json, serde_json::json!({"type": "COMMAND", "command": "say hi"}));

        let target = NpcId(Uuid::new_v4());
        let full = ActionEntry::open_named_dialog("shop", Some(target))
            .as_user()
            .with_debug()
            .with_permission_level(2);
        let json = serde_json::to_string(&full).expect("serialize");
        let restored: ActionEntry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, full);
        assert_eq!(restored.id(), full.id());
    }

    #[test]
    fn stored_permission_is_clamped() {
        let action: ActionEntry =
            serde_json::from_str(r#"{"type":"COMMAND","command":" say x ","permission_level":-3}"#)
                .expect("deserialize");
        assert_eq!(action.permission_level, 0);
        assert_eq!(action.command, "say x");
        let action: ActionEntry =
            serde_json::from_str(r#"{"type":"COMMAND","command":"x","permission_level":12}"#)
                .expect("deserialize");
        assert_eq!(action.permission_level, 4);
    }

    #[test]
    fn authored_shorthand_becomes_transition() {
        let npc = Uuid::new_v4();
        let authored = format!("/palaver dialog open {npc} world shop");
        let action = ActionEntry::from_authored_command(&authored, "palaver", 0);
        assert_eq!(action.kind, ActionKind::OpenNamedDialog);
        assert_eq!(action.command, "shop");
        assert_eq!(action.target, Some(NpcId(npc)));

        let action = ActionEntry::from_authored_command("give @initiator bread", "palaver", 2);
        assert_eq!(action.kind, ActionKind::Command);
        assert_eq!(action.permission_level, 2);
    }

    #[test]
    fn set_keeps_order_and_skips_none() {
        let set: ActionSet = [
            ActionEntry::command("say a", 0),
            ActionEntry::default(),
            ActionEntry::close_dialog(),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
        assert!(set.has_kind(ActionKind::CloseDialog));
        let kinds: Vec<_> = set.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![ActionKind::Command, ActionKind::CloseDialog]);
    }
}
