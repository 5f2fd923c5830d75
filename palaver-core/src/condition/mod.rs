//! Conditions gating dialogs, buttons and actions.
//!
//! A [`ConditionEntry`] is a small declarative predicate over a player: a
//! scoreboard comparison, a rate limit, or a quest-state check. Entries are
//! grouped into a [`ConditionSet`], which is conjunctive: every valid entry
//! must hold.

pub mod evaluator;
pub mod operation;

pub use evaluator::ConditionEvaluator;
pub use operation::ConditionOperation;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::execution::ExecutionInterval;
use crate::types::{ConditionId, derive_uuid};

/// What a condition checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionKind {
    /// Placeholder; never valid, skipped when evaluated.
    #[default]
    None,
    /// Compare the player's score on objective `name` against `value`.
    Scoreboard,
    /// At most `value` executions per interval `text`.
    ExecutionLimit,
    /// The player has not accepted quest `name` (or no quest at all).
    QuestNotAccepted,
}

impl ConditionKind {
    /// Keyword used in logs and the canonical id string.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Scoreboard => "SCOREBOARD",
            Self::ExecutionLimit => "EXECUTION_LIMIT",
            Self::QuestNotAccepted => "QUEST_NOT_ACCEPTED",
        }
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One declarative predicate.
///
/// Fields left at their default are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConditionEntry {
    /// What is checked.
    #[serde(rename = "type", default)]
    pub kind: ConditionKind,
    /// Comparison for scoreboard conditions.
    #[serde(default, skip_serializing_if = "is_none_operation")]
    pub operation: ConditionOperation,
    /// Objective name or quest id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Expected score or execution limit.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub value: i32,
    /// Interval keyword for execution limits.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

fn is_none_operation(op: &ConditionOperation) -> bool {
    *op == ConditionOperation::None
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &i32) -> bool {
    *value == 0
}

impl ConditionEntry {
    /// Build an entry; `name` and `text` are trimmed.
    #[must_use]
    pub fn new(
        kind: ConditionKind,
        operation: ConditionOperation,
        name: &str,
        value: i32,
        text: &str,
    ) -> Self {
        Self {
            kind,
            operation,
            name: name.trim().to_string(),
            value,
            text: text.trim().to_string(),
        }
    }

    /// `score(objective) <operation> value`.
    #[must_use]
    pub fn scoreboard(objective: &str, operation: ConditionOperation, value: i32) -> Self {
        Self::new(ConditionKind::Scoreboard, operation, objective, value, "")
    }

    /// At most `limit` executions per `interval`.
    #[must_use]
    pub fn execution_limit(limit: i32, interval: ExecutionInterval) -> Self {
        Self::new(
            ConditionKind::ExecutionLimit,
            ConditionOperation::None,
            "",
            limit,
            interval.keyword(),
        )
    }

    /// The player has not accepted `quest`; an empty or non-UUID name
    /// means "has no quest at all".
    #[must_use]
    pub fn quest_not_accepted(quest: &str) -> Self {
        Self::new(ConditionKind::QuestNotAccepted, ConditionOperation::None, quest, 0, "")
    }

    /// Whether the entry carries everything its kind needs.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self.kind {
            ConditionKind::None => false,
            ConditionKind::Scoreboard => {
                !self.name.trim().is_empty() && self.operation != ConditionOperation::None
            }
            ConditionKind::ExecutionLimit => self.value > 0 && !self.text.trim().is_empty(),
            ConditionKind::QuestNotAccepted => true,
        }
    }

    /// Deterministic id derived from the field values.
    #[must_use]
    pub fn id(&self) -> ConditionId {
        ConditionId(derive_uuid(&format!(
            "condition:{}|{}|{}|{}|{}",
            self.kind.keyword(),
            self.operation.symbol(),
            self.name.trim(),
            self.value,
            self.text.trim()
        )))
    }

    /// The execution interval of an execution-limit entry, falling back to
    /// `fallback` for unrecognised keywords.
    #[must_use]
    pub fn interval_or(&self, fallback: ExecutionInterval) -> ExecutionInterval {
        ExecutionInterval::parse_or(&self.text, fallback)
    }
}

impl fmt::Display for ConditionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ConditionKind::None => f.write_str("NONE"),
            ConditionKind::Scoreboard => {
                write!(f, "score({}) {} {}", self.name, self.operation, self.value)
            }
            ConditionKind::ExecutionLimit => write!(f, "limit {} {}", self.value, self.text),
            ConditionKind::QuestNotAccepted if self.name.is_empty() => {
                f.write_str("no quest accepted")
            }
            ConditionKind::QuestNotAccepted => write!(f, "quest {} not accepted", self.name),
        }
    }
}

/// Ordered, id-deduplicated collection of conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ConditionEntry>", into = "Vec<ConditionEntry>")]
pub struct ConditionSet {
    entries: Vec<ConditionEntry>,
}

impl ConditionSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a valid entry. An entry with the same id is replaced and moves to
    /// the end. Invalid entries are refused.
    pub fn add(&mut self, entry: ConditionEntry) -> bool {
        if !entry.is_valid() {
            tracing::debug!(condition = %entry, "Refusing invalid condition");
            return false;
        }
        let id = entry.id();
        self.entries.retain(|existing| existing.id() != id);
        self.entries.push(entry);
        true
    }

    /// Builder form of [`Self::add`].
    #[must_use]
    pub fn with(mut self, entry: ConditionEntry) -> Self {
        self.add(entry);
        self
    }

    /// Remove the entry with `id`.
    pub fn remove(&mut self, id: ConditionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id() != id);
        self.entries.len() != before
    }

    /// Whether an entry with `id` is present.
    #[must_use]
    pub fn contains(&self, id: ConditionId) -> bool {
        self.entries.iter().any(|entry| entry.id() == id)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, ConditionEntry> {
        self.entries.iter()
    }

    /// Only the valid entries.
    #[must_use]
    pub fn valid(&self) -> Self {
        Self {
            entries: self.entries.iter().filter(|e| e.is_valid()).cloned().collect(),
        }
    }

    /// Whether any entry is an execution limit.
    #[must_use]
    pub fn has_execution_limit(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.kind == ConditionKind::ExecutionLimit)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl From<Vec<ConditionEntry>> for ConditionSet {
    /// Stored entries are kept even if invalid so that the evaluator can
    /// report them; only duplicates collapse.
    fn from(entries: Vec<ConditionEntry>) -> Self {
        let mut set = Self::new();
        for entry in entries {
            let id = entry.id();
            set.entries.retain(|existing| existing.id() != id);
            set.entries.push(entry);
        }
        set
    }
}

impl From<ConditionSet> for Vec<ConditionEntry> {
    fn from(set: ConditionSet) -> Self {
        set.entries
    }
}

impl FromIterator<ConditionEntry> for ConditionSet {
    fn from_iter<I: IntoIterator<Item = ConditionEntry>>(iter: I) -> Self {
        let mut set = Self::new();
        for entry in iter {
            set.add(entry);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ConditionSet {
    type Item = &'a ConditionEntry;
    type IntoIter = std::slice::Iter<'a, ConditionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_rules() {
        assert!(!ConditionEntry::default().is_valid());
        assert!(ConditionEntry::scoreboard("kills", ConditionOperation::GreaterThan, 0).is_valid());
        assert!(!ConditionEntry::scoreboard("  ", ConditionOperation::GreaterThan, 0).is_valid());
        assert!(!ConditionEntry::scoreboard("kills", ConditionOperation::None, 0).is_valid());
        assert!(ConditionEntry::execution_limit(1, ExecutionInterval::PerDay).is_valid());
        assert!(!ConditionEntry::execution_limit(0, ExecutionInterval::PerDay).is_valid());
        let mut no_interval = ConditionEntry::execution_limit(1, ExecutionInterval::PerDay);
        no_interval.text.clear();
        assert!(!no_interval.is_valid());
        assert!(ConditionEntry::quest_not_accepted("").is_valid());
    }

    #[test]
    fn ids_follow_field_values() {
        let a = ConditionEntry::scoreboard("kills", ConditionOperation::Equals, 3);
        let b = ConditionEntry::scoreboard(" kills ", ConditionOperation::Equals, 3);
        let c = ConditionEntry::scoreboard("kills", ConditionOperation::Equals, 4);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn set_deduplicates_and_refuses_invalid() {
        let mut set = ConditionSet::new();
        assert!(set.add(ConditionEntry::scoreboard("kills", ConditionOperation::Equals, 3)));
        assert!(set.add(ConditionEntry::execution_limit(1, ExecutionInterval::PerHour)));
        assert!(set.add(ConditionEntry::scoreboard("kills", ConditionOperation::Equals, 3)));
        assert!(!set.add(ConditionEntry::default()));
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().last().map(|e| e.kind), Some(ConditionKind::Scoreboard));
        assert!(set.has_execution_limit());
    }

    #[test]
    fn serialization_omits_defaults() {
        let entry = ConditionEntry::execution_limit(2, ExecutionInterval::PerWeek);
        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"type": "EXECUTION_LIMIT", "value": 2, "text": "PER_WEEK"})
        );

        let restored: ConditionEntry = serde_json::from_value(json).expect("deserialize");
        assert_eq!(restored, entry);
        assert_eq!(restored.id(), entry.id());
    }

    #[test]
    fn stored_invalid_entries_survive_load() {
        let json = r#"[{"type":"NONE"},{"type":"SCOREBOARD","name":"x","operation":"EQUALS"}]"#;
        let set: ConditionSet = serde_json::from_str(json).expect("deserialize");
        assert_eq!(set.len(), 2);
        assert_eq!(set.valid().len(), 1);
    }
}
