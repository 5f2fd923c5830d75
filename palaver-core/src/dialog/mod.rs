//! Dialogs, their buttons, and the per-NPC dialog set.

pub mod button;
pub mod label;
pub mod priority;
pub mod set;

pub use button::{ButtonKind, DialogButtonEntry};
pub use set::{DialogSet, DialogType};

use serde::{Deserialize, Serialize};

use crate::condition::{ConditionEvaluator, ConditionSet};
use crate::environment::PlayerContext;
use crate::types::{ButtonId, DialogId};

/// Buttons offered to the UI per dialog unless configured otherwise.
pub const DEFAULT_MAX_BUTTONS: usize = 6;

/// One dialog: text shown by an NPC plus the buttons answering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredDialog")]
pub struct DialogEntry {
    /// Unique key within the set; the id is derived from it.
    pub label: String,
    /// Display name, possibly a translation key.
    pub name: String,
    /// Text shown to the player. Must not be empty.
    pub text: String,
    /// Resolution priority, see [`priority`].
    pub priority: i32,
    /// Conditions under which the dialog may be picked.
    #[serde(skip_serializing_if = "ConditionSet::is_empty")]
    pub conditions: ConditionSet,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    buttons: Vec<DialogButtonEntry>,
}

#[derive(Deserialize)]
struct StoredDialog {
    #[serde(default)]
    label: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    conditions: ConditionSet,
    #[serde(default)]
    buttons: Vec<DialogButtonEntry>,
}

impl From<StoredDialog> for DialogEntry {
    fn from(stored: StoredDialog) -> Self {
        let mut dialog =
            Self::new(&stored.label, &stored.name, &stored.text).with_priority(stored.priority);
        dialog.conditions = stored.conditions;
        for button in stored.buttons {
            dialog.add_button(button);
        }
        dialog
    }
}

impl DialogEntry {
    /// A dialog at [`priority::FALLBACK`]. An empty label is generated from
    /// `name`.
    #[must_use]
    pub fn new(label: &str, name: &str, text: &str) -> Self {
        let label = if label.trim().is_empty() {
            label::generate_dialog_label(name)
        } else {
            label.trim().to_string()
        };
        Self {
            priority: priority::FALLBACK,
            label,
            name: name.to_string(),
            text: text.to_string(),
            conditions: ConditionSet::new(),
            buttons: Vec::new(),
        }
    }

    /// Builder: set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Builder: set the conditions.
    #[must_use]
    pub fn with_conditions(mut self, conditions: ConditionSet) -> Self {
        self.conditions = conditions;
        self
    }

    /// Builder: add a button.
    #[must_use]
    pub fn with_button(mut self, button: DialogButtonEntry) -> Self {
        self.add_button(button);
        self
    }

    /// Id derived from the label.
    #[must_use]
    pub fn id(&self) -> DialogId {
        DialogId::from_label(&self.label)
    }

    /// Add a button; a button with the same id is replaced in place.
    pub fn add_button(&mut self, button: DialogButtonEntry) {
        let id = button.id();
        match self.buttons.iter_mut().find(|existing| existing.id() == id) {
            Some(existing) => *existing = button,
            None => self.buttons.push(button),
        }
    }

    /// Remove the button with `id`.
    pub fn remove_button(&mut self, id: ButtonId) -> bool {
        let before = self.buttons.len();
        self.buttons.retain(|button| button.id() != id);
        self.buttons.len() != before
    }

    /// The button with `id`.
    #[must_use]
    pub fn button(&self, id: ButtonId) -> Option<&DialogButtonEntry> {
        self.buttons.iter().find(|button| button.id() == id)
    }

    /// The button labelled `label`.
    #[must_use]
    pub fn button_by_label(&self, label: &str) -> Option<&DialogButtonEntry> {
        self.buttons.iter().find(|button| button.label() == label)
    }

    /// Whether the dialog has a button with `id`.
    #[must_use]
    pub fn has_button(&self, id: ButtonId) -> bool {
        self.button(id).is_some()
    }

    /// All buttons in authored order.
    #[must_use]
    pub fn buttons(&self) -> &[DialogButtonEntry] {
        &self.buttons
    }

    /// The first `max` buttons whose conditions pass for `player`.
    #[must_use]
    pub fn available_buttons(
        &self,
        evaluator: &ConditionEvaluator<'_>,
        player: Option<&dyn PlayerContext>,
        max: usize,
    ) -> Vec<&DialogButtonEntry> {
        self.buttons
            .iter()
            .filter(|button| {
                evaluator.evaluate_all(&button.conditions.valid(), player, Some(button.id().into()))
            })
            .take(max)
            .collect()
    }

    /// Whether the dialog's name is a translation key.
    #[must_use]
    pub fn is_translation_key(&self) -> bool {
        label::is_translation_key(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::ManualClock;
    use crate::condition::{ConditionEntry, ConditionOperation};
    use crate::execution::{ExecutionInterval, ExecutionTracker};
    use crate::types::{PlayerId, QuestId, WorldId};

    struct NoScores(PlayerId);

    impl PlayerContext for NoScores {
        fn id(&self) -> PlayerId {
            self.0
        }

        fn name(&self) -> String {
            "Steve".to_string()
        }

        fn score(&self, _objective: &str) -> Option<i32> {
            None
        }

        fn tracked_quest_ids(&self) -> Vec<QuestId> {
            Vec::new()
        }
    }

    #[test]
    fn empty_label_is_generated_from_name() {
        let dialog = DialogEntry::new("", "Main", "Hello");
        assert_eq!(dialog.label, "main");
        assert_eq!(dialog.priority, priority::FALLBACK);
        assert_eq!(dialog.id(), DialogId::from_label("main"));
    }

    #[test]
    fn keyword_labels_do_not_imply_priority() {
        let welcome = DialogEntry::new("welcome", "Welcome", "Hi");
        assert_eq!(welcome.priority, priority::FALLBACK);
        let stored: DialogEntry =
            serde_json::from_str(r#"{"label":"goodbye","name":"Bye","text":"See you"}"#)
                .expect("parse");
        assert_eq!(stored.priority, priority::FALLBACK);

        let suggested = DialogEntry::new("welcome", "Welcome", "Hi")
            .with_priority(priority::default_priority_for("welcome"));
        assert_eq!(suggested.priority, priority::HIGH);
    }

    #[test]
    fn buttons_deduplicate_by_id() {
        let mut dialog = DialogEntry::new("main", "Main", "Hello");
        dialog.add_button(DialogButtonEntry::new("Yes"));
        dialog.add_button(DialogButtonEntry::new("No"));
        dialog.add_button(DialogButtonEntry::new("Yes").with_kind(ButtonKind::Action));
        assert_eq!(dialog.buttons().len(), 2);
        assert_eq!(dialog.buttons()[0].kind, ButtonKind::Action);
        assert!(dialog.remove_button(ButtonId::from_label("no")));
        assert!(!dialog.remove_button(ButtonId::from_label("no")));
    }

    #[test]
    fn available_buttons_respect_conditions_and_cap() {
        let tracker = ExecutionTracker::with_clock(WorldId::new(), Arc::new(ManualClock::new(0)));
        let eval = ConditionEvaluator::new(&tracker, ExecutionInterval::PerDay);
        let player = NoScores(PlayerId::new());
        let mut dialog = DialogEntry::new("main", "Main", "Hello");
        dialog.add_button(DialogButtonEntry::new("Hidden").with_conditions(
            ConditionSet::new().with(ConditionEntry::scoreboard(
                "gold",
                ConditionOperation::GreaterThan,
                0,
            )),
        ));
        for i in 0..8 {
            dialog.add_button(DialogButtonEntry::new(&format!("Option {i}")));
        }
        let offered = dialog.available_buttons(&eval, Some(&player), DEFAULT_MAX_BUTTONS);
        assert_eq!(offered.len(), 6);
        assert_eq!(offered[0].label(), "option_0");
    }

    #[test]
    fn serialized_shape() {
        let dialog = DialogEntry::new("welcome", "Welcome", "Hi there")
            .with_button(DialogButtonEntry::close("Bye"));
        let json = serde_json::to_value(&dialog).expect("serialize");
        assert_eq!(json["label"], "welcome");
        assert_eq!(json["priority"], priority::FALLBACK);
        assert!(json.get("conditions").is_none());
        assert_eq!(json["buttons"][0]["name"], "Bye");

        let restored: DialogEntry = serde_json::from_value(json).expect("deserialize");
        assert_eq!(restored, dialog);
    }
}
