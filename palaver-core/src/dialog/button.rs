//! Dialog buttons.

use serde::{Deserialize, Serialize};

use crate::action::{ActionEntry, ActionKind, ActionSet};
use crate::condition::ConditionSet;
use crate::dialog::label::{generate_button_label, is_translation_key};
use crate::types::ButtonId;

/// How the UI treats a button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ButtonKind {
    /// Runs its actions.
    #[default]
    Default,
    /// Closes the dialog after its actions.
    Close,
    /// Runs its actions and keeps the dialog open.
    Action,
}

/// A button offered under a dialog.
///
/// The label is generated from the name until it is set explicitly; an
/// explicit label is kept across renames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredButton", into = "StoredButton")]
pub struct DialogButtonEntry {
    name: String,
    label: String,
    label_locked: bool,
    /// UI behaviour.
    pub kind: ButtonKind,
    /// Actions run on activation, in order.
    pub actions: ActionSet,
    /// Conditions under which the button is offered.
    pub conditions: ConditionSet,
}

#[derive(Clone, Serialize, Deserialize)]
struct StoredButton {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "is_default_kind")]
    kind: ButtonKind,
    #[serde(default, skip_serializing_if = "ActionSet::is_empty")]
    actions: ActionSet,
    #[serde(default, skip_serializing_if = "ConditionSet::is_empty")]
    conditions: ConditionSet,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_default_kind(kind: &ButtonKind) -> bool {
    *kind == ButtonKind::Default
}

impl From<StoredButton> for DialogButtonEntry {
    fn from(stored: StoredButton) -> Self {
        let mut button = match stored.label {
            Some(label) if !label.trim().is_empty() => Self::with_label(&stored.name, &label),
            _ => Self::new(&stored.name),
        };
        button.kind = stored.kind;
        button.actions = stored.actions;
        button.conditions = stored.conditions;
        button
    }
}

impl From<DialogButtonEntry> for StoredButton {
    fn from(button: DialogButtonEntry) -> Self {
        let label = (button.label_locked || button.label != generate_button_label(&button.name))
            .then_some(button.label);
        Self {
            name: button.name,
            label,
            kind: button.kind,
            actions: button.actions,
            conditions: button.conditions,
        }
    }
}

impl DialogButtonEntry {
    /// A button whose label follows `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: generate_button_label(name),
            label_locked: false,
            kind: ButtonKind::Default,
            actions: ActionSet::new(),
            conditions: ConditionSet::new(),
        }
    }

    /// A button with an explicit, locked label.
    #[must_use]
    pub fn with_label(name: &str, label: &str) -> Self {
        Self {
            label: label.trim().to_string(),
            label_locked: true,
            ..Self::new(name)
        }
    }

    /// A [`ButtonKind::Close`] button carrying a single close action.
    #[must_use]
    pub fn close(name: &str) -> Self {
        Self::new(name)
            .with_kind(ButtonKind::Close)
            .with_action(ActionEntry::close_dialog())
    }

    /// Builder: set the kind.
    #[must_use]
    pub fn with_kind(mut self, kind: ButtonKind) -> Self {
        self.kind = kind;
        self
    }

    /// Builder: append an action.
    #[must_use]
    pub fn with_action(mut self, action: ActionEntry) -> Self {
        self.actions.add(action);
        self
    }

    /// Builder: set the conditions.
    #[must_use]
    pub fn with_conditions(mut self, conditions: ConditionSet) -> Self {
        self.conditions = conditions;
        self
    }

    /// Id derived from the label.
    #[must_use]
    pub fn id(&self) -> ButtonId {
        ButtonId::from_label(&self.label)
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the label was set explicitly.
    #[must_use]
    pub fn is_label_locked(&self) -> bool {
        self.label_locked
    }

    /// Whether the name is a translation key rather than literal text.
    #[must_use]
    pub fn is_translation_key(&self) -> bool {
        is_translation_key(&self.name)
    }

    /// Rename; an unlocked label follows the new name, which changes the id.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        if !self.label_locked {
            self.label = generate_button_label(name);
        }
    }

    /// Set and lock the label.
    pub fn set_label(&mut self, label: &str) {
        self.label = label.trim().to_string();
        self.label_locked = true;
    }

    /// Whether activating the button closes the dialog.
    #[must_use]
    pub fn closes_dialog(&self) -> bool {
        self.kind == ButtonKind::Close || self.actions.has_kind(ActionKind::CloseDialog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_follows_name_until_locked() {
        let mut button = DialogButtonEntry::new("My Button");
        assert_eq!(button.label(), "my_button");
        button.set_name("Other");
        assert_eq!(button.label(), "other");

        button.set_label("fixed");
        button.set_name("Renamed");
        assert_eq!(button.label(), "fixed");
        assert_eq!(button.id(), ButtonId::from_label("fixed"));
    }

    #[test]
    fn generated_label_is_not_serialized() {
        let button = DialogButtonEntry::new("Yes please");
        let json = serde_json::to_value(&button).expect("serialize");
        assert_eq!(json, serde_json::json!({"name": "Yes please"}));
        let restored: DialogButtonEntry = serde_json::from_value(json).expect("deserialize");
        assert_eq!(restored.id(), button.id());
        assert!(!restored.is_label_locked());
    }

    #[test]
    fn explicit_label_survives_round_trip() {
        let button = DialogButtonEntry::with_label("Yes", "accept")
            .with_action(ActionEntry::command("say ok", 0));
        let json = serde_json::to_string(&button).expect("serialize");
        let restored: DialogButtonEntry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, button);
        assert_eq!(restored.label(), "accept");
    }

    #[test]
    fn close_button() {
        let button = DialogButtonEntry::close("Bye");
        assert!(button.closes_dialog());
        assert_eq!(button.kind, ButtonKind::Close);
        assert!(!DialogButtonEntry::new("Hi").closes_dialog());
    }

    #[test]
    fn translation_key_names() {
        assert!(DialogButtonEntry::new("gui.palaver.yes").is_translation_key());
        assert!(!DialogButtonEntry::new("Yes").is_translation_key());
    }
}
