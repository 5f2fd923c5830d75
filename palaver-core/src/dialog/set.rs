//! The dialog set owned by one NPC, and dialog resolution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::condition::ConditionEvaluator;
use crate::dialog::label::MAX_LABEL_LENGTH;
use crate::dialog::{DialogButtonEntry, DialogEntry, priority};
use crate::environment::PlayerContext;
use crate::error::{PalaverError, Result};
use crate::types::{ButtonId, DialogId, PlayerId};

/// Editor layout of a dialog set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DialogType {
    /// No dialogs.
    #[default]
    None,
    /// A single dialog.
    Basic,
    /// A question with yes/no answers (up to three dialogs).
    YesNo,
    /// Any number of dialogs edited individually.
    Standard,
    /// Authored outside the standard editors.
    Custom,
}

/// Dialogs of one NPC, indexed by label and by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredDialogSet", into = "StoredDialogSet")]
pub struct DialogSet {
    dialog_type: DialogType,
    dialogs: HashMap<DialogId, DialogEntry>,
    labels: HashMap<String, DialogId>,
}

#[derive(Clone, Serialize, Deserialize)]
struct StoredDialogSet {
    #[serde(rename = "type", default)]
    dialog_type: DialogType,
    #[serde(default)]
    dialogs: Vec<DialogEntry>,
}

impl From<StoredDialogSet> for DialogSet {
    fn from(stored: StoredDialogSet) -> Self {
        let mut set = Self::new(stored.dialog_type);
        for dialog in stored.dialogs {
            set.add_dialog(dialog);
        }
        set
    }
}

impl From<DialogSet> for StoredDialogSet {
    fn from(mut set: DialogSet) -> Self {
        set.normalize_type();
        let dialog_type = set.dialog_type;
        let mut dialogs: Vec<DialogEntry> = set
            .dialogs
            .into_values()
            .filter(|dialog| !dialog.text.trim().is_empty())
            .collect();
        dialogs.sort_by(|a, b| a.label.cmp(&b.label));
        Self { dialog_type, dialogs }
    }
}

impl DialogSet {
    /// An empty set of the given type.
    #[must_use]
    pub fn new(dialog_type: DialogType) -> Self {
        Self {
            dialog_type,
            dialogs: HashMap::new(),
            labels: HashMap::new(),
        }
    }

    /// Editor layout.
    #[must_use]
    pub fn dialog_type(&self) -> DialogType {
        self.dialog_type
    }

    /// Change the editor layout.
    pub fn set_dialog_type(&mut self, dialog_type: DialogType) {
        self.dialog_type = dialog_type;
    }

    /// Make the type consistent with the content: a basic set with several
    /// dialogs or a yes/no set with more than three becomes standard, an
    /// empty set becomes none, and anything else unknown becomes custom.
    pub fn normalize_type(&mut self) {
        let count = self.dialogs.len();
        self.dialog_type = match self.dialog_type {
            DialogType::Basic if count > 1 => DialogType::Standard,
            DialogType::YesNo if count > 3 => DialogType::Standard,
            _ if count == 0 => DialogType::None,
            t @ (DialogType::Basic | DialogType::YesNo | DialogType::Standard) => t,
            _ => DialogType::Custom,
        };
    }

    /// Add a dialog, refusing entries without a usable label or text.
    ///
    /// # Errors
    /// Returns [`PalaverError::InvalidDialog`] describing the refusal.
    pub fn try_add_dialog(&mut self, dialog: DialogEntry) -> Result<()> {
        let label = dialog.label.trim();
        let reason = if label.is_empty() {
            Some("label is empty")
        } else if label.chars().count() > MAX_LABEL_LENGTH {
            Some("label is longer than 32 characters")
        } else if dialog.text.trim().is_empty() {
            Some("text is empty")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(PalaverError::InvalidDialog {
                label: dialog.label,
                reason: reason.to_string(),
            });
        }

        let id = dialog.id();
        if let Some(existing) = self.dialogs.get(&id) {
            if *existing != dialog {
                warn!(dialog = %dialog.label, "Duplicate dialog id, overwriting existing dialog");
            }
        }
        self.labels.insert(dialog.label.clone(), id);
        self.dialogs.insert(id, dialog);
        Ok(())
    }

    /// Add a dialog; refusals are logged and reported as `false`.
    pub fn add_dialog(&mut self, dialog: DialogEntry) -> bool {
        match self.try_add_dialog(dialog) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Refusing dialog");
                false
            }
        }
    }

    /// Replace the dialog with `id` by `dialog`.
    pub fn set_dialog(&mut self, id: DialogId, dialog: DialogEntry) -> bool {
        self.remove_dialog(id);
        self.add_dialog(dialog)
    }

    /// Remove the dialog with `id`.
    pub fn remove_dialog(&mut self, id: DialogId) -> bool {
        match self.dialogs.remove(&id) {
            Some(dialog) => {
                self.labels.remove(&dialog.label);
                true
            }
            None => false,
        }
    }

    /// The dialog labelled `label`.
    #[must_use]
    pub fn dialog_by_label(&self, label: &str) -> Option<&DialogEntry> {
        self.labels.get(label).and_then(|id| self.dialogs.get(id))
    }

    /// The dialog with `id`.
    #[must_use]
    pub fn dialog_by_id(&self, id: DialogId) -> Option<&DialogEntry> {
        self.dialogs.get(&id)
    }

    /// Id of the dialog labelled `label`.
    #[must_use]
    pub fn dialog_id(&self, label: &str) -> Option<DialogId> {
        self.labels.get(label).copied()
    }

    /// Whether the set holds any dialog.
    #[must_use]
    pub fn has_dialogs(&self) -> bool {
        !self.dialogs.is_empty()
    }

    /// Whether a dialog is labelled `label`.
    #[must_use]
    pub fn has_dialog_label(&self, label: &str) -> bool {
        self.labels.contains_key(label)
    }

    /// Whether a dialog has `id`.
    #[must_use]
    pub fn has_dialog_id(&self, id: DialogId) -> bool {
        self.dialogs.contains_key(&id)
    }

    /// Whether dialog `dialog` has button `button`.
    #[must_use]
    pub fn has_dialog_button(&self, dialog: DialogId, button: ButtonId) -> bool {
        self.dialog_button(dialog, button).is_some()
    }

    /// Button `button` of dialog `dialog`.
    #[must_use]
    pub fn dialog_button(&self, dialog: DialogId, button: ButtonId) -> Option<&DialogButtonEntry> {
        self.dialogs.get(&dialog).and_then(|d| d.button(button))
    }

    /// Remove button `button` from dialog `dialog`.
    pub fn remove_dialog_button(&mut self, dialog: DialogId, button: ButtonId) -> bool {
        self.dialogs
            .get_mut(&dialog)
            .is_some_and(|d| d.remove_button(button))
    }

    /// All dialogs sorted by label.
    #[must_use]
    pub fn dialogs_by_label(&self) -> Vec<&DialogEntry> {
        let mut dialogs: Vec<&DialogEntry> = self.dialogs.values().collect();
        dialogs.sort_by(|a, b| a.label.cmp(&b.label));
        dialogs
    }

    /// Number of dialogs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }

    /// Pick the dialog to show `player`.
    ///
    /// Among dialogs with a non-negative priority whose valid conditions all
    /// pass, the highest priority wins and ties go to the smallest label.
    /// Resolution has no side effects; see [`Self::record_dialog_execution`].
    #[must_use]
    pub fn next_available_dialog(
        &self,
        player: Option<&dyn PlayerContext>,
        evaluator: &ConditionEvaluator<'_>,
    ) -> Option<&DialogEntry> {
        let chosen = self
            .dialogs
            .values()
            .filter(|dialog| priority::is_auto_selectable(dialog.priority))
            .filter(|dialog| {
                dialog.conditions.is_empty()
                    || evaluator.evaluate_all(
                        &dialog.conditions.valid(),
                        player,
                        Some(dialog.id().into()),
                    )
            })
            .min_by(|a, b| {
                b.priority
                    .cmp(&a.priority)
                    .then_with(|| a.label.cmp(&b.label))
            });
        match chosen {
            Some(dialog) => {
                debug!(dialog = %dialog.label, priority = dialog.priority, "Resolved dialog");
            }
            None => debug!(dialogs = self.dialogs.len(), "No dialog available"),
        }
        chosen
    }

    /// Record that `dialog` was shown to `player`, feeding its execution
    /// limits. Returns whether anything was recorded.
    ///
    /// # Errors
    /// Returns an error if the tracker cannot persist the record.
    pub fn record_dialog_execution(
        &self,
        dialog: &DialogEntry,
        player: PlayerId,
        evaluator: &ConditionEvaluator<'_>,
    ) -> Result<bool> {
        evaluator.record_executions(&dialog.conditions.valid(), player, dialog.id().into())
    }
}
