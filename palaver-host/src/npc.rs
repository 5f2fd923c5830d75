//! NPCs living in a world and the registry that owns them.

use std::collections::HashMap;

use palaver_core::config::DialogConfig;
use palaver_core::dialog::DialogSet;
use palaver_core::error::Result;
use palaver_core::{NpcId, PalaverError};
use tracing::{debug, info};

/// One NPC.
#[derive(Debug, Clone)]
pub struct Npc {
    /// Stable id.
    pub id: NpcId,
    /// Display name, substituted for `@npc`.
    pub name: String,
    /// Dialogs offered on interaction.
    pub dialogs: DialogSet,
    /// Highest permission level its commands may use.
    pub permission_cap: u8,
}

/// Every NPC of a world, keyed by id.
#[derive(Debug, Clone)]
pub struct NpcRegistry {
    npcs: HashMap<NpcId, Npc>,
    max_label_length: usize,
    default_permission_cap: u8,
}

impl NpcRegistry {
    /// An empty registry enforcing `dialog` limits on assigned dialog sets.
    #[must_use]
    pub fn new(dialog: &DialogConfig, default_permission_cap: u8) -> Self {
        Self {
            npcs: HashMap::new(),
            max_label_length: dialog.max_label_length,
            default_permission_cap,
        }
    }

    /// Create an NPC with no dialogs.
    pub fn spawn(&mut self, name: &str) -> NpcId {
        let id = NpcId::new();
        self.insert(id, name);
        id
    }

    /// Create an NPC with a known id, e.g. when restoring a world. An
    /// existing NPC with that id is replaced.
    pub fn insert(&mut self, id: NpcId, name: &str) {
        self.npcs.insert(
            id,
            Npc {
                id,
                name: name.to_string(),
                dialogs: DialogSet::default(),
                permission_cap: self.default_permission_cap,
            },
        );
        debug!(npc = %id, name, "NPC spawned");
    }

    /// Give `npc` a new dialog set.
    ///
    /// # Errors
    /// Returns [`PalaverError::InvalidDialog`] if a label exceeds the
    /// configured maximum length. Nothing is changed in that case.
    pub fn assign_dialogs(&mut self, npc: NpcId, dialogs: DialogSet) -> Result<bool> {
        if let Some(long) = dialogs
            .dialogs_by_label()
            .into_iter()
            .find(|d| d.label.chars().count() > self.max_label_length)
        {
            return Err(PalaverError::InvalidDialog {
                label: long.label.clone(),
                reason: format!("label is longer than {} characters", self.max_label_length),
            });
        }
        let Some(entry) = self.npcs.get_mut(&npc) else {
            return Ok(false);
        };
        info!(npc = %npc, dialogs = dialogs.len(), "Dialogs assigned");
        entry.dialogs = dialogs;
        Ok(true)
    }

    /// NPC with `id`.
    #[must_use]
    pub fn get(&self, id: NpcId) -> Option<&Npc> {
        self.npcs.get(&id)
    }

    /// Mutable NPC with `id`.
    pub fn get_mut(&mut self, id: NpcId) -> Option<&mut Npc> {
        self.npcs.get_mut(&id)
    }

    /// Despawn an NPC.
    pub fn remove(&mut self, id: NpcId) -> Option<Npc> {
        self.npcs.remove(&id)
    }

    /// All NPCs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Npc> {
        self.npcs.values()
    }

    /// Number of NPCs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.npcs.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty()
    }
}
