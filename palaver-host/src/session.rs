//! A running world: the in-memory [`World`] wired to the engine.
//!
//! ```text
//! interact(player, npc)
//!   └─ resolve best dialog ─ record its limits ─ open it ─ offer buttons
//! press_button(player, button)
//!   └─ look up the open dialog ─ ActionDispatcher::activate
//! save()
//!   └─ dialog sets → WorldDatabase (execution records are written through)
//! ```

use std::sync::Arc;

use palaver_core::clock::{Clock, SystemClock};
use palaver_core::dialog::DialogEntry;
use palaver_core::dispatch::{ActionContext, ActionDispatcher, ActivationReport};
use palaver_core::environment::{ActionEnvironment, DialogHost};
use palaver_core::error::Result;
use palaver_core::execution::ExecutionTracker;
use palaver_core::metrics::DispatchCounters;
use palaver_core::persistence::WorldDatabase;
use palaver_core::{ButtonId, DialogId, NpcId, PlayerId, WorldId};
use tracing::{debug, info, warn};

use crate::config::HostConfig;
use crate::world::World;

/// A button as offered to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedButton {
    /// Id to pass back to [`WorldSession::press_button`].
    pub id: ButtonId,
    /// Button label.
    pub label: String,
    /// Display name or translation key.
    pub name: String,
}

/// What a player sees after talking to an NPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedDialog {
    /// NPC showing the dialog.
    pub npc: NpcId,
    /// Dialog id.
    pub dialog: DialogId,
    /// Dialog label.
    pub label: String,
    /// Dialog text.
    pub text: String,
    /// Buttons whose conditions pass, capped at the configured maximum.
    pub buttons: Vec<PresentedButton>,
}

/// One world with its execution history and dispatcher.
#[derive(Debug)]
pub struct WorldSession {
    world_id: WorldId,
    name: String,
    config: HostConfig,
    world: World,
    tracker: ExecutionTracker,
    dispatcher: ActionDispatcher,
    database: Option<Arc<WorldDatabase>>,
}

impl WorldSession {
    /// A throwaway world kept entirely in memory.
    #[must_use]
    pub fn in_memory(config: HostConfig) -> Self {
        Self::in_memory_with_clock(config, Arc::new(SystemClock))
    }

    /// A throwaway world driven by `clock`.
    #[must_use]
    pub fn in_memory_with_clock(config: HostConfig, clock: Arc<dyn Clock>) -> Self {
        let world_id = WorldId::new();
        Self {
            world_id,
            name: config.host.world_name.clone(),
            world: World::new(&config),
            tracker: ExecutionTracker::with_clock(world_id, clock),
            dispatcher: ActionDispatcher::new(&config.core),
            config,
            database: None,
        }
    }

    /// Register a new world in `database` and open it.
    ///
    /// # Errors
    /// Returns an error if the world cannot be registered or its history
    /// cannot be loaded.
    pub fn create(
        config: HostConfig,
        database: Arc<WorldDatabase>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let world_id = WorldId::new();
        database.register_world(world_id, &config.host.world_name)?;
        let name = config.host.world_name.clone();
        Self::open(config, database, world_id, name, clock)
    }

    /// Reopen a world previously created in `database`.
    ///
    /// # Errors
    /// Returns [`palaver_core::PalaverError::WorldNotFound`] if the world was
    /// never registered, or a database error.
    pub fn resume(
        config: HostConfig,
        database: Arc<WorldDatabase>,
        world_id: WorldId,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let name = database.world_name(world_id)?;
        Self::open(config, database, world_id, name, clock)
    }

    /// Open the world `config` describes: backed by `host.database_path`
    /// when set, in memory otherwise. With a database, `world` resumes an
    /// existing world and `None` creates a new one.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or `world` is not
    /// registered in it.
    pub fn from_config(config: HostConfig, world: Option<WorldId>) -> Result<Self> {
        let Some(path) = config.host.database_path.clone() else {
            return Ok(Self::in_memory(config));
        };
        let database = Arc::new(WorldDatabase::open(&path, &config.core.persistence)?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        match world {
            Some(world_id) => Self::resume(config, database, world_id, clock),
            None => Self::create(config, database, clock),
        }
    }

    fn open(
        config: HostConfig,
        database: Arc<WorldDatabase>,
        world_id: WorldId,
        name: String,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let tracker = ExecutionTracker::open(world_id, Box::new(Arc::clone(&database)), clock)?;
        info!(world = %world_id, name = %name, "World session opened");
        Ok(Self {
            world_id,
            name,
            world: World::new(&config),
            tracker,
            dispatcher: ActionDispatcher::new(&config.core),
            config,
            database: Some(database),
        })
    }

    /// World id.
    #[must_use]
    pub fn world_id(&self) -> WorldId {
        self.world_id
    }

    /// World name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// The world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The world, for setup and admin changes.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Execution history of this world.
    #[must_use]
    pub fn tracker(&self) -> &ExecutionTracker {
        &self.tracker
    }

    /// The dispatcher, for its counters.
    #[must_use]
    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    // ------------------------------------------------------------------
    // Gameplay
    // ------------------------------------------------------------------

    /// `player` talks to `npc`: resolve the dialog to show, feed its
    /// execution limits and open it.
    ///
    /// Returns `None` when dialogs are disabled, the player is offline, the
    /// NPC is unknown, or no dialog is eligible. In the last case any dialog
    /// the player had open is closed.
    ///
    /// # Errors
    /// Returns an error if the dialog's execution record cannot be persisted.
    pub fn interact(&mut self, player: PlayerId, npc: NpcId) -> Result<Option<PresentedDialog>> {
        if !self.config.core.general.enabled {
            return Ok(None);
        }
        let evaluator = self.dispatcher.evaluator(&self.tracker);
        let counters = self.dispatcher.counters();
        let max_buttons = self.config.core.dialog.max_buttons;

        let presented = {
            let Some(context) = self.world.player(player) else {
                debug!(player = %player, "Interaction from offline player ignored");
                return Ok(None);
            };
            let Some(set) = self.world.dialogs_of(npc) else {
                warn!(npc = %npc, "Interaction with unknown NPC");
                return Ok(None);
            };
            match set.next_available_dialog(Some(context.as_ref()), &evaluator) {
                Some(dialog) => {
                    set.record_dialog_execution(dialog, player, &evaluator)?;
                    let buttons = dialog
                        .available_buttons(&evaluator, Some(context.as_ref()), max_buttons)
                        .into_iter()
                        .map(|b| PresentedButton {
                            id: b.id(),
                            label: b.label().to_string(),
                            name: b.name().to_string(),
                        })
                        .collect();
                    Some(present(npc, dialog, buttons))
                }
                None => None,
            }
        };

        match presented {
            Some(dialog) => {
                DispatchCounters::bump(&counters.dialogs_resolved);
                self.world.open_dialog(player, npc, dialog.dialog);
                info!(player = %player, npc = %npc, dialog = %dialog.label, "Dialog opened");
                Ok(Some(dialog))
            }
            None => {
                DispatchCounters::bump(&counters.dialogs_unavailable);
                self.world.close_dialog(player);
                Ok(None)
            }
        }
    }

    /// `player` presses `button` on the dialog they have open.
    ///
    /// Returns `None` if no dialog is open or it has no such button.
    ///
    /// # Errors
    /// Returns an error if an execution record cannot be persisted.
    pub fn press_button(
        &mut self,
        player: PlayerId,
        button: ButtonId,
    ) -> Result<Option<ActivationReport>> {
        let Some(open) = self.world.open_dialog_of(player) else {
            debug!(player = %player, "Button pressed without an open dialog");
            return Ok(None);
        };
        let Some(entry) = self
            .world
            .dialogs_of(open.npc)
            .and_then(|set| set.dialog_button(open.dialog, button))
            .cloned()
        else {
            warn!(player = %player, npc = %open.npc, button = %button, "Unknown button");
            return Ok(None);
        };

        let ctx = ActionContext {
            npc: open.npc,
            player: Some(player),
        };
        let report = self.dispatcher.activate(&entry, ctx, &self.tracker, &mut self.world)?;
        Ok(Some(report))
    }

    /// [`Self::press_button`] by button label.
    ///
    /// # Errors
    /// Returns an error if an execution record cannot be persisted.
    pub fn press_button_labelled(
        &mut self,
        player: PlayerId,
        label: &str,
    ) -> Result<Option<ActivationReport>> {
        self.press_button(player, ButtonId::from_label(label))
    }

    // ------------------------------------------------------------------
    // Persistence and maintenance
    // ------------------------------------------------------------------

    /// Save every NPC's dialog set. Returns how many were written; an
    /// in-memory session writes nothing.
    ///
    /// # Errors
    /// Returns an error if the database rejects a write or the backup fails.
    pub fn save(&self) -> Result<usize> {
        let Some(database) = &self.database else {
            return Ok(0);
        };
        let mut saved = 0;
        for npc in self.world.npcs().iter() {
            database.save_dialog_set(npc.id, &npc.dialogs)?;
            saved += 1;
        }
        if self.config.host.backup_on_save {
            database.create_rotating_backup()?;
        }
        info!(world = %self.world_id, dialog_sets = saved, "World saved");
        Ok(saved)
    }

    /// Restore the saved dialog set of a spawned NPC. Returns `false` if
    /// nothing was saved for it or the NPC is not spawned.
    ///
    /// # Errors
    /// Returns an error if the stored set cannot be read or violates the
    /// configured label limit.
    pub fn load_dialogs(&mut self, npc: NpcId) -> Result<bool> {
        let Some(database) = &self.database else {
            return Ok(false);
        };
        match database.load_dialog_set(npc)? {
            Some(set) => self.world.npcs_mut().assign_dialogs(npc, set),
            None => Ok(false),
        }
    }

    /// Drop execution records idle longer than the configured retention.
    ///
    /// # Errors
    /// Returns an error if the store rejects a delete.
    pub fn prune(&self) -> Result<usize> {
        self.tracker.prune_expired(self.config.core.execution.prune_after_days)
    }

    /// Dispatch counters as Prometheus text.
    #[must_use]
    pub fn metrics(&self) -> String {
        self.dispatcher.counters().snapshot().to_prometheus()
    }
}

fn present(npc: NpcId, dialog: &DialogEntry, buttons: Vec<PresentedButton>) -> PresentedDialog {
    PresentedDialog {
        npc,
        dialog: dialog.id(),
        label: dialog.label.clone(),
        text: dialog.text.clone(),
        buttons,
    }
}
