//! Interfaces the engine consumes from its host.
//!
//! The core never touches a game world directly. Everything it reads or
//! mutates goes through these traits, implemented by the host integration.

use crate::dialog::DialogSet;
use crate::types::{DialogId, NpcId, PlayerId, QuestId};

/// Read-only view of one player.
pub trait PlayerContext {
    /// Stable player id.
    fn id(&self) -> PlayerId;

    /// Display name, used by the `@initiator` macro.
    fn name(&self) -> String;

    /// Score on `objective`, or `None` if the objective or the score is
    /// missing.
    fn score(&self, objective: &str) -> Option<i32>;

    /// Quests the player currently tracks.
    fn tracked_quest_ids(&self) -> Vec<QuestId>;

    /// Whether the player tracks `quest`.
    fn tracks_quest(&self, quest: QuestId) -> bool {
        self.tracked_quest_ids().contains(&quest)
    }
}

/// On whose behalf a command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    /// The initiating player.
    Player(PlayerId),
    /// The NPC owning the dialog.
    Npc(NpcId),
}

/// Executes textual commands.
pub trait CommandSink {
    /// Run `command` as `source` with at most `permission_level`.
    ///
    /// Returns `false` if the host rejected or failed the command.
    fn execute(
        &mut self,
        command: &str,
        source: CommandSource,
        permission_level: u8,
        debug: bool,
    ) -> bool;
}

/// Named integer objectives per player.
pub trait Scoreboard {
    /// Whether `objective` exists.
    fn has_objective(&self, objective: &str) -> bool;

    /// Create `objective`. Creating an existing objective is a no-op.
    fn add_objective(&mut self, objective: &str);

    /// Add `delta` to the player's score and return the new value.
    fn add_score(&mut self, player: PlayerId, objective: &str, delta: i32) -> i32;

    /// Overwrite the player's score.
    fn set_score(&mut self, player: PlayerId, objective: &str, value: i32);

    /// Current score, `None` if unset.
    fn score(&self, player: PlayerId, objective: &str) -> Option<i32>;
}

/// NPC lookup and dialog presentation.
pub trait DialogHost {
    /// The dialog set owned by `npc`, if the NPC exists.
    fn dialogs_of(&self, npc: NpcId) -> Option<&DialogSet>;

    /// Display name of `npc`.
    fn npc_name(&self, npc: NpcId) -> Option<String>;

    /// Show `dialog` of `npc` to `player`.
    fn open_dialog(&mut self, player: PlayerId, npc: NpcId, dialog: DialogId);

    /// Close whatever dialog `player` has open.
    fn close_dialog(&mut self, player: PlayerId);

    /// Highest permission level commands of `npc` may use.
    fn permission_cap(&self, npc: NpcId) -> u8;
}

/// Everything an action can touch.
pub trait ActionEnvironment: CommandSink + Scoreboard + DialogHost {
    /// Context for `player`, if the player is present.
    fn player(&self, player: PlayerId) -> Option<Box<dyn PlayerContext + '_>>;
}
