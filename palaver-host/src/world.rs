//! In-memory game world implementing every interface the engine consumes.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use palaver_core::dialog::DialogSet;
use palaver_core::environment::{
    ActionEnvironment, CommandSink, CommandSource, DialogHost, PlayerContext, Scoreboard,
};
use palaver_core::safety::effective_verb;
use palaver_core::{DialogId, NpcId, PlayerId, QuestId};
use tracing::{debug, info, warn};

use crate::config::HostConfig;
use crate::npc::NpcRegistry;
use crate::quests::QuestBook;

/// A dialog currently shown to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenDialog {
    /// NPC showing it.
    pub npc: NpcId,
    /// Which dialog.
    pub dialog: DialogId,
}

/// A command the world accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedCommand {
    /// Command text after macro expansion.
    pub command: String,
    /// Who ran it.
    pub source: CommandSource,
    /// Effective permission level.
    pub permission_level: u8,
}

/// Players, NPCs, quests, scores and the dialogs on screen.
#[derive(Debug, Clone)]
pub struct World {
    npcs: NpcRegistry,
    quests: QuestBook,
    players: HashMap<PlayerId, String>,
    objectives: BTreeMap<String, HashMap<PlayerId, i32>>,
    open_dialogs: HashMap<PlayerId, OpenDialog>,
    command_log: Vec<ExecutedCommand>,
    rejected_verbs: BTreeSet<String>,
}

impl World {
    /// An empty world.
    #[must_use]
    pub fn new(config: &HostConfig) -> Self {
        Self {
            npcs: NpcRegistry::new(&config.core.dialog, config.host.npc_permission_cap),
            quests: QuestBook::new(),
            players: HashMap::new(),
            objectives: BTreeMap::new(),
            open_dialogs: HashMap::new(),
            command_log: Vec::new(),
            rejected_verbs: BTreeSet::new(),
        }
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// A new player joins.
    pub fn join(&mut self, name: &str) -> PlayerId {
        let id = PlayerId::new();
        self.add_player(id, name);
        id
    }

    /// A known player joins.
    pub fn add_player(&mut self, id: PlayerId, name: &str) {
        self.players.insert(id, name.to_string());
        info!(player = %id, name, "Player joined");
    }

    /// A player leaves; any open dialog is closed.
    pub fn leave(&mut self, player: PlayerId) -> bool {
        self.open_dialogs.remove(&player);
        self.players.remove(&player).is_some()
    }

    /// Display name of `player`.
    #[must_use]
    pub fn player_name(&self, player: PlayerId) -> Option<&str> {
        self.players.get(&player).map(String::as_str)
    }

    /// Whether `player` is online.
    #[must_use]
    pub fn is_online(&self, player: PlayerId) -> bool {
        self.players.contains_key(&player)
    }

    // ------------------------------------------------------------------
    // Registries
    // ------------------------------------------------------------------

    /// NPCs of this world.
    #[must_use]
    pub fn npcs(&self) -> &NpcRegistry {
        &self.npcs
    }

    /// Mutable NPCs of this world.
    pub fn npcs_mut(&mut self) -> &mut NpcRegistry {
        &mut self.npcs
    }

    /// Quests of this world.
    #[must_use]
    pub fn quests(&self) -> &QuestBook {
        &self.quests
    }

    /// Mutable quests of this world.
    pub fn quests_mut(&mut self) -> &mut QuestBook {
        &mut self.quests
    }

    // ------------------------------------------------------------------
    // Screens and commands
    // ------------------------------------------------------------------

    /// The dialog `player` is looking at.
    #[must_use]
    pub fn open_dialog_of(&self, player: PlayerId) -> Option<OpenDialog> {
        self.open_dialogs.get(&player).copied()
    }

    /// Every command accepted so far, oldest first.
    #[must_use]
    pub fn commands(&self) -> &[ExecutedCommand] {
        &self.command_log
    }

    /// Drain the command log.
    pub fn take_commands(&mut self) -> Vec<ExecutedCommand> {
        std::mem::take(&mut self.command_log)
    }

    /// Make the world fail commands whose verb is `verb`, as a server
    /// without that command would.
    pub fn reject_verb(&mut self, verb: &str) {
        self.rejected_verbs.insert(verb.to_ascii_lowercase());
    }
}

/// [`PlayerContext`] view of one online player.
#[derive(Debug, Clone, Copy)]
pub struct PlayerView<'w> {
    world: &'w World,
    id: PlayerId,
}

impl PlayerContext for PlayerView<'_> {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> String {
        self.world.player_name(self.id).unwrap_or_default().to_string()
    }

    fn score(&self, objective: &str) -> Option<i32> {
        Scoreboard::score(self.world, self.id, objective)
    }

    fn tracked_quest_ids(&self) -> Vec<QuestId> {
        self.world.quests.tracked_by(self.id)
    }
}

impl CommandSink for World {
    fn execute(
        &mut self,
        command: &str,
        source: CommandSource,
        permission_level: u8,
        debug: bool,
    ) -> bool {
        if let Some(verb) = effective_verb(command) {
            if self.rejected_verbs.contains(&verb) {
                warn!(command, verb = %verb, "Unknown command");
                return false;
            }
        }
        if debug {
            debug!(command, ?source, permission_level, "Command accepted");
        }
        self.command_log.push(ExecutedCommand {
            command: command.to_string(),
            source,
            permission_level,
        });
        true
    }
}

impl Scoreboard for World {
    fn has_objective(&self, objective: &str) -> bool {
        self.objectives.contains_key(objective)
    }

    fn add_objective(&mut self, objective: &str) {
        self.objectives.entry(objective.to_string()).or_default();
    }

    fn add_score(&mut self, player: PlayerId, objective: &str, delta: i32) -> i32 {
        let score = self
            .objectives
            .entry(objective.to_string())
            .or_default()
            .entry(player)
            .or_insert(0);
        *score = score.saturating_add(delta);
        *score
    }

    fn set_score(&mut self, player: PlayerId, objective: &str, value: i32) {
        self.objectives
            .entry(objective.to_string())
            .or_default()
            .insert(player, value);
    }

    fn score(&self, player: PlayerId, objective: &str) -> Option<i32> {
        self.objectives.get(objective)?.get(&player).copied()
    }
}

impl DialogHost for World {
    fn dialogs_of(&self, npc: NpcId) -> Option<&DialogSet> {
        self.npcs.get(npc).map(|n| &n.dialogs)
    }

    fn npc_name(&self, npc: NpcId) -> Option<String> {
        self.npcs.get(npc).map(|n| n.name.clone())
    }

    fn open_dialog(&mut self, player: PlayerId, npc: NpcId, dialog: DialogId) {
        self.open_dialogs.insert(player, OpenDialog { npc, dialog });
    }

    fn close_dialog(&mut self, player: PlayerId) {
        if self.open_dialogs.remove(&player).is_some() {
            debug!(player = %player, "Dialog closed");
        }
    }

    fn permission_cap(&self, npc: NpcId) -> u8 {
        self.npcs.get(npc).map_or(0, |n| n.permission_cap)
    }
}

impl ActionEnvironment for World {
    fn player(&self, player: PlayerId) -> Option<Box<dyn PlayerContext + '_>> {
        if !self.is_online(player) {
            return None;
        }
        Some(Box::new(PlayerView { world: self, id: player }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_start_missing_then_accumulate() {
        let mut world = World::new(&HostConfig::default());
        let alex = world.join("Alex");
        assert_eq!(Scoreboard::score(&world, alex, "kills"), None);
        assert_eq!(world.add_score(alex, "kills", 2), 2);
        assert_eq!(world.add_score(alex, "kills", -5), -3);
        assert!(world.has_objective("kills"));
    }

    #[test]
    fn player_view_reads_world() {
        let mut world = World::new(&HostConfig::default());
        let alex = world.join("Alex");
        world.set_score(alex, "coins", 12);
        let quest = world.quests_mut().register("Find the cat", None);
        world.quests_mut().accept(alex, quest);

        let view = world.player(alex).expect("online");
        assert_eq!(view.name(), "Alex");
        assert_eq!(view.score("coins"), Some(12));
        assert!(view.tracks_quest(quest));
        assert!(world.player(PlayerId::new()).is_none());
    }

    #[test]
    fn rejected_verbs_fail() {
        let mut world = World::new(&HostConfig::default());
        let npc = world.npcs_mut().spawn("Bob");
        world.reject_verb("fly");

        assert!(!world.execute("/fly @p", CommandSource::Npc(npc), 2, false));
        assert!(world.execute("say hi", CommandSource::Npc(npc), 2, false));
        assert_eq!(world.take_commands().len(), 1);
        assert!(world.commands().is_empty());
    }

    #[test]
    fn leaving_closes_dialog() {
        let mut world = World::new(&HostConfig::default());
        let alex = world.join("Alex");
        let npc = world.npcs_mut().spawn("Bob");
        world.open_dialog(alex, npc, DialogId::from_label("welcome"));
        assert!(world.open_dialog_of(alex).is_some());
        assert!(world.leave(alex));
        assert!(world.open_dialog_of(alex).is_none());
    }
}
