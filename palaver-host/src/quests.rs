//! Quest repository owned by a world.
//!
//! The engine only ever asks which quests a player tracks; this book is the
//! host-side source of that answer.

use std::collections::{BTreeMap, HashMap};

use palaver_core::{PlayerId, QuestId};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// A quest definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    /// Stable id.
    pub id: QuestId,
    /// Display name.
    pub name: String,
    /// Scoreboard objective tracking the player's progress, if any.
    pub objective: Option<String>,
}

/// Quest definitions plus which player tracks which quest.
#[derive(Debug, Clone, Default)]
pub struct QuestBook {
    quests: BTreeMap<QuestId, Quest>,
    tracked: HashMap<PlayerId, Vec<QuestId>>,
}

impl QuestBook {
    /// An empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new quest and return its id.
    pub fn register(&mut self, name: &str, objective: Option<&str>) -> QuestId {
        let id = QuestId(Uuid::new_v4());
        self.quests.insert(
            id,
            Quest {
                id,
                name: name.to_string(),
                objective: objective.map(str::to_string),
            },
        );
        id
    }

    /// Quest with `id`.
    #[must_use]
    pub fn get(&self, id: QuestId) -> Option<&Quest> {
        self.quests.get(&id)
    }

    /// First quest named `name`, ignoring case.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Quest> {
        self.quests.values().find(|q| q.name.eq_ignore_ascii_case(name))
    }

    /// Start tracking `quest` for `player`. Returns `false` if the quest is
    /// unknown or already tracked.
    pub fn accept(&mut self, player: PlayerId, quest: QuestId) -> bool {
        if !self.quests.contains_key(&quest) {
            return false;
        }
        let tracked = self.tracked.entry(player).or_default();
        if tracked.contains(&quest) {
            return false;
        }
        tracked.push(quest);
        debug!(player = %player, quest = %quest, "Quest accepted");
        true
    }

    /// Stop tracking `quest` for `player`.
    pub fn abandon(&mut self, player: PlayerId, quest: QuestId) -> bool {
        let Some(tracked) = self.tracked.get_mut(&player) else {
            return false;
        };
        let before = tracked.len();
        tracked.retain(|q| *q != quest);
        tracked.len() != before
    }

    /// Quests `player` tracks, in acceptance order.
    #[must_use]
    pub fn tracked_by(&self, player: PlayerId) -> Vec<QuestId> {
        self.tracked.get(&player).cloned().unwrap_or_default()
    }

    /// Remove a quest definition and every player's tracking of it.
    pub fn remove(&mut self, quest: QuestId) -> Option<Quest> {
        for tracked in self.tracked.values_mut() {
            tracked.retain(|q| *q != quest);
        }
        self.quests.remove(&quest)
    }

    /// Number of registered quests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quests.len()
    }

    /// Whether no quest is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }
}
