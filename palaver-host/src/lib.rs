//! # Palaver Host
//!
//! A reference host for `palaver-core`: an in-memory world with players,
//! NPCs, quests and a scoreboard, wired to the engine through
//! [`WorldSession`].
//!
//! ```text
//! HostConfig ──► WorldSession ──► World (ActionEnvironment)
//!                     │
//!                     ├─► ExecutionTracker ──► WorldDatabase (optional)
//!                     └─► ActionDispatcher
//! ```

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod logging;
pub mod npc;
pub mod quests;
pub mod session;
pub mod world;

pub use config::HostConfig;
pub use npc::{Npc, NpcRegistry};
pub use quests::{Quest, QuestBook};
pub use session::{PresentedButton, PresentedDialog, WorldSession};
pub use world::{ExecutedCommand, OpenDialog, World};
