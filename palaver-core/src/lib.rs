//! # Palaver Core Library
//!
//! Game-agnostic dialog resolution and action execution for NPCs.
//!
//! An NPC owns a [`DialogSet`]. When a player interacts with it, the set picks
//! the highest-priority dialog whose conditions pass for that player. Each
//! dialog carries buttons, each button carries an [`ActionSet`], and the
//! [`ActionDispatcher`] turns an activated button into effects on the host:
//!
//! - **Commands**, clamped to a permission ceiling and screened against a
//!   blocklist of administrative verbs
//! - **Scoreboard mutations** (`INCREASE:kills:1`)
//! - **Dialog transitions** to another dialog of the same or a different NPC
//!
//! Conditions gate both dialogs and individual actions. The execution-limit
//! condition is backed by the [`ExecutionTracker`], a per-world rate limiter
//! that survives restarts.
//!
//! ## Threading
//!
//! Every operation is synchronous and meant to run on the simulation thread.
//! The tracker is the only shared-state component and serialises writers
//! behind a single lock.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod clock;
pub mod condition;
pub mod config;
pub mod dialog;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod execution;
pub mod metrics;
pub mod persistence;
pub mod safety;
pub mod types;

pub use action::{ActionEntry, ActionKind, ActionSet};
pub use condition::{
    ConditionEntry, ConditionEvaluator, ConditionKind, ConditionOperation, ConditionSet,
};
pub use config::PalaverConfig;
pub use dialog::{DialogButtonEntry, DialogEntry, DialogSet, DialogType};
pub use dispatch::{ActionContext, ActionDispatcher, ActivationReport, DispatchOutcome};
pub use error::PalaverError;
pub use execution::{ExecutionInterval, ExecutionTracker};
pub use persistence::WorldDatabase;
pub use types::*;
