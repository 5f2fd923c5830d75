//! Host configuration: the core settings plus where and how a server keeps
//! its worlds.
//!
//! ```toml
//! [general]
//! log_level = "debug"
//!
//! [host]
//! world_name = "survival"
//! database_path = "saves/palaver.db"
//! npc_permission_cap = 2
//! ```

use std::path::{Path, PathBuf};

use palaver_core::config::PalaverConfig;
use palaver_core::error::Result;
use palaver_core::PalaverError;
use serde::{Deserialize, Serialize};

/// Full host configuration, loadable from one TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    /// Engine settings, at the top level of the file.
    #[serde(flatten)]
    pub core: PalaverConfig,
    /// Host settings, under `[host]`.
    #[serde(default)]
    pub host: HostSection,
}

/// The `[host]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSection {
    /// Display name of the world opened by default.
    #[serde(default = "default_world_name")]
    pub world_name: String,
    /// SQLite file for worlds and dialogs; `None` keeps everything in memory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Permission cap of newly spawned NPCs.
    #[serde(default = "default_npc_cap")]
    pub npc_permission_cap: u8,
    /// Write a rotating backup every time the session saves.
    #[serde(default)]
    pub backup_on_save: bool,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            world_name: default_world_name(),
            database_path: None,
            npc_permission_cap: default_npc_cap(),
            backup_on_save: false,
        }
    }
}

fn default_world_name() -> String {
    "world".to_string()
}

fn default_npc_cap() -> u8 {
    2
}

impl HostConfig {
    /// Parse from TOML.
    ///
    /// # Errors
    /// Returns [`PalaverError::Config`] if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| PalaverError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_core::ExecutionInterval;

    #[test]
    fn defaults() {
        let config = HostConfig::from_toml("").expect("parse");
        assert_eq!(config.host.world_name, "world");
        assert_eq!(config.host.npc_permission_cap, 2);
        assert!(config.host.database_path.is_none());
        assert_eq!(config.core.dialog.max_buttons, 6);
    }

    #[test]
    fn core_and_host_sections_share_one_file() {
        let config = HostConfig::from_toml(
            r#"
            [execution]
            default_interval = "PER_WEEK"

            [host]
            world_name = "survival"
            database_path = "saves/palaver.db"
            "#,
        )
        .expect("parse");
        assert_eq!(config.core.execution.default_interval, ExecutionInterval::PerWeek);
        assert_eq!(config.host.world_name, "survival");
        assert_eq!(config.host.database_path, Some(PathBuf::from("saves/palaver.db")));
    }

    #[test]
    fn bad_toml_is_config_error() {
        assert!(matches!(HostConfig::from_toml("[host"), Err(PalaverError::Config(_))));
    }
}
