//! Configuration for the Palaver dialog engine.
//!
//! Maps directly to `palaver.toml`. Every section and field is optional; a
//! missing value falls back to the default documented on the field.

use serde::{Deserialize, Serialize};

use crate::execution::ExecutionInterval;

/// Top-level Palaver configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PalaverConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Dialog authoring limits.
    #[serde(default)]
    pub dialog: DialogConfig,
    /// Action dispatch policy.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Execution-limit tracking.
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Persistence / save settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl PalaverConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `PalaverError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::PalaverError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Whether dialog processing is enabled at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Dialog authoring limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogConfig {
    /// Maximum number of buttons offered to the UI per dialog.
    #[serde(default = "default_max_buttons")]
    pub max_buttons: usize,
    /// Maximum length of generated dialog and button labels.
    #[serde(default = "default_max_label_length")]
    pub max_label_length: usize,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            max_buttons: 6,
            max_label_length: 32,
        }
    }
}

/// Action dispatch policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Highest permission level any action may request.
    #[serde(default = "default_max_permission")]
    pub max_permission_level: u8,
    /// Ceiling for commands executed with the NPC as source.
    #[serde(default = "default_entity_ceiling")]
    pub entity_permission_ceiling: u8,
    /// Additional command verbs to refuse, on top of the built-in blocklist.
    #[serde(default)]
    pub extra_blocked_commands: Vec<String>,
    /// Root command recognised by the `dialog open` authoring shorthand.
    #[serde(default = "default_namespace")]
    pub command_namespace: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_permission_level: 4,
            entity_permission_ceiling: 3,
            extra_blocked_commands: Vec::new(),
            command_namespace: "palaver".to_string(),
        }
    }
}

/// Execution-limit tracking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Interval used when a condition's interval keyword is not recognised.
    #[serde(default = "default_interval")]
    pub default_interval: ExecutionInterval,
    /// Records idle for longer than this many days are pruned.
    #[serde(default = "default_30")]
    pub prune_after_days: u32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            default_interval: ExecutionInterval::PerDay,
            prune_after_days: 30,
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Enable SQLite WAL mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Store a CRC-32 alongside each payload and verify it on load.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
    /// Number of rotating backups to keep (0 disables backups).
    #[serde(default = "default_3")]
    pub backup_count: u32,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            wal_mode: true,
            checksum_enabled: true,
            backup_count: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_buttons() -> usize {
    6
}
fn default_max_label_length() -> usize {
    32
}
fn default_max_permission() -> u8 {
    4
}
fn default_entity_ceiling() -> u8 {
    3
}
fn default_namespace() -> String {
    "palaver".to_string()
}
fn default_interval() -> ExecutionInterval {
    ExecutionInterval::PerDay
}
fn default_30() -> u32 {
    30
}
fn default_3() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = PalaverConfig::from_toml("").expect("parse");
        assert!(config.general.enabled);
        assert_eq!(config.dialog.max_buttons, 6);
        assert_eq!(config.dispatch.max_permission_level, 4);
        assert_eq!(config.execution.default_interval, ExecutionInterval::PerDay);
    }

    #[test]
    fn partial_toml_overrides() {
        let config = PalaverConfig::from_toml(
            r#"
            [dispatch]
            extra_blocked_commands = ["tp"]
            entity_permission_ceiling = 2

            [execution]
            default_interval = "PER_HOUR"
            "#,
        )
        .expect("parse");
        assert_eq!(config.dispatch.extra_blocked_commands, vec!["tp".to_string()]);
        assert_eq!(config.dispatch.entity_permission_ceiling, 2);
        assert_eq!(config.dispatch.max_permission_level, 4);
        assert_eq!(config.execution.default_interval, ExecutionInterval::PerHour);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = PalaverConfig::from_toml("[dialog\nmax_buttons = ").unwrap_err();
        assert!(matches!(err, crate::PalaverError::Config(_)));
    }

    #[test]
    fn from_file_reads_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("palaver.toml");
        std::fs::write(&path, "[general]\nlog_level = \"debug\"\n").expect("write");
        let config = PalaverConfig::from_file(&path).expect("load");
        assert_eq!(config.general.log_level, "debug");
    }
}
