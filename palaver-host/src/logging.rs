//! Tracing subscriber setup.

use palaver_core::PalaverError;
use palaver_core::config::GeneralConfig;
use palaver_core::error::Result;
use tracing_subscriber::EnvFilter;

/// Filter built from `RUST_LOG` when set, otherwise from `general.log_level`.
///
/// # Errors
/// Returns [`PalaverError::Config`] if the configured level is not a valid
/// filter directive.
pub fn env_filter(general: &GeneralConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&general.log_level).map_err(|e| {
        PalaverError::Config(format!("invalid log level '{}': {e}", general.log_level))
    })
}

/// Install the global subscriber: human-readable lines, or JSON lines when
/// `general.json_logs` is set.
///
/// # Errors
/// Returns [`PalaverError::Config`] if the filter is invalid or a global
/// subscriber is already installed.
pub fn init(general: &GeneralConfig) -> Result<()> {
    let filter = env_filter(general)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if general.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| PalaverError::Config(format!("logging already initialised: {e}")))?;
    tracing::info!(level = %general.log_level, json = general.json_logs, "Logging initialised");
    Ok(())
}
