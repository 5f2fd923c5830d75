//! Error types for the Palaver core library.
//!
//! Only failures the caller has to act on become errors. Malformed conditions,
//! unsafe commands and dangling dialog references are reported through
//! verdicts and log lines instead.

use thiserror::Error;

/// Top-level error type for all Palaver operations.
#[derive(Error, Debug)]
pub enum PalaverError {
    /// A dialog entry could not be accepted.
    #[error("Invalid dialog '{label}': {reason}")]
    InvalidDialog {
        /// Label of the offending dialog.
        label: String,
        /// Why it was rejected.
        reason: String,
    },

    /// No persisted data exists for the requested world.
    #[error("World not found: {0}")]
    WorldNotFound(crate::WorldId),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for PalaverError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, PalaverError>;
