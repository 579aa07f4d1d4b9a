//! Error types for the host collaborator contracts.

use thiserror::Error;

/// Errors a host collaborator can report.
///
/// The queue core absorbs every one of these into a degraded steady state;
/// none of them reach the core's own callers.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The collaborator cannot be reached right now (scene not loaded, etc.)
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    /// Persistent storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored value does not parse for its key
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

impl EnvError {
    /// Creates an unavailable error.
    pub fn unavailable(what: impl Into<String>) -> Self {
        Self::Unavailable(what.into())
    }

    /// Creates a storage error.
    pub fn storage(msg: impl std::fmt::Display) -> Self {
        Self::Storage(msg.to_string())
    }

    /// Creates an invalid-value error.
    pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}
