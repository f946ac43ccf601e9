//! Error types for the Hearth engine.

use thiserror::Error;

/// A shared error type for the Hearth engine crates.
///
/// Recoverable conditions (missing files, corrupt stores, process
/// failures) are handled locally and never surface as this type; only
/// conditions the caller must act on do (unknown entities, rejected
/// input, disk write failures).
#[derive(Error, Debug)]
pub enum HearthError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Security error (e.g. a rejected history date key)
    #[error("Security error: {0}")]
    Security(String),

    /// External reasoning process error
    #[error("Process error: {0}")]
    Process(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HearthError {
    /// Creates a `NotFound` error for the given entity type and id.
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        HearthError::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an `Internal` error from any displayable value.
    pub fn internal(message: impl std::fmt::Display) -> Self {
        HearthError::Internal(message.to_string())
    }
}

impl From<std::io::Error> for HearthError {
    fn from(err: std::io::Error) -> Self {
        HearthError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for HearthError {
    fn from(err: serde_json::Error) -> Self {
        HearthError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for HearthError {
    fn from(err: anyhow::Error) -> Self {
        HearthError::Internal(format!("{err:#}"))
    }
}

/// Convenience result alias using [`HearthError`].
pub type Result<T> = std::result::Result<T, HearthError>;
