//! Error types for colkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using ColKvError
pub type Result<T> = std::result::Result<T, ColKvError>;

/// Unified error type for colkv operations
#[derive(Debug, Error)]
pub enum ColKvError {
    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("{entity} '{name}' is closed")]
    Closed { entity: &'static str, name: String },

    #[error("{entity} '{name}' already exists")]
    AlreadyExists { entity: &'static str, name: String },

    #[error("Capability unsupported: {0}")]
    CapabilityUnsupported(String),

    // -------------------------------------------------------------------------
    // I/O and Storage Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Collision detected on row {key}: read at {expected}, found {found:?}")]
    Collision {
        key: i64,
        expected: i64,
        found: Option<i64>,
    },

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Iterator Errors
    // -------------------------------------------------------------------------
    #[error("No more elements")]
    NoMoreElements,

    #[error("Invalid iterator state: {0}")]
    InvalidIteratorState(String),

    // -------------------------------------------------------------------------
    // Identifier Errors
    // -------------------------------------------------------------------------
    #[error("Invalid identifier '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: String },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown backend type: {0}")]
    UnknownBackend(String),
}

impl ColKvError {
    pub fn closed(entity: &'static str, name: impl Into<String>) -> Self {
        ColKvError::Closed {
            entity,
            name: name.into(),
        }
    }

    pub fn already_exists(entity: &'static str, name: impl Into<String>) -> Self {
        ColKvError::AlreadyExists {
            entity,
            name: name.into(),
        }
    }

    /// Wrap an engine failure, keeping the original cause attached
    pub fn storage<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ColKvError::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn invalid_identifier(value: impl Into<String>, reason: impl Into<String>) -> Self {
        ColKvError::InvalidIdentifier {
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl From<bincode::Error> for ColKvError {
    fn from(e: bincode::Error) -> Self {
        ColKvError::Serialization(e.to_string())
    }
}
