//! Error types for the article cache
//!
//! The facade never surfaces these to callers; they flow out of storage
//! backends, the persistence worker and configuration loading, and are
//! logged at the facade boundary.

use thiserror::Error;

/// Main error type for cache and persistence operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// Durable storage backend rejected an operation
    #[error("Storage error for key '{key}': {message}")]
    Storage { key: String, message: String },

    /// Filesystem error from a file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The persistence worker has stopped and no longer accepts commands
    #[error("Persistence worker is closed")]
    WorkerClosed,

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

impl CacheError {
    /// Build a storage error for a given key
    pub fn storage(key: impl Into<String>, message: impl Into<String>) -> Self {
        CacheError::Storage {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

impl From<String> for CacheError {
    fn from(s: String) -> Self {
        CacheError::Other(s)
    }
}

impl From<&str> for CacheError {
    fn from(s: &str) -> Self {
        CacheError::Other(s.to_string())
    }
}
