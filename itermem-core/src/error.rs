//! Error types for itermem-core.
//!
//! Only storage contract violations surface as errors. Validation, duplicate
//! and not-found conditions are reported as [`crate::types::MemoryEvent`]
//! outcomes instead.

use thiserror::Error;

/// Result type alias using itermem-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for memory store operations
#[derive(Error, Debug)]
pub enum Error {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors (encode side; decode failures are skipped per line)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
