//! Error types for kvrestore
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using RestoreError
pub type Result<T> = std::result::Result<T, RestoreError>;

/// Unified error type for kvrestore operations
#[derive(Debug, Error)]
pub enum RestoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Dump Log Errors
    // -------------------------------------------------------------------------
    #[error("Dump log corruption detected: {0}")]
    LogCorruption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Keystore Errors
    // -------------------------------------------------------------------------
    #[error("Keystore error: {0}")]
    Keystore(String),

    #[error("Load error: {0}")]
    Load(String),

    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Driver error: {0}")]
    Driver(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for RestoreError {
    fn from(e: bincode::Error) -> Self {
        RestoreError::Serialization(e.to_string())
    }
}
