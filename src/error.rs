//! Error types for EmberKV
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using EmberError
pub type Result<T> = std::result::Result<T, EmberError>;

/// Unified error type for EmberKV operations
#[derive(Debug, Error)]
pub enum EmberError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    KeyNotFound,

    /// The in-memory mutation was applied but its durability file was not
    /// written (or removed).
    #[error("Persist failed for key {key:?}: {source}")]
    Persist {
        key: String,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Durability File Errors
    // -------------------------------------------------------------------------
    #[error("Durability record parse error: {0}")]
    Parse(String),

    // -------------------------------------------------------------------------
    // Snapshot Errors
    // -------------------------------------------------------------------------
    #[error("Snapshot not found: {}", .0.display())]
    SnapshotNotFound(PathBuf),

    #[error("Snapshot decode error: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EmberError {
    /// Wrap an I/O failure that happened after the in-memory state changed
    pub(crate) fn persist(key: &str, source: std::io::Error) -> Self {
        Self::Persist {
            key: key.to_string(),
            source,
        }
    }
}
