//! Error types for SlotKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using SlotKvError
pub type Result<T> = std::result::Result<T, SlotKvError>;

/// Unified error type for SlotKV operations
#[derive(Debug, Error)]
pub enum SlotKvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// Also covers failures while extending or remapping the backing file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt store: {0}")]
    CorruptStore(String),

    #[error("{field} length {len} exceeds field width (max {max})")]
    FieldOverflow {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("TTL of {0} seconds overflows the 4-byte expiry timestamp")]
    TtlOverflow(u32),

    // -------------------------------------------------------------------------
    // Key Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    KeyNotFound,

    #[error("Key already exists")]
    KeyAlreadyExists,

    #[error("Key expired")]
    KeyExpired,

    #[error("Key too large: {len} bytes (max {max})")]
    KeyTooLarge { len: usize, max: usize },

    #[error("Value too large: {len} bytes (max {max})")]
    ValueTooLarge { len: usize, max: usize },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Background Task Errors
    // -------------------------------------------------------------------------
    #[error("Expiration sweeper error: {0}")]
    Sweeper(String),
}

impl From<serde_json::Error> for SlotKvError {
    fn from(e: serde_json::Error) -> Self {
        SlotKvError::Serialization(e.to_string())
    }
}
