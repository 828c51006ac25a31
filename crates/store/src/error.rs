//! Error types for transmission storage.

use fieldwatch_parser::ParseError;
use thiserror::Error;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Another thread panicked while holding the connection
    #[error("Store connection lock poisoned")]
    LockPoisoned,

    /// A stored timestamp is outside the representable range
    #[error("Invalid stored timestamp: {0}")]
    InvalidTimestamp(i64),

    /// A row failed to decode under the abort policy
    #[error("Failed to decode transmission from {device_id}: {source}")]
    Decode {
        device_id: String,
        source: ParseError,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;
