//! Error types for the status monitor.

use std::time::Duration;

use fieldwatch_store::StoreError;
use thiserror::Error;

/// Notification delivery errors
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport failure or non-success HTTP status
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The chat service accepted the request but refused the message
    #[error("Message rejected: {0}")]
    Rejected(String),
}

/// Errors raised by a status cycle
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Reading the latest transmissions failed
    #[error("Read error: {0}")]
    Read(#[from] StoreError),

    /// Delivering the status message failed
    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),

    /// The cycle did not finish in time
    #[error("Status cycle timed out after {0:?}")]
    Timeout(Duration),

    /// A background task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(#[from] tokio::task::JoinError),
}
