//! Core error types

use thiserror::Error;

/// Core error type for Fieldwatch
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored source tag with no registered decoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown source: {0}")]
pub struct UnknownSource(pub String);

pub type Result<T> = std::result::Result<T, CoreError>;
