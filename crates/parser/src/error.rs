//! Error types for transmission decoding.

use fieldwatch_core::{Source, UnknownSource};
use thiserror::Error;

/// Errors that can occur while decoding a transmission.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// No RockBlock sub-format is registered for this device name and field count
    #[error("Unknown RockBlock format: device {device_name} with {field_count} fields")]
    UnknownFormat {
        device_name: String,
        field_count: usize,
    },

    /// Sender is not in the device registry
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    /// A numeric field did not parse
    #[error("Malformed field {field}: {value:?}")]
    MalformedField { field: &'static str, value: String },

    /// Payload has fewer fields than the layout requires
    #[error("Truncated {channel} payload: expected {expected} fields, got {actual}")]
    TruncatedPayload {
        channel: Source,
        expected: usize,
        actual: usize,
    },

    /// Stored source tag has no decoder
    #[error(transparent)]
    UnknownSource(#[from] UnknownSource),
}

impl ParseError {
    /// Stable classification used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::UnknownFormat { .. } => "unknown_format",
            ParseError::UnknownDevice(_) => "unknown_device",
            ParseError::MalformedField { .. } => "malformed_field",
            ParseError::TruncatedPayload { .. } => "truncated_payload",
            ParseError::UnknownSource(_) => "unknown_source",
        }
    }
}

/// Result type for decoding.
pub type ParseResult<T> = Result<T, ParseError>;
