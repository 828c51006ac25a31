//! Reading schema
//!
//! Shapes shared by every stage of the pipeline: the source a transmission
//! arrived on, the stored transmission as it is read back, and the
//! normalized reading produced by decoding it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownSource;

/// Origin channel of a transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// RockBlock satellite modem
    RockBlock,
    /// Particle cellular device
    Particle,
    /// Twilio SMS gateway
    Twilio,
}

impl Source {
    /// Tag persisted in the `source` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::RockBlock => "rockblock",
            Source::Particle => "particle",
            Source::Twilio => "twilio",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rockblock" => Ok(Source::RockBlock),
            "particle" => Ok(Source::Particle),
            "twilio" => Ok(Source::Twilio),
            other => Err(UnknownSource(other.to_string())),
        }
    }
}

/// A transmission row read back from storage.
///
/// History rows carry the `sequence_id` assigned on append; rows from the
/// latest view do not. `source` keeps the stored tag verbatim so that a row
/// written by a foreign producer can still be listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionRecord {
    /// History identity, `None` for latest-view rows
    pub sequence_id: Option<u64>,
    /// Device identifier (serial, core id or phone number)
    pub device_id: String,
    /// Time the device reported
    pub time: DateTime<Utc>,
    /// Raw payload text
    pub payload: String,
    /// Stored source tag
    pub source: String,
    /// Seconds between `time` and the moment of the read
    pub age_seconds: f64,
}

impl TransmissionRecord {
    /// Resolve the stored tag into a [`Source`]
    pub fn source(&self) -> Result<Source, UnknownSource> {
        self.source.parse()
    }
}

/// Decoded reading, uniform in shape across sources.
///
/// Numeric fields a source never reports are `0.0`; the optional fields are
/// only populated by RockBlock rich telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReading {
    /// Device identifier
    pub id: String,
    /// History identity when decoded from the history view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_id: Option<u64>,
    pub time: DateTime<Utc>,
    pub source: Source,
    pub age_seconds: f64,
    /// Friendly device name
    pub display_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Battery level; percentage or raw voltage depending on source
    pub battery: f64,
    /// Charge level in percent
    pub charge: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<f64>,
}

impl NormalizedReading {
    /// Start a reading for `record` with every numeric field zeroed
    pub fn blank(record: &TransmissionRecord, source: Source, display_name: String) -> Self {
        Self {
            id: record.device_id.clone(),
            sequence_id: record.sequence_id,
            time: record.time,
            source,
            age_seconds: record.age_seconds,
            display_name,
            latitude: 0.0,
            longitude: 0.0,
            battery: 0.0,
            charge: 0.0,
            altitude: None,
            temperature: None,
            humidity: None,
            uptime_seconds: None,
        }
    }

    /// Age in whole-and-fractional minutes
    pub fn age_minutes(&self) -> f64 {
        self.age_seconds / 60.0
    }
}
