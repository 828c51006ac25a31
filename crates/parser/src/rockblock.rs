//! RockBlock satellite modem decoding
//!
//! One RockBlock channel carries several device classes and firmware
//! versions. The sub-format is selected by the device-name token in field 1
//! together with the field count, which acts as the version discriminant.

use fieldwatch_core::{DeviceRegistry, NormalizedReading, Source, TransmissionRecord};

use crate::error::{ParseError, ParseResult};
use crate::fields::Fields;
use crate::parser::FormatParser;

/// Registered RockBlock sub-formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RockBlockFormat {
    /// Position, environment, charge and uptime (9 or 10 fields)
    RichTelemetry,
    /// Keep-alive with no sensor payload
    MinimalPing,
}

impl RockBlockFormat {
    /// Look up the sub-format for a device-name token and field count
    pub fn select(device_name: &str, field_count: usize) -> Option<Self> {
        match (device_name, field_count) {
            ("NGD-Shah" | "NGD-Jacob" | "NGD-Demo1" | "NGD-Demo2", 9 | 10) => {
                Some(RockBlockFormat::RichTelemetry)
            }
            ("A1" | "A3", 6 | 8 | 11) | ("A2", 6) => Some(RockBlockFormat::MinimalPing),
            _ => None,
        }
    }

    fn decode(&self, record: &TransmissionRecord, fields: &Fields<'_>) -> ParseResult<NormalizedReading> {
        let name = fields.text(1)?.to_string();
        let mut reading = NormalizedReading::blank(record, Source::RockBlock, name);

        match self {
            RockBlockFormat::RichTelemetry => {
                reading.latitude = fields.number(2, "lat")?;
                reading.longitude = fields.number(3, "lon")?;
                reading.altitude = Some(fields.number(4, "altitude")?);
                reading.temperature = Some(fields.number(5, "temperature")?);
                reading.humidity = Some(fields.number(6, "humidity")?);
                // Reported as a fraction
                reading.charge = fields.number(7, "charge")? * 100.0;
                reading.uptime_seconds = Some(fields.number(8, "uptime")?);
            }
            RockBlockFormat::MinimalPing => {}
        }

        Ok(reading)
    }
}

/// Decoder for [`Source::RockBlock`]
#[derive(Debug, Default, Clone, Copy)]
pub struct RockBlockParser;

impl FormatParser for RockBlockParser {
    fn source(&self) -> Source {
        Source::RockBlock
    }

    fn parse(
        &self,
        record: &TransmissionRecord,
        _registry: &DeviceRegistry,
    ) -> ParseResult<Option<NormalizedReading>> {
        let fields = Fields::split(Source::RockBlock, &record.payload);
        let field_count = fields.len();
        if field_count <= 1 {
            return Ok(None);
        }

        let device_name = fields.text(1)?;
        let format = RockBlockFormat::select(device_name, field_count).ok_or_else(|| {
            ParseError::UnknownFormat {
                device_name: device_name.to_string(),
                field_count,
            }
        })?;

        format.decode(record, &fields).map(Some)
    }
}
