//! Twilio SMS gateway decoding
//!
//! Every sender must be registered. Ten-field messages carry battery and
//! charge; shorter messages are text only. SMS never carries location.

use fieldwatch_core::{DeviceRegistry, NormalizedReading, Source, TransmissionRecord};

use crate::error::{ParseError, ParseResult};
use crate::fields::Fields;
use crate::parser::FormatParser;

const TELEMETRY_FIELD_COUNT: usize = 10;

/// Decoder for [`Source::Twilio`]
#[derive(Debug, Default, Clone, Copy)]
pub struct TwilioParser;

impl FormatParser for TwilioParser {
    fn source(&self) -> Source {
        Source::Twilio
    }

    fn parse(
        &self,
        record: &TransmissionRecord,
        registry: &DeviceRegistry,
    ) -> ParseResult<Option<NormalizedReading>> {
        let name = registry
            .twilio_name(&record.device_id)
            .ok_or_else(|| ParseError::UnknownDevice(record.device_id.clone()))?
            .to_string();

        let fields = Fields::split(Source::Twilio, &record.payload);
        let mut reading = NormalizedReading::blank(record, Source::Twilio, name);

        if fields.len() == TELEMETRY_FIELD_COUNT {
            reading.battery = fields.number(2, "battery")?;
            reading.charge = fields.number(3, "charge")? * 100.0;
        }

        Ok(Some(reading))
    }
}
