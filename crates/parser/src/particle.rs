//! Particle cellular device decoding
//!
//! Fixed layout: `battery,charge,lat,lon`. The friendly name comes from the
//! registry and falls back to the core id for unregistered devices.

use fieldwatch_core::{DeviceRegistry, NormalizedReading, Source, TransmissionRecord};

use crate::error::ParseResult;
use crate::fields::Fields;
use crate::parser::FormatParser;

const FIELD_COUNT: usize = 4;

/// Decoder for [`Source::Particle`]
#[derive(Debug, Default, Clone, Copy)]
pub struct ParticleParser;

impl FormatParser for ParticleParser {
    fn source(&self) -> Source {
        Source::Particle
    }

    fn parse(
        &self,
        record: &TransmissionRecord,
        registry: &DeviceRegistry,
    ) -> ParseResult<Option<NormalizedReading>> {
        let fields = Fields::split(Source::Particle, &record.payload);
        fields.require(FIELD_COUNT)?;

        let name = registry
            .particle_name(&record.device_id)
            .unwrap_or(record.device_id.as_str())
            .to_string();

        let mut reading = NormalizedReading::blank(record, Source::Particle, name);
        reading.battery = fields.number(0, "battery")?;
        reading.charge = fields.number(1, "charge")?;
        reading.latitude = fields.number(2, "lat")?;
        reading.longitude = fields.number(3, "lon")?;

        Ok(Some(reading))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use chrono::{TimeZone, Utc};

    fn record(device_id: &str, payload: &str) -> TransmissionRecord {
        TransmissionRecord {
            sequence_id: None,
            device_id: device_id.to_string(),
            time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            payload: payload.to_string(),
            source: "particle".to_string(),
            age_seconds: 12.0,
        }
    }

    #[test]
    fn test_registered_device() {
        let reading = ParticleParser
            .parse(
                &record("200051000e51353432393339", "3.98,87.5,-33.86,151.21"),
                &DeviceRegistry::default(),
            )
            .unwrap()
            .unwrap();

        assert_eq!(reading.display_name, "Jacob");
        assert_eq!(reading.battery, 3.98);
        assert_eq!(reading.charge, 87.5);
        assert_eq!(reading.latitude, -33.86);
        assert_eq!(reading.longitude, 151.21);
        assert!(reading.humidity.is_none());
    }

    #[test]
    fn test_unregistered_device_falls_back_to_id() {
        let reading = ParticleParser
            .parse(&record("ffff00000000000000000000", "1,2,3,4"), &DeviceRegistry::default())
            .unwrap()
            .unwrap();

        assert_eq!(reading.display_name, "ffff00000000000000000000");
    }

    #[test]
    fn test_truncated_payload() {
        let result = ParticleParser.parse(&record("dev", "3.9,80"), &DeviceRegistry::default());
        assert_eq!(
            result,
            Err(ParseError::TruncatedPayload {
                channel: Source::Particle,
                expected: 4,
                actual: 2
            })
        );
    }

    #[test]
    fn test_malformed_battery() {
        let result = ParticleParser.parse(&record("dev", "low,80,0,0"), &DeviceRegistry::default());
        assert!(matches!(
            result,
            Err(ParseError::MalformedField { field: "battery", .. })
        ));
    }
}
