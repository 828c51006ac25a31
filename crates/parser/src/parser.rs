//! Source dispatch for transmission decoding.

use std::sync::Arc;

use fieldwatch_core::{DeviceRegistry, NormalizedReading, Source, TransmissionRecord};
use tracing::trace;

use crate::error::ParseResult;
use crate::particle::ParticleParser;
use crate::rockblock::RockBlockParser;
use crate::twilio::TwilioParser;

/// Decoder for one source's payload format.
///
/// `Ok(None)` means the transmission carries no reading; it is not a
/// failure.
pub trait FormatParser: Send + Sync {
    /// Source this parser handles
    fn source(&self) -> Source;

    /// Decode a stored transmission
    fn parse(
        &self,
        record: &TransmissionRecord,
        registry: &DeviceRegistry,
    ) -> ParseResult<Option<NormalizedReading>>;
}

/// Top-level decoder: selects a [`FormatParser`] by source and applies it.
#[derive(Debug, Clone)]
pub struct TransmissionDecoder {
    registry: Arc<DeviceRegistry>,
}

impl TransmissionDecoder {
    pub fn new(registry: DeviceRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Parser registered for `source`
    pub fn parser_for(source: Source) -> &'static dyn FormatParser {
        match source {
            Source::RockBlock => &RockBlockParser,
            Source::Particle => &ParticleParser,
            Source::Twilio => &TwilioParser,
        }
    }

    /// Decode `record` into a reading.
    ///
    /// Fails with `UnknownSource` when the stored tag has no parser.
    pub fn decode(&self, record: &TransmissionRecord) -> ParseResult<Option<NormalizedReading>> {
        let source = record.source()?;
        trace!(device_id = %record.device_id, source = %source, "Decoding transmission");
        Self::parser_for(source).parse(record, &self.registry)
    }
}

impl Default for TransmissionDecoder {
    fn default() -> Self {
        Self::new(DeviceRegistry::default())
    }
}
