//! Fieldwatch Parser
//!
//! Decodes raw transmissions from RockBlock, Particle and Twilio devices
//! into [`NormalizedReading`](fieldwatch_core::NormalizedReading)s.

pub mod error;
mod fields;
pub mod parser;
pub mod particle;
pub mod rockblock;
pub mod twilio;

pub use error::{ParseError, ParseResult};
pub use parser::{FormatParser, TransmissionDecoder};
pub use particle::ParticleParser;
pub use rockblock::{RockBlockFormat, RockBlockParser};
pub use twilio::TwilioParser;
