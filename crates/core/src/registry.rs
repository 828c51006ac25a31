//! Device name lookup tables.
//!
//! The registry is configuration data: it is deserialized from the
//! `[devices]` section of the config file, so adding a device never needs a
//! rebuild. The built-in tables are used when no config is given.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Friendly names keyed by the identifier each source reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRegistry {
    /// Particle core id -> friendly name
    #[serde(default)]
    pub particle: BTreeMap<String, String>,
    /// Twilio sender phone number -> friendly name
    #[serde(default)]
    pub twilio: BTreeMap<String, String>,
}

impl DeviceRegistry {
    /// Registry with no devices
    pub fn empty() -> Self {
        Self {
            particle: BTreeMap::new(),
            twilio: BTreeMap::new(),
        }
    }

    pub fn particle_name(&self, device_id: &str) -> Option<&str> {
        self.particle.get(device_id).map(String::as_str)
    }

    pub fn twilio_name(&self, phone_number: &str) -> Option<&str> {
        self.twilio.get(phone_number).map(String::as_str)
    }

    /// Register a Particle device, replacing any previous name
    pub fn with_particle(mut self, device_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.particle.insert(device_id.into(), name.into());
        self
    }

    /// Register a Twilio sender, replacing any previous name
    pub fn with_twilio(mut self, phone_number: impl Into<String>, name: impl Into<String>) -> Self {
        self.twilio.insert(phone_number.into(), name.into());
        self
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::empty()
            .with_particle("200051000e51353432393339", "Jacob")
            .with_particle("4f003c000b51343334363138", "SharkOne")
            .with_particle("4d0049000d51353432393339", "SharkTwo")
            .with_particle("250042000e51353432393339", "SharkThree")
            .with_particle("50002e000551353437353039", "SharkFour")
            .with_particle("280040000e51353432393339", "SharkFive")
            .with_twilio("+12039098762", "Jacob-Ting-SMS")
    }
}
