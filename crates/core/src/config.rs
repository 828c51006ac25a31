//! Configuration management for Fieldwatch.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::registry::DeviceRegistry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub devices: DeviceRegistry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
    pub failure_policy: FailurePolicy,
}

/// What a batch read does with a row that fails to decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Skip the row and keep going
    #[default]
    Drop,
    /// Fail the whole batch
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub startup_delay_secs: u64,
    pub interval_secs: u64,
    pub cycle_timeout_secs: u64,
    pub channel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Environment variable holding the chat API token
    pub token_env: String,
    pub api_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/app/data/monitor.db"),
            busy_timeout_ms: 5_000,
            failure_policy: FailurePolicy::Drop,
        }
    }
}

impl StorageConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            startup_delay_secs: 5,
            interval_secs: 15 * 60,
            cycle_timeout_secs: 120,
            channel: "#testing".to_string(),
        }
    }
}

impl MonitorConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs)
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            token_env: "SLACK_API_TOKEN".to_string(),
            api_url: "https://slack.com/api/chat.postMessage".to_string(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        debug!(
            path = %path.display(),
            particle_devices = config.devices.particle.len(),
            twilio_devices = config.devices.twilio.len(),
            "Loaded config"
        );
        Ok(config)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            storage: StorageConfig::default(),
            monitor: MonitorConfig::default(),
            notify: NotifyConfig::default(),
            logging: LoggingConfig::default(),
            devices: DeviceRegistry::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
