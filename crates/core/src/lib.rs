//! Core functionality for the Fieldwatch telemetry monitor.
//!
//! This crate provides the reading schema, device registry, configuration,
//! clock and logging utilities shared by the parser, store and monitor crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod registry;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{
    Config, FailurePolicy, LogFormat, LoggingConfig, MonitorConfig, NotifyConfig, StorageConfig,
};
pub use error::{CoreError, Result, UnknownSource};
pub use registry::DeviceRegistry;
pub use types::{NormalizedReading, Source, TransmissionRecord};
