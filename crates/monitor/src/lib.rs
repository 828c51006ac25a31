//! Fieldwatch Monitor
//!
//! Periodic fleet status reporting: reads the latest decoded reading per
//! device and posts a one-line-per-device summary to a chat channel.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use fieldwatch_core::MonitorConfig;
//! use fieldwatch_monitor::{LogNotifier, StatusMonitor, StoreReadings};
//! use fieldwatch_parser::TransmissionDecoder;
//! use fieldwatch_store::TransmissionStore;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(TransmissionStore::open_in_memory(TransmissionDecoder::default())?);
//! let monitor = StatusMonitor::new(
//!     Arc::new(StoreReadings::new(store)),
//!     Arc::new(LogNotifier),
//!     MonitorConfig::default(),
//! );
//!
//! let handle = monitor.start();
//! // ...
//! handle.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod monitor;
pub mod notify;
pub mod source;

pub use error::{MonitorError, NotifyError};
pub use monitor::{format_line, format_status, CycleReport, MonitorHandle, StatusMonitor};
pub use notify::{LogNotifier, Notifier, SlackNotifier};
pub use source::{ReadingSource, StoreReadings};
