//! Fieldwatch Store
//!
//! Durable storage for raw transmissions: an append-only history plus a
//! latest-per-device view, both backed by SQLite.

pub mod error;
pub mod store;

pub use error::{Result, StoreError};
pub use store::{open_path, StoreMetrics, TransmissionStore};
