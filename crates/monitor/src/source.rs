//! Where a status cycle gets its readings from.

use std::sync::Arc;

use async_trait::async_trait;
use fieldwatch_core::NormalizedReading;
use fieldwatch_store::TransmissionStore;

use crate::error::MonitorError;

/// Supplies the decoded latest reading per device
#[async_trait]
pub trait ReadingSource: Send + Sync {
    async fn latest_readings(&self) -> Result<Vec<NormalizedReading>, MonitorError>;
}

/// [`ReadingSource`] backed by a [`TransmissionStore`].
///
/// SQLite access is blocking, so each read runs on the blocking pool. The
/// blocking read is not cancelled when the awaiting cycle times out.
#[derive(Clone)]
pub struct StoreReadings {
    store: Arc<TransmissionStore>,
}

impl StoreReadings {
    pub fn new(store: Arc<TransmissionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ReadingSource for StoreReadings {
    async fn latest_readings(&self) -> Result<Vec<NormalizedReading>, MonitorError> {
        let store = Arc::clone(&self.store);
        let readings = tokio::task::spawn_blocking(move || store.read_and_decode_latest()).await??;
        Ok(readings)
    }
}
