//! Status Monitor - periodic fleet status report
//!
//! A single background task that, on every cycle, reads the latest decoded
//! reading per device, formats one line per device and hands the message to
//! a [`Notifier`].
//!
//! # Scheduling
//!
//! - The first cycle fires `startup_delay` after [`StatusMonitor::start`]
//! - Each later cycle fires `interval` after the previous cycle *finished*
//! - A failed or timed-out cycle is logged and the next one is still scheduled
//!
//! Cycles hold a run lock so a manually triggered cycle can never overlap a
//! scheduled one. Every cycle is bounded by `cycle_timeout`; the lock is
//! released when the cycle future completes or is dropped.
//!
//! A timeout only abandons the async side of a cycle. With [`StoreReadings`]
//! the SQLite read keeps running on the blocking pool and holds the store's
//! connection mutex until it returns, so appends wait behind it (bounded by
//! the store's busy timeout only once they reach SQLite). The next cycle can
//! start, but its read queues on the same mutex.
//!
//! [`StoreReadings`]: crate::source::StoreReadings

use std::sync::Arc;

use fieldwatch_core::{MonitorConfig, NormalizedReading};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::MonitorError;
use crate::notify::Notifier;
use crate::source::ReadingSource;

/// Outcome of a successful cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Number of readings included in the message
    pub readings: usize,
}

/// Periodic status reporter
pub struct StatusMonitor {
    source: Arc<dyn ReadingSource>,
    notifier: Arc<dyn Notifier>,
    config: MonitorConfig,
    run_lock: Mutex<()>,
}

impl StatusMonitor {
    pub fn new(
        source: Arc<dyn ReadingSource>,
        notifier: Arc<dyn Notifier>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            source,
            notifier,
            config,
            run_lock: Mutex::new(()),
        }
    }

    /// Run one cycle: read, format, deliver.
    pub async fn run_cycle(&self) -> Result<CycleReport, MonitorError> {
        let _guard = self.run_lock.lock().await;

        let readings = self.source.latest_readings().await?;
        let text = format_status(&readings);
        self.notifier.deliver(&self.config.channel, &text).await?;

        Ok(CycleReport {
            readings: readings.len(),
        })
    }

    /// Run one cycle bounded by the configured timeout.
    pub async fn run_cycle_with_timeout(&self) -> Result<CycleReport, MonitorError> {
        let limit = self.config.cycle_timeout();
        tokio::time::timeout(limit, self.run_cycle())
            .await
            .map_err(|_| MonitorError::Timeout(limit))?
    }

    async fn run_scheduled_cycle(&self) {
        match self.run_cycle_with_timeout().await {
            Ok(report) => {
                info!(
                    channel = %self.config.channel,
                    readings = report.readings,
                    "Status update delivered"
                );
            }
            Err(err) => {
                error!(
                    channel = %self.config.channel,
                    error = %err,
                    "Status cycle failed"
                );
            }
        }
    }

    /// Start the background loop.
    ///
    /// Returns a handle that stops the loop. Dropping the handle also stops
    /// it at the next scheduling point.
    pub fn start(self) -> MonitorHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let monitor = Arc::new(self);

        info!(
            startup_delay_secs = monitor.config.startup_delay_secs,
            interval_secs = monitor.config.interval_secs,
            "Starting status monitor"
        );

        let task = tokio::spawn(async move {
            let mut delay = monitor.config.startup_delay();

            loop {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = stop_rx.changed() => break,
                }

                monitor.run_scheduled_cycle().await;

                delay = monitor.config.interval();
                debug!(next_in_secs = delay.as_secs(), "Next status cycle scheduled");
            }

            info!("Status monitor stopped");
        });

        MonitorHandle { stop_tx, task }
    }
}

/// Handle for controlling the background loop
pub struct MonitorHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Stop the loop and wait for it to exit.
    ///
    /// A cycle already in progress runs to completion first.
    pub async fn stop(self) -> Result<(), MonitorError> {
        let _ = self.stop_tx.send(true);
        self.task.await?;
        Ok(())
    }
}

/// One status line: `<name>: <age in minutes> mins (<charge>)`
pub fn format_line(reading: &NormalizedReading) -> String {
    format!(
        "{}: {:.1} mins ({:.6})",
        reading.display_name,
        reading.age_minutes(),
        reading.charge
    )
}

/// Full status message with one line per reading
pub fn format_status(readings: &[NormalizedReading]) -> String {
    let lines: Vec<String> = readings.iter().map(format_line).collect();
    format!("Status Update\n```\n{}\n```", lines.join("\n"))
}
