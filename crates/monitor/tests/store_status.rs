//! Status cycles driven by a real transmission store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use fieldwatch_core::{DeviceRegistry, FailurePolicy, MonitorConfig, Source};
use fieldwatch_monitor::{MonitorError, Notifier, NotifyError, StatusMonitor, StoreReadings};
use fieldwatch_parser::TransmissionDecoder;
use fieldwatch_store::{StoreError, TransmissionStore};

#[derive(Default)]
struct Inbox {
    messages: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Notifier for Inbox {
    async fn deliver(&self, channel: &str, text: &str) -> Result<(), NotifyError> {
        self.messages
            .lock()
            .unwrap()
            .push((channel.to_string(), text.to_string()));
        Ok(())
    }
}

fn store(policy: FailurePolicy) -> Arc<TransmissionStore> {
    let store = TransmissionStore::open_in_memory(TransmissionDecoder::new(DeviceRegistry::default()))
        .unwrap()
        .with_failure_policy(policy);
    Arc::new(store)
}

#[tokio::test]
async fn cycle_reports_latest_reading_per_device() {
    let store = store(FailurePolicy::Drop);
    let now = Utc::now();
    store
        .append("200051000e51353432393339", now - Duration::minutes(30), "3.9,20,0,0", Source::Particle)
        .unwrap();
    store
        .append("200051000e51353432393339", now - Duration::minutes(10), "3.9,75,0,0", Source::Particle)
        .unwrap();
    store
        .append("300234010753370", now - Duration::minutes(2), "1,A3,0,0,0,0", Source::RockBlock)
        .unwrap();
    store
        .append("+15550001111", now, "unregistered sender", Source::Twilio)
        .unwrap();

    let inbox = Arc::new(Inbox::default());
    let monitor = StatusMonitor::new(
        Arc::new(StoreReadings::new(store)),
        inbox.clone(),
        MonitorConfig::default(),
    );

    let report = monitor.run_cycle().await.unwrap();
    assert_eq!(report.readings, 2);

    let messages = inbox.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);

    let (channel, text) = &messages[0];
    assert_eq!(channel, "#testing");
    assert!(text.starts_with("Status Update\n```\n"));
    assert!(text.contains("Jacob: "));
    assert!(text.contains("(75.000000)"));
    assert!(text.contains("A3: "));
    assert!(!text.contains("+15550001111"));
}

#[tokio::test]
async fn abort_policy_fails_the_cycle() {
    let store = store(FailurePolicy::Abort);
    store
        .append("+15550001111", Utc::now(), "hello", Source::Twilio)
        .unwrap();

    let inbox = Arc::new(Inbox::default());
    let monitor = StatusMonitor::new(
        Arc::new(StoreReadings::new(store)),
        inbox.clone(),
        MonitorConfig::default(),
    );

    assert!(matches!(
        monitor.run_cycle().await,
        Err(MonitorError::Read(StoreError::Decode { .. }))
    ));
    assert!(inbox.messages.lock().unwrap().is_empty());
}
