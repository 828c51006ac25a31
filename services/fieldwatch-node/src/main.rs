use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use fieldwatch_core::{logging, Config};
use fieldwatch_monitor::{LogNotifier, Notifier, SlackNotifier, StatusMonitor, StoreReadings};
use fieldwatch_parser::TransmissionDecoder;
use fieldwatch_store::TransmissionStore;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let config = match parse_config_path(&args)? {
        Some(path) => Config::from_file(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default_config(),
    };

    logging::init_with_format(config.logging.format);

    let decoder = TransmissionDecoder::new(config.devices.clone());
    let store = Arc::new(
        TransmissionStore::open(&config.storage, decoder).context("failed to open store")?,
    );

    let notifier: Arc<dyn Notifier> = match SlackNotifier::from_env(&config.notify) {
        Some(slack) => Arc::new(slack),
        None => {
            warn!(
                token_env = %config.notify.token_env,
                "Chat token not set, status updates go to the log only"
            );
            Arc::new(LogNotifier)
        }
    };

    let handle = StatusMonitor::new(
        Arc::new(StoreReadings::new(store)),
        notifier,
        config.monitor.clone(),
    )
    .start();

    info!(
        db_path = %config.storage.path.display(),
        channel = %config.monitor.channel,
        "fieldwatch-node started"
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    handle.stop().await?;

    Ok(())
}

fn parse_config_path(args: &[String]) -> anyhow::Result<Option<PathBuf>> {
    let mut args_iter = args.iter();
    while let Some(arg) = args_iter.next() {
        if arg == "--config" {
            if let Some(path) = args_iter.next() {
                return Ok(Some(PathBuf::from(path)));
            }
            bail!("--config was provided without a path");
        }
    }

    Ok(None)
}
