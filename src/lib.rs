pub mod client;
pub mod config;
pub mod extractors;
pub mod models;
pub mod normalizer;
pub mod poller;
pub mod publisher;
pub mod store;

use crate::client::PortalClient;
use crate::config::AppConfig;
use crate::poller::Poller;
use crate::store::JsonFileStore;
use anyhow::Context;
use log::{debug, error, info};
use tokio::time::MissedTickBehavior;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting application");

    tokio::select! {
        result = main_loop(&config) => {
            if let Err(e) = result {
                error!("Application error: {e:#}");
                // Print chain of error causes
                let mut source = e.source();
                while let Some(e) = source {
                    error!("Caused by: {e}");
                    source = e.source();
                }
                return Err(e).context("Application failed to run");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested, stopping poller");
        }
    }

    Ok(())
}

async fn main_loop(config: &AppConfig) -> anyhow::Result<()> {
    let targets = config.targets()?;
    let client = PortalClient::new(&config.portal)?;
    let store = JsonFileStore::open(&config.store.file)
        .context(format!("Failed to open state file {}", config.store.file))?;
    let mut poller = Poller::new(config, client, store);

    info!(
        "Polling {} phone id(s) from {}",
        targets.len(),
        config.portal.url()
    );

    let period = poller::poll_period(&targets).unwrap_or_else(|| config.interval());
    debug!("Poll interval: {} s", period.as_secs());
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await; // Wait for the next tick

        debug!("Starting poll cycle");
        let report = poller.poll_cycle(&targets).await;
        info!(
            "Poll cycle done: {}/{} phone ids reachable, {} sensors, {} values, {} write errors",
            report.targets - report.failed,
            report.targets,
            report.sensors,
            report.values,
            report.write_errors
        );
    }
}
