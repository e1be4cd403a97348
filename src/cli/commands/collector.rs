//! Collector daemon command implementation.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;

use hashfleet_collector::{HostCollector, Server};
use hashfleet_monitor::setup_logging;

pub async fn run(config_path: &Path, log_level: &str) -> Result<()> {
    setup_logging(log_level, false);
    let config = hashfleet_config::load_config(config_path)?;

    let collector = HostCollector::new(
        &config.collector.miner_ports,
        Duration::from_millis(config.collector.request_timeout_ms),
    );
    let server = Server::bind(config.collector.listen_port)
        .await
        .with_context(|| format!("cannot bind collector port {}", config.collector.listen_port))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(true);
    });

    server.run(collector, shutdown_rx).await;
    Ok(())
}
