//! Monitor command implementation.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::info;

use hashfleet_monitor::{setup_file_logging, Dashboard};
use hashfleet_poller::{spawn_pollers, FleetState, PollerConfig};

use crate::cli::MonitorArgs;

pub async fn run(args: MonitorArgs, config_path: &Path, log_level: &str) -> Result<()> {
    let config = hashfleet_config::load_config(config_path)?;

    // Logs go to a file; the terminal belongs to the dashboard.
    let log_dir = hashfleet_config::default_log_dir()?;
    let _guard = setup_file_logging(log_level, &log_dir)
        .with_context(|| format!("cannot open log directory {}", log_dir.display()))?;

    let hosts_file = match args.hosts_file.or_else(|| config.monitor.hosts_file.clone()) {
        Some(path) => path,
        None => hashfleet_config::default_hosts_file()?,
    };
    let hosts = hashfleet_config::load_hosts(&hosts_file)?;
    info!(
        hosts = hosts.len(),
        file = %hosts_file.display(),
        "monitor starting"
    );

    let state = Arc::new(FleetState::new(hosts));
    let poller_config = PollerConfig {
        collector_port: config.collector.listen_port,
        poll_interval: Duration::from_millis(config.monitor.poll_interval_ms),
        request_timeout: Duration::from_millis(config.monitor.request_timeout_ms),
    };
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut workers = spawn_pollers(Arc::clone(&state), poller_config, shutdown_rx);

    // The render/input loop blocks, so it gets its own thread while the
    // pollers run on the runtime.
    let mode = args.mode.into();
    let tick_ms = config.monitor.tick_ms;
    let dashboard_state = Arc::clone(&state);
    let dashboard = tokio::task::spawn_blocking(move || {
        Dashboard::new(mode, tick_ms).run(move || dashboard_state.snapshot())
    });
    dashboard.await??;

    // Quit key pressed: stop the workers and wait for them. Worst case this
    // takes one in-flight request timeout.
    shutdown_tx.send(true).ok();
    while workers.join_next().await.is_some() {}
    info!("clean shutdown");
    Ok(())
}
