//! Per-host poll workers.
//!
//! One long-lived task per configured host, each owning exactly one
//! FleetState slot. A slow or dead host never blocks any other: every
//! network step runs under this worker's timeout and failures only touch
//! the owned slot.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use hashfleet_core::{wire, HostSummary, TelemetryError};

use crate::state::FleetState;

/// Replies larger than this are cut off; a summary line is a few hundred
/// bytes.
const MAX_REPLY_BYTES: u64 = 4096;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Port each host's collector daemon listens on.
    pub collector_port: u16,
    /// Cadence between polls, fixed regardless of consecutive failures.
    pub poll_interval: Duration,
    /// Bound on one connect/send/receive round trip.
    pub request_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            collector_port: 5048,
            poll_interval: Duration::from_secs(1),
            request_timeout: Duration::from_millis(5000),
        }
    }
}

/// Spawn one worker per host in the table. Workers run until the shutdown
/// flag flips; drain the returned set to wait for them.
pub fn spawn_pollers(
    state: Arc<FleetState>,
    config: PollerConfig,
    shutdown: watch::Receiver<bool>,
) -> JoinSet<()> {
    let mut workers = JoinSet::new();
    let hosts: Vec<String> = state.hosts().map(String::from).collect();
    for (index, host) in hosts.into_iter().enumerate() {
        workers.spawn(run_poller(
            Arc::clone(&state),
            index,
            host,
            config.clone(),
            shutdown.clone(),
        ));
    }
    workers
}

/// One worker's loop: poll, commit or mark offline, sleep, repeat.
///
/// The shutdown flag is observed at loop top, so worst-case shutdown
/// latency is one in-flight request timeout.
pub async fn run_poller(
    state: Arc<FleetState>,
    index: usize,
    host: String,
    config: PollerConfig,
    mut shutdown: watch::Receiver<bool>,
) {
    let addr = format!("{}:{}", host, config.collector_port);
    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => {}
        }
        if *shutdown.borrow() {
            break;
        }

        match fetch_summary(&addr, config.request_timeout).await {
            Ok(summary) => {
                if !state.commit(index, summary) {
                    info!(host = %host, "host online");
                }
            }
            Err(err) => {
                debug!(host = %host, error = %err, "poll failed");
                if state.mark_offline(index) {
                    info!(host = %host, "host offline");
                }
            }
        }
    }
    debug!(host = %host, "poller stopped");
}

/// One summary request: connect, send, bounded receive, decode. The
/// connection is per-operation; on any failure it is simply dropped and the
/// next cycle dials fresh.
pub async fn fetch_summary(addr: &str, timeout: Duration) -> Result<HostSummary, TelemetryError> {
    let payload = tokio::time::timeout(timeout, request(addr, b"summary"))
        .await
        .map_err(|_| TelemetryError::Timeout(timeout))??;
    let reading = wire::decode_summary(&payload)?;
    Ok(HostSummary::from(reading))
}

async fn request(addr: &str, request: &[u8]) -> Result<String, std::io::Error> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(request).await?;
    stream.shutdown().await?;

    let mut payload = String::new();
    stream
        .take(MAX_REPLY_BYTES)
        .read_to_string(&mut payload)
        .await?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashfleet_core::RawReading;
    use tokio::net::TcpListener;

    fn reading(cpus: u32, khps: f64) -> RawReading {
        RawReading {
            name: "cpuminer".into(),
            cpu_count: cpus,
            hash_rate_khps: khps,
            accepted_shares: 10,
            ..RawReading::default()
        }
    }

    /// A collector that answers every connection with a fixed payload.
    async fn fake_collector(reply: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 64];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(reply.as_bytes()).await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn fetch_summary_decodes_a_live_host() {
        let addr = fake_collector(wire::encode_summary(&reading(2, 1.0))).await;

        let summary = fetch_summary(&addr, Duration::from_secs(1)).await.unwrap();
        assert_eq!(summary.cpu_count, 2);
        assert!((summary.hash_rate_khps - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        // Bind then drop to get a port nobody is listening on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = fetch_summary(&addr, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, TelemetryError::Transport(_)));
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        // Accepts but never replies.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let err = fetch_summary(&addr, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, TelemetryError::Timeout(_)));
    }

    #[tokio::test]
    async fn malformed_reply_is_telemetry_not_a_crash() {
        let addr = fake_collector("NAME=cpuminer;VER=1.3".into()).await;

        let err = fetch_summary(&addr, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, TelemetryError::Malformed(_)));
    }

    #[tokio::test]
    async fn one_bad_host_leaves_the_rest_alone() {
        // Scenario C: h2 produces garbage; only h2 goes offline.
        let good = fake_collector(wire::encode_summary(&reading(2, 1.0))).await;
        let bad = fake_collector("garbage".into()).await;
        let state = Arc::new(FleetState::new(vec!["h1".into(), "h2".into()]));

        match fetch_summary(&good, Duration::from_secs(1)).await {
            Ok(summary) => {
                state.commit(0, summary);
            }
            Err(_) => {
                state.mark_offline(0);
            }
        }
        match fetch_summary(&bad, Duration::from_secs(1)).await {
            Ok(summary) => {
                state.commit(1, summary);
            }
            Err(_) => {
                state.mark_offline(1);
            }
        }

        let rows = state.snapshot();
        assert!(rows[0].status.online);
        assert!(!rows[1].status.online);
    }

    #[tokio::test]
    async fn worker_recovers_on_the_cycle_after_a_failure() {
        let state = Arc::new(FleetState::new(vec!["h1".into()]));
        let reply = wire::encode_summary(&reading(2, 1.0));

        // cycle k: nobody listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        assert!(fetch_summary(&addr, Duration::from_millis(200)).await.is_err());
        state.mark_offline(0);

        // cycle k+1: collector is back
        let addr = fake_collector(reply).await;
        let summary = fetch_summary(&addr, Duration::from_secs(1)).await.unwrap();
        assert!(!state.commit(0, summary));
        assert!(state.snapshot()[0].status.online);
    }

    #[tokio::test]
    async fn workers_exit_on_shutdown() {
        let state = Arc::new(FleetState::new(vec!["h1".into(), "h2".into()]));
        let config = PollerConfig {
            poll_interval: Duration::from_millis(10),
            request_timeout: Duration::from_millis(50),
            ..PollerConfig::default()
        };
        let (tx, rx) = watch::channel(false);
        let mut workers = spawn_pollers(Arc::clone(&state), config, rx);

        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();
        while workers.join_next().await.is_some() {}
    }
}
