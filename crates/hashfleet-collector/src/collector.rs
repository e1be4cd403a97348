//! Consolidation of the local miners' telemetry.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use hashfleet_core::{wire, CoreSpeed, HostSummary, TelemetryError};

const MAX_REPLY_BYTES: u64 = 4096;

/// Queries every locally configured miner endpoint and folds the replies
/// into one record per request kind.
///
/// An unreachable or garbage-producing endpoint is skipped for that
/// request; zero reachable endpoints still yields a valid zeroed record.
/// Offline detection is the monitor's job, not this component's.
#[derive(Debug, Clone)]
pub struct HostCollector {
    endpoints: Vec<String>,
    request_timeout: Duration,
}

impl HostCollector {
    /// Collector for miner APIs on the loopback interface.
    pub fn new(miner_ports: &[u16], request_timeout: Duration) -> Self {
        Self::with_endpoints(
            miner_ports
                .iter()
                .map(|port| format!("127.0.0.1:{port}"))
                .collect(),
            request_timeout,
        )
    }

    pub fn with_endpoints(endpoints: Vec<String>, request_timeout: Duration) -> Self {
        Self {
            endpoints,
            request_timeout,
        }
    }

    /// Consolidated summary across all reachable endpoints (sum the count
    /// fields, max the condition fields).
    pub async fn summary(&self) -> HostSummary {
        let mut readings = Vec::with_capacity(self.endpoints.len());
        for endpoint in &self.endpoints {
            match self.query(endpoint, b"summary").await {
                Ok(payload) => match wire::decode_summary(&payload) {
                    Ok(reading) => readings.push(reading),
                    Err(err) => debug!(endpoint = %endpoint, error = %err, "bad summary skipped"),
                },
                Err(err) => debug!(endpoint = %endpoint, error = %err, "endpoint skipped"),
            }
        }
        HostSummary::consolidate(&readings)
    }

    /// Per-core speeds across all reachable endpoints, concatenated and
    /// renumbered 0..n-1 in concatenation order. Indices reported by the
    /// miners are not trusted.
    pub async fn threads(&self) -> Vec<CoreSpeed> {
        let mut cores = Vec::new();
        for endpoint in &self.endpoints {
            match self.query(endpoint, b"threads").await {
                Ok(payload) => match wire::decode_threads(&payload) {
                    Ok(entries) => cores.extend(entries),
                    Err(err) => debug!(endpoint = %endpoint, error = %err, "bad threads skipped"),
                },
                Err(err) => debug!(endpoint = %endpoint, error = %err, "endpoint skipped"),
            }
        }
        for (index, core) in cores.iter_mut().enumerate() {
            core.core_index = index as u32;
        }
        cores
    }

    /// One endpoint query: connect, send, bounded receive, close. No
    /// connection reuse across cycles.
    async fn query(&self, endpoint: &str, request: &[u8]) -> Result<String, TelemetryError> {
        let exchange = async {
            let mut stream = TcpStream::connect(endpoint).await?;
            stream.write_all(request).await?;
            stream.shutdown().await?;

            let mut payload = String::new();
            stream
                .take(MAX_REPLY_BYTES)
                .read_to_string(&mut payload)
                .await?;
            Ok::<_, std::io::Error>(payload)
        };

        Ok(tokio::time::timeout(self.request_timeout, exchange)
            .await
            .map_err(|_| TelemetryError::Timeout(self.request_timeout))??)
    }
}
