//! Configuration structures.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub collector: CollectorSettings,
    #[serde(default)]
    pub monitor: MonitorSettings,
}

/// Collector daemon settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorSettings {
    /// Port the daemon answers monitor requests on.
    pub listen_port: u16,
    /// Local miner API ports to consolidate.
    pub miner_ports: Vec<u16>,
    /// Per-endpoint request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            listen_port: 5048,
            miner_ports: vec![4048, 4049],
            request_timeout_ms: 5000,
        }
    }
}

/// Monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Milliseconds between polls of each host.
    pub poll_interval_ms: u64,
    /// Per-request timeout against a host's collector, milliseconds.
    pub request_timeout_ms: u64,
    /// Dashboard frame/input tick, milliseconds.
    pub tick_ms: u64,
    /// Newline-delimited host list; defaults to ~/.hashfleet_hosts.
    pub hosts_file: Option<PathBuf>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            request_timeout_ms: 5000,
            tick_ms: 30,
            hosts_file: None,
        }
    }
}
