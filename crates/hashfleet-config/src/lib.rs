//! Configuration management: optional TOML settings plus the host list.

mod settings;

pub use settings::{AppConfig, CollectorSettings, MonitorSettings};

use std::fs;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use thiserror::Error;

/// Fatal startup configuration failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("cannot read host list {path:?}: {source}")]
    HostList {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot determine home directory")]
    NoHomeDir,
}

/// Load configuration from an optional file and the environment.
///
/// Every field has a default, so a missing file is not an error.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(
            Environment::with_prefix("HASHFLEET")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}

/// Default host-list location: `~/.hashfleet_hosts`.
pub fn default_hosts_file() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".hashfleet_hosts"))
        .ok_or(ConfigError::NoHomeDir)
}

/// Where the monitor's file logs go: `~/.hashfleet/logs`.
pub fn default_log_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".hashfleet").join("logs"))
        .ok_or(ConfigError::NoHomeDir)
}

/// Read the newline-delimited host list, creating the file empty if absent.
///
/// Blank lines and `#` comments are skipped; order is preserved because it
/// is also the display order.
pub fn load_hosts(path: &Path) -> Result<Vec<String>, ConfigError> {
    let io_err = |source| ConfigError::HostList {
        path: path.to_path_buf(),
        source,
    };

    if !path.exists() {
        fs::write(path, "").map_err(io_err)?;
    }
    let contents = fs::read_to_string(path).map_err(io_err)?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_hosts_file_is_created_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts");

        let hosts = load_hosts(&path).unwrap();
        assert!(hosts.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn hosts_keep_file_order_and_skip_noise() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts");
        fs::write(&path, "# miners\nminer1\n\n  192.168.1.7  \nminer2\n").unwrap();

        let hosts = load_hosts(&path).unwrap();
        assert_eq!(hosts, vec!["miner1", "192.168.1.7", "miner2"]);
    }

    #[test]
    fn missing_settings_file_uses_defaults() {
        let cfg = load_config(Path::new("/nonexistent/hashfleet.toml")).unwrap();
        assert_eq!(cfg.collector.listen_port, 5048);
        assert_eq!(cfg.collector.miner_ports, vec![4048, 4049]);
        assert_eq!(cfg.monitor.poll_interval_ms, 1000);
        assert_eq!(cfg.monitor.tick_ms, 30);
    }
}
