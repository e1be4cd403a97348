//! Telemetry records and per-host status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One local miner process's telemetry, immutable once parsed.
///
/// Field order matches the wire format in [`crate::wire`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawReading {
    pub name: String,
    pub version: String,
    pub api_version: String,
    pub algorithm: String,
    pub cpu_count: u32,
    pub hash_rate_khps: f64,
    pub solved_blocks: u64,
    pub accepted_shares: u64,
    pub rejected_shares: u64,
    pub accepted_per_minute: f64,
    pub difficulty: f64,
    pub cpu_temp_c: f64,
    pub cpu_fan_rpm: u32,
    pub cpu_freq_mhz: u32,
    pub uptime_sec: u64,
    pub timestamp_sec: u64,
}

/// Consolidation of all local readings on one host.
///
/// Count-like fields sum across readings; condition-like fields take the
/// max. Identity strings come from the first reading.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HostSummary {
    pub name: String,
    pub version: String,
    pub api_version: String,
    pub algorithm: String,
    pub cpu_count: u32,
    pub hash_rate_khps: f64,
    pub solved_blocks: u64,
    pub accepted_shares: u64,
    pub rejected_shares: u64,
    pub accepted_per_minute: f64,
    pub difficulty: f64,
    pub cpu_temp_c: f64,
    pub cpu_fan_rpm: u32,
    pub cpu_freq_mhz: u32,
    pub uptime_sec: u64,
    pub timestamp_sec: u64,
}

impl HostSummary {
    /// Fold any number of readings into one summary.
    ///
    /// Zero readings is not an error: the result is a valid zeroed record.
    /// Whether that means "offline" is the caller's call.
    pub fn consolidate(readings: &[RawReading]) -> Self {
        let mut summary = Self::default();
        for (i, r) in readings.iter().enumerate() {
            if i == 0 {
                summary.name = r.name.clone();
                summary.version = r.version.clone();
                summary.api_version = r.api_version.clone();
                summary.algorithm = r.algorithm.clone();
            }
            summary.cpu_count += r.cpu_count;
            summary.hash_rate_khps += r.hash_rate_khps;
            summary.solved_blocks += r.solved_blocks;
            summary.accepted_shares += r.accepted_shares;
            summary.rejected_shares += r.rejected_shares;
            summary.accepted_per_minute += r.accepted_per_minute;
            summary.difficulty = summary.difficulty.max(r.difficulty);
            summary.cpu_temp_c = summary.cpu_temp_c.max(r.cpu_temp_c);
            summary.cpu_fan_rpm = summary.cpu_fan_rpm.max(r.cpu_fan_rpm);
            summary.cpu_freq_mhz = summary.cpu_freq_mhz.max(r.cpu_freq_mhz);
            summary.uptime_sec = summary.uptime_sec.max(r.uptime_sec);
            summary.timestamp_sec = summary.timestamp_sec.max(r.timestamp_sec);
        }
        summary
    }

    /// Share acceptance percentage. The denominator is floored to 1, so a
    /// host with no shares yet reports 0 rather than NaN.
    pub fn accept_percent(&self) -> f64 {
        let total = (self.accepted_shares + self.rejected_shares).max(1);
        self.accepted_shares as f64 / total as f64 * 100.0
    }

    /// Hashes per minute (khps × 1000 × 60), the unit the dashboard shows.
    pub fn hashes_per_minute(&self) -> f64 {
        self.hash_rate_khps * 1000.0 * 60.0
    }

    /// Re-shape as a reading so the wire codec can carry a consolidated
    /// record back to a requester.
    pub fn as_reading(&self) -> RawReading {
        RawReading {
            name: self.name.clone(),
            version: self.version.clone(),
            api_version: self.api_version.clone(),
            algorithm: self.algorithm.clone(),
            cpu_count: self.cpu_count,
            hash_rate_khps: self.hash_rate_khps,
            solved_blocks: self.solved_blocks,
            accepted_shares: self.accepted_shares,
            rejected_shares: self.rejected_shares,
            accepted_per_minute: self.accepted_per_minute,
            difficulty: self.difficulty,
            cpu_temp_c: self.cpu_temp_c,
            cpu_fan_rpm: self.cpu_fan_rpm,
            cpu_freq_mhz: self.cpu_freq_mhz,
            uptime_sec: self.uptime_sec,
            timestamp_sec: self.timestamp_sec,
        }
    }
}

impl From<RawReading> for HostSummary {
    fn from(r: RawReading) -> Self {
        Self::consolidate(std::slice::from_ref(&r))
    }
}

/// Per-core hash rate. Core indices are renumbered 0..n-1 at consolidation;
/// indices reported by the miners themselves are never trusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoreSpeed {
    pub core_index: u32,
    pub hash_rate_khps: f64,
}

/// What the dashboard knows about one host. Written by exactly one poll
/// worker; read by the renderer.
#[derive(Debug, Clone, Default)]
pub struct HostStatus {
    pub online: bool,
    pub summary: Option<HostSummary>,
    pub last_seen: Option<DateTime<Utc>>,
}

/// Which column set the dashboard tracks and shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MiningMode {
    /// Shares and acceptance rate matter.
    #[default]
    Pool,
    /// Solved blocks matter.
    Solo,
}
