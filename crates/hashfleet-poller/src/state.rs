//! The shared status table and its on-demand rollups.

use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use hashfleet_core::{HostStatus, HostSummary};

/// One host's slot: the name never changes, only the status behind the lock.
struct HostSlot {
    host: String,
    status: RwLock<HostStatus>,
}

/// host → status, fixed at startup in configuration order (also the display
/// order), never resized.
///
/// Exactly one poll worker writes a given slot; the renderer only reads.
/// Each slot carries its own lock, so there is no fleet-wide lock and a
/// write to one host never contends with reads of another.
pub struct FleetState {
    slots: Vec<HostSlot>,
}

/// A renderer-side copy of one host's slot.
#[derive(Debug, Clone)]
pub struct HostRow {
    pub host: String,
    pub status: HostStatus,
}

impl FleetState {
    /// Build the table from the configured host list. Every host starts
    /// offline until its worker's first successful read.
    pub fn new(hosts: Vec<String>) -> Self {
        Self {
            slots: hosts
                .into_iter()
                .map(|host| HostSlot {
                    host,
                    status: RwLock::new(HostStatus::default()),
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.host.as_str())
    }

    /// Record a successful read. Returns whether the host was online before,
    /// so the worker can log the transition.
    pub fn commit(&self, index: usize, summary: HostSummary) -> bool {
        let mut status = self.write_slot(index);
        let was_online = status.online;
        status.online = true;
        status.summary = Some(summary);
        status.last_seen = Some(Utc::now());
        was_online
    }

    /// Record a failed read. The last summary is kept for the transition
    /// log but the renderer only trusts it while `online` is set.
    pub fn mark_offline(&self, index: usize) -> bool {
        let mut status = self.write_slot(index);
        let was_online = status.online;
        status.online = false;
        was_online
    }

    /// Clone every slot in display order.
    pub fn snapshot(&self) -> Vec<HostRow> {
        self.slots
            .iter()
            .map(|slot| HostRow {
                host: slot.host.clone(),
                status: slot
                    .status
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone(),
            })
            .collect()
    }

    fn write_slot(&self, index: usize) -> std::sync::RwLockWriteGuard<'_, HostStatus> {
        self.slots[index]
            .status
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fleet-wide totals and averages over currently-online hosts.
///
/// Recomputed from a snapshot on every render frame, never cached, so a
/// status change is visible on the very next frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetTotals {
    pub online_hosts: usize,
    pub total_hashes_per_minute: f64,
    pub total_accepted_per_minute: f64,
    pub total_solved_blocks: u64,
    pub total_cpu_count: u64,
    pub avg_hashes_per_minute: f64,
    pub avg_solved_blocks: f64,
    pub avg_accept_percent: f64,
    pub avg_accepted_per_minute: f64,
    pub avg_difficulty: f64,
    pub avg_cpu_count: f64,
    pub avg_cpu_temp_c: f64,
}

impl FleetTotals {
    pub fn compute(rows: &[HostRow]) -> Self {
        let mut totals = Self::default();
        let mut sum_percent = 0.0;
        let mut sum_difficulty = 0.0;
        let mut sum_temp = 0.0;

        for row in rows {
            if !row.status.online {
                continue;
            }
            let Some(summary) = &row.status.summary else {
                continue;
            };
            totals.online_hosts += 1;
            totals.total_hashes_per_minute += summary.hashes_per_minute();
            totals.total_accepted_per_minute += summary.accepted_per_minute;
            totals.total_solved_blocks += summary.solved_blocks;
            totals.total_cpu_count += u64::from(summary.cpu_count);
            sum_percent += summary.accept_percent();
            sum_difficulty += summary.difficulty;
            sum_temp += summary.cpu_temp_c;
        }

        // Zero online hosts clamps every denominator to 1: averages report
        // 0 rather than erroring.
        let denom = totals.online_hosts.max(1) as f64;
        totals.avg_hashes_per_minute = totals.total_hashes_per_minute / denom;
        totals.avg_solved_blocks = totals.total_solved_blocks as f64 / denom;
        totals.avg_accept_percent = sum_percent / denom;
        totals.avg_accepted_per_minute = totals.total_accepted_per_minute / denom;
        totals.avg_difficulty = sum_difficulty / denom;
        totals.avg_cpu_count = totals.total_cpu_count as f64 / denom;
        totals.avg_cpu_temp_c = sum_temp / denom;
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(cpus: u32, khps: f64) -> HostSummary {
        HostSummary {
            cpu_count: cpus,
            hash_rate_khps: khps,
            solved_blocks: 1,
            accepted_shares: 90,
            rejected_shares: 10,
            accepted_per_minute: 1.5,
            difficulty: 0.04,
            cpu_temp_c: 60.0,
            ..HostSummary::default()
        }
    }

    #[test]
    fn hosts_start_offline_in_configuration_order() {
        let state = FleetState::new(vec!["h1".into(), "h2".into(), "h3".into()]);
        let rows = state.snapshot();
        assert_eq!(
            rows.iter().map(|r| r.host.as_str()).collect::<Vec<_>>(),
            vec!["h1", "h2", "h3"]
        );
        assert!(rows.iter().all(|r| !r.status.online));
        assert!(rows.iter().all(|r| r.status.last_seen.is_none()));
    }

    #[test]
    fn offline_to_online_transitions_are_reported_once() {
        let state = FleetState::new(vec!["h1".into()]);

        // cycle k fails, k+1 succeeds, k+2 succeeds again
        assert!(!state.mark_offline(0));
        assert!(!state.commit(0, summary(2, 1.0)));
        assert!(state.commit(0, summary(2, 1.1)));
        assert!(state.snapshot()[0].status.online);

        // any failure flips straight back
        assert!(state.mark_offline(0));
        assert!(!state.snapshot()[0].status.online);
    }

    #[test]
    fn totals_over_zero_online_hosts_are_all_zero() {
        let state = FleetState::new(vec!["h1".into(), "h2".into()]);
        let totals = FleetTotals::compute(&state.snapshot());
        assert_eq!(totals, FleetTotals::default());
    }

    #[test]
    fn totals_skip_offline_hosts() {
        // Scenario A: h1 reports, h2 never does.
        let state = FleetState::new(vec!["h1".into(), "h2".into()]);
        state.commit(0, summary(2, 1.0));
        state.mark_offline(1);

        let rows = state.snapshot();
        assert!(rows[0].status.online);
        assert!(!rows[1].status.online);

        let totals = FleetTotals::compute(&rows);
        assert_eq!(totals.online_hosts, 1);
        assert_eq!(totals.total_cpu_count, 2);
        assert!((totals.total_hashes_per_minute - 60_000.0).abs() < 1e-6);
    }

    #[test]
    fn fleet_hash_rate_sums_and_averages() {
        // Scenario B: khps 2.0 and 4.0 across two hosts.
        let state = FleetState::new(vec!["h1".into(), "h2".into()]);
        state.commit(0, summary(2, 2.0));
        state.commit(1, summary(2, 4.0));

        let totals = FleetTotals::compute(&state.snapshot());
        assert!((totals.total_hashes_per_minute - 360_000.0).abs() < 1e-6);
        assert!((totals.avg_hashes_per_minute - 180_000.0).abs() < 1e-6);
        assert!((totals.avg_accept_percent - 90.0).abs() < 1e-6);
        assert!((totals.avg_difficulty - 0.04).abs() < 1e-6);
    }

    #[test]
    fn stale_summary_is_not_counted_while_offline() {
        let state = FleetState::new(vec!["h1".into()]);
        state.commit(0, summary(2, 2.0));
        state.mark_offline(0);

        let totals = FleetTotals::compute(&state.snapshot());
        assert_eq!(totals.online_hosts, 0);
        assert_eq!(totals.total_hashes_per_minute, 0.0);
    }
}
