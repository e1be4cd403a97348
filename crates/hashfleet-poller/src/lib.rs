//! Fleet polling: the shared status table, its rollups, and the per-host
//! workers that keep it current.

pub mod poller;
pub mod state;

pub use poller::{fetch_summary, run_poller, spawn_pollers, PollerConfig};
pub use state::{FleetState, FleetTotals, HostRow};
