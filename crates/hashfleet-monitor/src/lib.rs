//! Terminal dashboard and logging setup for the fleet monitor.

pub mod dashboard;
pub mod logging;

pub use dashboard::Dashboard;
pub use logging::{setup_file_logging, setup_logging};
