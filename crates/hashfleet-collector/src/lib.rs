//! Per-host responder: consolidates the local miners' telemetry and
//! answers monitor requests on a fixed port.

pub mod collector;
pub mod server;

pub use collector::HostCollector;
pub use server::Server;
