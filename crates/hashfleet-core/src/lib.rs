//! Core types and wire codec for the fleet monitor.
//!
//! This crate provides the foundational building blocks including:
//! - Telemetry records (RawReading, HostSummary, CoreSpeed)
//! - Per-host status as seen by the dashboard
//! - The semicolon-delimited text codec spoken by miners and collectors
//! - Shared error types

pub mod error;
pub mod types;
pub mod wire;

pub use error::{TelemetryError, WireError};
pub use types::*;
