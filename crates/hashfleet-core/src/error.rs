//! Error types for the fleet monitor.

use std::time::Duration;
use thiserror::Error;

/// Decode failures for the miner wire format.
///
/// Never fatal: callers treat a malformed payload exactly like a transport
/// failure for that cycle.
#[derive(Error, Debug)]
pub enum WireError {
    #[error("summary has {found} fields, expected {expected}")]
    MissingFields { expected: usize, found: usize },

    #[error("field {index} has no '=' separator: {entry:?}")]
    MissingSeparator { index: usize, entry: String },

    #[error("field {index} ({name}) does not parse: {value:?}")]
    InvalidNumber {
        index: usize,
        name: &'static str,
        value: String,
    },

    #[error("thread group does not match CPU=<idx>;KHS=<rate>: {group:?}")]
    InvalidThreadGroup { group: String },

    #[error("empty payload")]
    Empty,
}

/// One cycle's failure to obtain telemetry from a peer.
///
/// A garbage-producing peer is operationally equivalent to an unreachable
/// one, so malformed payloads live in the same enum as transport errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed telemetry: {0}")]
    Malformed(#[from] WireError),
}
