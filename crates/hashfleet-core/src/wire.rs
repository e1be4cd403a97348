//! The flat text protocol spoken by miners and collectors.
//!
//! A summary is semicolon-delimited `key=value` text with a fixed field
//! order; values are addressed by position and the key text is not
//! interpreted. A threads payload groups `CPU=<idx>;KHS=<rate>` entries with
//! a `|` separator.

use std::str::FromStr;

use crate::error::WireError;
use crate::types::{CoreSpeed, RawReading};

/// Fields in a summary payload, in wire order.
pub const SUMMARY_FIELDS: usize = 16;

const FIELD_NAMES: [&str; SUMMARY_FIELDS] = [
    "name",
    "version",
    "api_version",
    "algorithm",
    "cpu_count",
    "hash_rate_khps",
    "solved_blocks",
    "accepted_shares",
    "rejected_shares",
    "accepted_per_minute",
    "difficulty",
    "cpu_temp_c",
    "cpu_fan_rpm",
    "cpu_freq_mhz",
    "uptime_sec",
    "timestamp_sec",
];

/// Encode a summary record in wire order, cpuminer key spelling.
pub fn encode_summary(r: &RawReading) -> String {
    format!(
        "NAME={};VER={};API={};ALGO={};CPUS={};KHS={};SOLV={};ACC={};REJ={};\
         ACCMN={};DIFF={};TEMP={};FAN={};FREQ={};UPTIME={};TS={}|",
        r.name,
        r.version,
        r.api_version,
        r.algorithm,
        r.cpu_count,
        r.hash_rate_khps,
        r.solved_blocks,
        r.accepted_shares,
        r.rejected_shares,
        r.accepted_per_minute,
        r.difficulty,
        r.cpu_temp_c,
        r.cpu_fan_rpm,
        r.cpu_freq_mhz,
        r.uptime_sec,
        r.timestamp_sec,
    )
}

/// Decode a summary payload. Anything after the first `|` is ignored.
pub fn decode_summary(payload: &str) -> Result<RawReading, WireError> {
    let summary = payload.split('|').next().unwrap_or("");
    if summary.trim().is_empty() {
        return Err(WireError::Empty);
    }

    let entries: Vec<&str> = summary.split(';').collect();
    if entries.len() < SUMMARY_FIELDS {
        return Err(WireError::MissingFields {
            expected: SUMMARY_FIELDS,
            found: entries.len(),
        });
    }

    Ok(RawReading {
        name: value(&entries, 0)?.to_string(),
        version: value(&entries, 1)?.to_string(),
        api_version: value(&entries, 2)?.to_string(),
        algorithm: value(&entries, 3)?.to_string(),
        cpu_count: parse(&entries, 4)?,
        hash_rate_khps: parse(&entries, 5)?,
        solved_blocks: parse(&entries, 6)?,
        accepted_shares: parse(&entries, 7)?,
        rejected_shares: parse(&entries, 8)?,
        accepted_per_minute: parse(&entries, 9)?,
        difficulty: parse(&entries, 10)?,
        cpu_temp_c: parse(&entries, 11)?,
        cpu_fan_rpm: parse(&entries, 12)?,
        cpu_freq_mhz: parse(&entries, 13)?,
        uptime_sec: parse(&entries, 14)?,
        timestamp_sec: parse(&entries, 15)?,
    })
}

/// Encode per-core speeds as pipe-separated groups.
pub fn encode_threads(cores: &[CoreSpeed]) -> String {
    cores
        .iter()
        .map(|c| format!("CPU={};KHS={}", c.core_index, c.hash_rate_khps))
        .collect::<Vec<_>>()
        .join("|")
}

/// Decode a threads payload in payload order.
///
/// Core indices are returned as reported; callers renumber. Empty groups
/// (a trailing `|`) are skipped, a fully empty payload is an error.
pub fn decode_threads(payload: &str) -> Result<Vec<CoreSpeed>, WireError> {
    if payload.trim().is_empty() {
        return Err(WireError::Empty);
    }

    let mut cores = Vec::new();
    for group in payload.split('|') {
        let group = group.trim();
        if group.is_empty() {
            continue;
        }
        cores.push(decode_thread_group(group)?);
    }
    Ok(cores)
}

fn decode_thread_group(group: &str) -> Result<CoreSpeed, WireError> {
    let bad = || WireError::InvalidThreadGroup {
        group: group.to_string(),
    };

    let (idx_entry, rate_entry) = group.split_once(';').ok_or_else(bad)?;
    let (_, idx) = idx_entry.split_once('=').ok_or_else(bad)?;
    let (_, rate) = rate_entry.split_once('=').ok_or_else(bad)?;

    Ok(CoreSpeed {
        core_index: idx.trim().parse().map_err(|_| bad())?,
        hash_rate_khps: rate.trim().parse().map_err(|_| bad())?,
    })
}

fn value<'a>(entries: &[&'a str], index: usize) -> Result<&'a str, WireError> {
    entries[index]
        .split_once('=')
        .map(|(_, v)| v.trim())
        .ok_or_else(|| WireError::MissingSeparator {
            index,
            entry: entries[index].to_string(),
        })
}

fn parse<T: FromStr>(entries: &[&str], index: usize) -> Result<T, WireError> {
    let v = value(entries, index)?;
    v.parse().map_err(|_| WireError::InvalidNumber {
        index,
        name: FIELD_NAMES[index],
        value: v.to_string(),
    })
}
