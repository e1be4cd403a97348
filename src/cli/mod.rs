//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use hashfleet_core::MiningMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hashfleet")]
#[command(author, version, about = "LAN mining-fleet monitor")]
pub struct Cli {
    /// Optional settings file path
    #[arg(short, long, default_value = "config/hashfleet.toml")]
    pub config: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch the fleet in a live terminal dashboard
    Monitor(MonitorArgs),
    /// Consolidate local miner telemetry and answer monitor requests
    Collector,
}

#[derive(clap::Args)]
pub struct MonitorArgs {
    /// Column set to track: pool shows shares, solo shows blocks
    #[arg(short, long, value_enum, default_value_t = Mode::Pool)]
    pub mode: Mode,

    /// Host list file (newline-delimited, created empty if absent)
    #[arg(long)]
    pub hosts_file: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Mode {
    Pool,
    Solo,
}

impl From<Mode> for MiningMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Pool => MiningMode::Pool,
            Mode::Solo => MiningMode::Solo,
        }
    }
}
