//! Fleet monitor CLI application.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = cli.log_level.as_str();

    match cli.command {
        Commands::Monitor(args) => cli::commands::monitor::run(args, &cli.config, log_level).await,
        Commands::Collector => cli::commands::collector::run(&cli.config, log_level).await,
    }
}
