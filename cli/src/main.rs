mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{bulk, inspect, search, select};
use tracing_subscriber::EnvFilter;

/// `-v` raises the default level; `RUST_LOG` wins when set.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);
    match &cli.command {
        Commands::Inspect(args) => inspect::run(&cli, args),
        Commands::Select(args) => select::run(&cli, args),
        Commands::Expand(args) => bulk::run(&cli, args, plzmap::BulkOperation::Expand),
        Commands::FillHoles(args) => bulk::run(&cli, args, plzmap::BulkOperation::FillHoles),
        Commands::Grow(args) => bulk::run(&cli, args, plzmap::BulkOperation::Grow),
        Commands::Search(args) => search::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
