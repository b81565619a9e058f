use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;
mod script;

use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable. RUST_LOG, when
    // set, replaces the default filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("treewatch=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Replay(args) => commands::replay::run(args, cli.format),
        Commands::Parse(args) => commands::parse::run(args, cli.format),
    }
}
