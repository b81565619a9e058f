//! CLI argument definitions for the Treewatch binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Aligned, human-readable lines
    Human,
    /// One JSON object per line
    Json,
}

/// Treewatch path-observation driver
#[derive(Parser, Debug)]
#[command(name = "treewatch")]
#[command(about = "Treewatch: watch paths in a collaborative document tree")]
#[command(version)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human", env = "TREEWATCH_FORMAT")]
    pub format: Format,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a mutation script and print stream emissions
    Replay(ReplayArgs),
    /// Parse a path and print its segments
    Parse(ParseArgs),
}

/// Arguments for the replay command
#[derive(clap::Args, Debug)]
pub struct ReplayArgs {
    /// JSON file holding an array of operations
    pub script: PathBuf,

    /// Path to watch with distinct-until-changed semantics (repeatable)
    #[arg(short, long = "watch", value_name = "PATH")]
    pub watches: Vec<String>,

    /// Subtree pattern to watch for changes (repeatable)
    #[arg(short, long = "pattern", value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Name of the root map the script operates on
    #[arg(long, default_value = "root", env = "TREEWATCH_ROOT")]
    pub root: String,

    /// Print the final document after the replay
    #[arg(long)]
    pub dump: bool,
}

/// Arguments for the parse command
#[derive(clap::Args, Debug)]
pub struct ParseArgs {
    /// Path string, e.g. `pages.[0].title`
    pub path: String,
}
