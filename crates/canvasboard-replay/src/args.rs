//! Command-line argument definitions for the replay tool.

use clap::Parser;

/// Replay a scripted pointer scenario through the canvas engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the scenario file (JSON)
    #[arg(help = "Path to the scenario file")]
    pub scenario: String,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Pretty-print the final state
    #[arg(long)]
    pub pretty: bool,
}
