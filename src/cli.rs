//! Command-line interface for matchroom.

use clap::{Parser, Subcommand};

/// Matchroom - server-authoritative engine for turn-based game sessions
#[derive(Parser, Debug)]
#[command(name = "matchroom")]
#[command(about = "Session engine for turn-based games", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file (defaults apply when absent)
    #[arg(short, long)]
    pub config: Option<std::path::PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play one scripted Nim match end to end, printing every broadcast event
    Demo {
        /// Pile size for the demo match
        #[arg(long, default_value = "5")]
        pile: u32,
    },

    /// Drive many concurrent random matches through one engine
    Simulate {
        /// Number of matches to play
        #[arg(short, long, default_value = "16")]
        matches: usize,

        /// Seed for reproducible play
        #[arg(long)]
        seed: Option<u64>,

        /// Directory to persist session documents into (in-memory if omitted)
        #[arg(long)]
        store_dir: Option<std::path::PathBuf>,
    },
}
