//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Simulated service harness CLI
#[derive(Debug, Parser)]
#[command(name = "simharness-cli")]
#[command(author, version, about = "Inspect and call simulated services", long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (default: ./simharness.toml if present)
    #[arg(short, long, env = "SIMHARNESS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List registered services and their active mutations
    Services,

    /// List the operations a service currently exposes
    Operations {
        service: String,

        /// Activate this mutation first
        #[arg(short, long)]
        mutation: Option<String>,
    },

    /// Call an operation and print its outcome
    ///
    /// Example: simharness-cli call calendar create_event --args '{"summary": "x", ...}'
    Call {
        service: String,
        operation: String,

        /// Keyword arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,

        /// Activate this mutation first
        #[arg(short, long)]
        mutation: Option<String>,

        /// Load the service's fixture store from this JSON file first
        #[arg(long)]
        state: Option<PathBuf>,

        /// Call this many times
        #[arg(short, long, default_value_t = 1)]
        repeat: u32,

        /// Append fault injection statistics
        #[arg(long)]
        stats: bool,
    },

    /// Show the effective error reporting mode
    Mode,

    /// Show the fault injection rules of a service
    Rules { service: String },
}

/// Determine log filter level from verbosity count
pub const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
