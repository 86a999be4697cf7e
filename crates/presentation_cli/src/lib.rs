//! Simulated service harness CLI
//!
//! Command-line interface for listing, inspecting and calling simulated
//! service operations.

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, log_filter_from_verbosity};
pub use commands::run;
