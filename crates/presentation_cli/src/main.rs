//! simharness-cli entry point

#![allow(clippy::print_stdout)]

use clap::Parser;
use infrastructure::{AppConfig, init_tracing};
use presentation_cli::{Cli, log_filter_from_verbosity, run};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(cli.config.as_deref())?;
    config.telemetry.log_filter = log_filter_from_verbosity(cli.verbose).to_string();
    init_tracing(&config.telemetry)?;

    let output = run(&cli.command, &config)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
