//! Cookie Monster CLI
//!
//! Builds a cookie filter from configuration and evaluates requests
//! against it.

mod args;
mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use args::Args;

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // [logging] from the config file applies unless overridden by flags
    let log_config = args.command.logging_config(args.config.as_deref());

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = logging::init(&args, &log_config)?;

    let result = run(args);

    if let Err(ref e) = result {
        error!("Fatal error: {:#}", e);
    }

    result
}

fn run(args: Args) -> Result<()> {
    let config = args.config.as_deref();

    match args.command {
        commands::Command::Check(check_args) => commands::check::execute(check_args, config),
        commands::Command::Replay(replay_args) => commands::replay::execute(replay_args, config),
        commands::Command::Match(match_args) => commands::matches::execute(match_args, config),
        commands::Command::Config(config_args) => commands::config::execute(config_args, config),
        commands::Command::Completions(comp_args) => commands::completions::execute(comp_args),
    }
}
