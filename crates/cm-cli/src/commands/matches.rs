//! Match command - test a host against the custom domain list

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::Path;

use super::{build_store, RuleArgs};

/// Match command arguments
#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Host to check
    pub host: String,

    #[command(flatten)]
    pub rules: RuleArgs,
}

/// Execute match command
pub fn execute(args: MatchArgs, config: Option<&Path>) -> Result<()> {
    let store = build_store(&args.rules, config)?;

    if store.matches_domain(&args.host) {
        println!("{} {} matches the custom domain list", "✓".green(), args.host.cyan());
    } else {
        println!("{} {} does not match the custom domain list", "✗".red(), args.host.cyan());
    }
    println!("  Domains: {}", store.count_domains());

    Ok(())
}
