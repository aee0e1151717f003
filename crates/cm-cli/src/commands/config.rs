//! Config command - configuration management

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use cm_core::config::Config;
use cm_core::RuleStore;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{config_candidates, load_config};

/// Config command arguments
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Config file to show (default: --config or search paths)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Generate an example configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "cookie-monster.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate a configuration file and the lists it references
    Validate {
        /// Config file to validate
        file: PathBuf,
    },

    /// Show config file locations
    Paths,
}

/// Execute config command
pub fn execute(args: ConfigArgs, config: Option<&Path>) -> Result<()> {
    match args.action {
        ConfigAction::Show { file } => show_config(file.as_deref().or(config)),
        ConfigAction::Generate { output, force } => generate_config(&output, force),
        ConfigAction::Validate { file } => validate_config(&file),
        ConfigAction::Paths => show_paths(),
    }
}

fn show_config(file: Option<&Path>) -> Result<()> {
    let config = load_config(file)?;
    let toml_str = config.to_toml().context("Failed to serialize config")?;
    println!("{}", toml_str);
    Ok(())
}

fn generate_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }

    let toml_str = Config::example()
        .to_toml()
        .context("Failed to serialize config")?;

    let content = format!(
        "# Cookie Monster configuration\n\
         # Rules listed here seed the filter at startup.\n\n\
         {}",
        toml_str
    );

    std::fs::write(output, content)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    info!("Generated config file: {:?}", output);
    println!("Configuration file generated: {}", output.display());

    Ok(())
}

fn validate_config(file: &Path) -> Result<()> {
    let config = Config::load(file)
        .with_context(|| format!("Failed to load config from {:?}", file))?;

    config.validate().context("Configuration validation failed")?;

    let store = RuleStore::from_config(&config.rules).context("Failed to load rule lists")?;

    println!("{} Configuration is valid", "✓".green());
    println!(
        "  Profile: {} (config version {})",
        config.general.name, config.general.version
    );
    println!("  Mode: {}", store.mode().display_name());
    println!("  Blocked cookies: {}", store.count_cookies());
    println!("  Custom domains: {}", store.count_domains());
    println!("  Log level: {}", config.logging.level);

    Ok(())
}

fn show_paths() -> Result<()> {
    println!("Configuration file search paths:");
    println!();

    for (index, path) in config_candidates().iter().enumerate() {
        let marker = if path.exists() {
            "(found)".green().to_string()
        } else {
            String::new()
        };
        println!("  {}. {} {}", index + 1, path.display(), marker);
    }

    Ok(())
}
