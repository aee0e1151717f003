//! CLI commands

pub mod check;
pub mod completions;
pub mod config;
pub mod matches;
pub mod replay;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use cm_core::config::{Config, LoggingConfig, RulesConfig};
use cm_core::filter::{FilterMode, RuleStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate one request against the cookie filter
    Check(check::CheckArgs),

    /// Evaluate a JSON-lines file of requests on worker threads
    Replay(replay::ReplayArgs),

    /// Check whether a host matches the custom domain list
    #[command(name = "match")]
    Match(matches::MatchArgs),

    /// Configuration management
    Config(config::ConfigArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Rule overrides shared by commands that build a filter
#[derive(Args, Debug, Default)]
pub struct RuleArgs {
    /// Block a cookie name (repeatable)
    #[arg(short = 'b', long = "block", value_name = "NAME")]
    pub blocks: Vec<String>,

    /// Add a custom domain (repeatable)
    #[arg(short = 'd', long = "domain", value_name = "DOMAIN")]
    pub domains: Vec<String>,

    /// Filter mode: all-domains, in-scope-only or custom-domains
    #[arg(short = 'm', long, value_parser = parse_mode)]
    pub mode: Option<FilterMode>,

    /// Ignore configuration files and start from an empty rule set
    #[arg(long)]
    pub no_config: bool,
}

fn parse_mode(value: &str) -> std::result::Result<FilterMode, String> {
    value.parse::<FilterMode>().map_err(|e| e.to_string())
}

impl Command {
    /// Logging settings from the configuration file this command would read
    ///
    /// Read before logging is set up, so a missing or broken file falls back
    /// to defaults here and is reported once the command loads it itself.
    pub fn logging_config(&self, config_path: Option<&Path>) -> LoggingConfig {
        let no_config = match self {
            Command::Check(args) => args.rules.no_config,
            Command::Replay(args) => args.rules.no_config,
            Command::Match(args) => args.rules.no_config,
            Command::Config(_) => false,
            Command::Completions(_) => true,
        };

        if no_config {
            return LoggingConfig::default();
        }

        read_config(config_path)
            .map(|config| config.logging)
            .unwrap_or_default()
    }
}

impl RuleArgs {
    /// Merge the command-line overrides into the `[rules]` section
    pub fn apply(&self, rules: &mut RulesConfig) {
        rules.cookies.extend(self.blocks.iter().cloned());
        rules.domains.extend(self.domains.iter().cloned());
        if let Some(mode) = self.mode {
            rules.mode = mode;
        }
    }
}

/// Build the rule store from configuration plus command-line overrides
///
/// Validation runs on the merged rules, so flags can complete a config
/// file (e.g. `--domain` for a `custom-domains` profile with no domains).
pub fn build_store(rules: &RuleArgs, config_path: Option<&Path>) -> Result<Arc<RuleStore>> {
    let mut config = if rules.no_config {
        Config::default()
    } else {
        read_config(config_path)?
    };

    rules.apply(&mut config.rules);
    config.validate().context("Invalid filter rules")?;

    let store = RuleStore::from_config(&config.rules).context("Failed to build rule store")?;
    Ok(Arc::new(store))
}

/// Load and validate the explicit config file, the first one found, or defaults
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = read_config(config_path)?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Read the explicit config file, the first one found, or defaults
fn read_config(config_path: Option<&Path>) -> Result<Config> {
    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    let Some(path) = path else {
        debug!("No configuration file found, using defaults");
        return Ok(Config::default());
    };

    let config = Config::load(&path)
        .with_context(|| format!("Failed to load config from {:?}", path))?;
    debug!("Loaded configuration from {:?}", path);

    Ok(config)
}

/// Configuration file search paths, in priority order
pub fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![
        PathBuf::from("cookie-monster.toml"),
        PathBuf::from("config.toml"),
    ];

    if let Some(dirs) = directories::ProjectDirs::from("", "", "cookie-monster") {
        candidates.push(dirs.config_dir().join("config.toml"));
    }

    candidates
}

fn find_config_file() -> Option<PathBuf> {
    config_candidates().into_iter().find(|path| path.exists())
}
