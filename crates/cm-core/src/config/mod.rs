//! Configuration management for Cookie Monster
//!
//! A TOML file seeds the rule store and logging at startup. The file is
//! only ever read by the filter; rules edited at runtime are not written
//! back.

use crate::error::{Error, Result};
use crate::filter::{validate_domain, FilterMode};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General application settings
    pub general: GeneralConfig,

    /// Initial filter rules
    pub rules: RulesConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| Error::ConfigNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(Error::from)
    }

    /// Example configuration with a typical tracking-cookie blocklist
    pub fn example() -> Self {
        Self {
            rules: RulesConfig {
                mode: FilterMode::AllDomains,
                cookies: ["_ga", "_gid", "_fbp", "_hjSessionUser"]
                    .iter()
                    .map(|name| name.to_string())
                    .collect(),
                domains: vec!["example.com".to_string()],
                ..RulesConfig::default()
            },
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (index, name) in self.rules.cookies.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(Error::config_value(
                    format!("rules.cookies[{index}]"),
                    "Cookie name must not be empty",
                ));
            }
        }

        for (index, domain) in self.rules.domains.iter().enumerate() {
            validate_domain(domain)
                .map_err(|e| Error::config_value(format!("rules.domains[{index}]"), e.to_string()))?;
        }

        if self.rules.mode == FilterMode::CustomDomains
            && self.rules.domains.is_empty()
            && self.rules.domain_files.is_empty()
        {
            return Err(Error::config_value(
                "rules.mode",
                "custom-domains mode needs at least one entry in domains or domain_files",
            ));
        }

        if !["trace", "debug", "info", "warn", "error"]
            .contains(&self.logging.level.to_lowercase().as_str())
        {
            return Err(Error::config_value(
                "logging.level",
                format!("Unknown level '{}'", self.logging.level),
            ));
        }

        Ok(())
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Profile name
    pub name: String,
    /// Configuration version
    pub version: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            version: "1.0".to_string(),
        }
    }
}

/// Initial filter rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Which requests the blocklist applies to
    pub mode: FilterMode,
    /// Cookie names to block
    pub cookies: Vec<String>,
    /// Custom domains (used by `custom-domains` mode)
    pub domains: Vec<String>,
    /// Files with one cookie name per line
    pub cookie_files: Vec<String>,
    /// Files with one domain per line
    pub domain_files: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log file path (None = stdout only)
    pub file: Option<String>,
    /// Enable JSON format logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            json_format: false,
        }
    }
}
