//! Error types for cm-core
//!
//! Centralized error handling using `thiserror`. Store rejections that the
//! management surface needs to show inline are typed here; the per-request
//! decision path never lets any of these escape (see [`crate::decision`]).

use thiserror::Error;

/// Main error type for cm-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Cookie name was empty or whitespace only
    #[error("Cookie name must not be empty")]
    EmptyCookieName,

    /// Cookie name is already on the blocklist
    #[error("Cookie '{0}' is already in the blocklist")]
    DuplicateCookie(String),

    /// Domain was empty or whitespace only
    #[error("Domain must not be empty")]
    EmptyDomain,

    /// Domain failed syntax validation
    #[error("Invalid domain format: '{0}' (expected something like 'example.com', without protocol)")]
    InvalidDomain(String),

    /// Domain is already in the custom list
    #[error("Domain '{0}' is already in the custom list")]
    DuplicateDomain(String),

    /// Filter mode name was not recognized
    #[error("Unknown filter mode: '{0}' (expected all-domains, in-scope-only or custom-domains)")]
    UnknownMode(String),

    /// Host accessor failed while reading the intercepted request
    #[error("Request inspection failed: {0}")]
    Request(String),

    /// Host strip operation failed while producing the modified request
    #[error("Failed to strip cookies from request: {0}")]
    Strip(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path to the missing config file
        path: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    ConfigValue {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a request inspection error
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request(message.into())
    }

    /// Create a strip error
    pub fn strip(message: impl Into<String>) -> Self {
        Self::Strip(message.into())
    }

    /// Create a config value error
    pub fn config_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Whether this error is an input rejection from the management surface
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyCookieName
                | Self::DuplicateCookie(_)
                | Self::EmptyDomain
                | Self::InvalidDomain(_)
                | Self::DuplicateDomain(_)
                | Self::UnknownMode(_)
        )
    }
}
