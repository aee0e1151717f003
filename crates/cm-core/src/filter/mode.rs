//! Domain filter modes

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// Which requests are subject to blocklist removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    /// Remove blocked cookies from every request
    #[default]
    AllDomains,
    /// Remove blocked cookies only from requests the host marks in scope
    InScopeOnly,
    /// Remove blocked cookies only from requests to the custom domain list
    CustomDomains,
}

impl FilterMode {
    /// All modes, in display order
    pub const ALL: [FilterMode; 3] = [
        FilterMode::AllDomains,
        FilterMode::InScopeOnly,
        FilterMode::CustomDomains,
    ];

    /// Human-readable name shown by management surfaces
    pub fn display_name(&self) -> &'static str {
        match self {
            FilterMode::AllDomains => "All Domains",
            FilterMode::InScopeOnly => "In-Scope Only",
            FilterMode::CustomDomains => "Custom Domain List",
        }
    }

    /// Configuration key (same spelling serde uses)
    pub fn key(&self) -> &'static str {
        match self {
            FilterMode::AllDomains => "all-domains",
            FilterMode::InScopeOnly => "in-scope-only",
            FilterMode::CustomDomains => "custom-domains",
        }
    }

    /// Parse a mode name, returning `None` for anything unrecognized
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace('_', "-").as_str() {
            "all-domains" | "all" | "alldomains" => Some(FilterMode::AllDomains),
            "in-scope-only" | "in-scope" | "scope" | "inscopeonly" => Some(FilterMode::InScopeOnly),
            "custom-domains" | "custom" | "domains" | "customdomains" => {
                Some(FilterMode::CustomDomains)
            }
            _ => None,
        }
    }

    fn to_raw(self) -> u8 {
        match self {
            FilterMode::AllDomains => 0,
            FilterMode::InScopeOnly => 1,
            FilterMode::CustomDomains => 2,
        }
    }

    /// Decode a stored discriminant.
    ///
    /// Unknown values decode as `AllDomains`: an unrecognized mode processes
    /// every request (fail-open).
    fn from_raw(raw: u8) -> Self {
        match raw {
            1 => FilterMode::InScopeOnly,
            2 => FilterMode::CustomDomains,
            _ => FilterMode::AllDomains,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for FilterMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| Error::UnknownMode(s.to_string()))
    }
}

/// Lock-free holder for the process-wide filter mode
#[derive(Debug)]
pub(crate) struct ModeCell(AtomicU8);

impl ModeCell {
    pub(crate) fn new(mode: FilterMode) -> Self {
        Self(AtomicU8::new(mode.to_raw()))
    }

    pub(crate) fn load(&self) -> FilterMode {
        FilterMode::from_raw(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, mode: FilterMode) {
        self.0.store(mode.to_raw(), Ordering::Release);
    }
}

impl Default for ModeCell {
    fn default() -> Self {
        Self::new(FilterMode::default())
    }
}
