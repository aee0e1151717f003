//! # Cookie Monster Core
//!
//! Strips blocklisted cookies from outgoing HTTP requests inside an
//! intercepting proxy.
//!
//! ## Architecture
//!
//! This crate provides:
//! - **Rule store** - thread-safe cookie blocklist, custom domain list and filter mode
//! - **Filter decision** - per-request choice of which cookies to remove
//! - **Interception hook** - applies decisions, logs removals, fails open
//! - **Configuration** - TOML seed for rules and logging
//!
//! The host proxy stays in charge of parsing requests and deciding what is
//! in scope; it exposes both through [`InterceptedRequest`].
//!
//! ## Example
//!
//! ```rust
//! use cm_core::{CookieFilterHandler, FilterMode, HttpRequest, RuleStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(RuleStore::new());
//! store.add_cookie("session_id");
//! store.set_mode(FilterMode::AllDomains);
//!
//! let handler = CookieFilterHandler::new(Arc::clone(&store));
//! let request = HttpRequest::new("example.com")
//!     .with_cookie("session_id", "abc")
//!     .with_cookie("lang", "en");
//!
//! let filtered = handler.handle_request(request);
//! assert_eq!(filtered.cookie_header(), "lang=en");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod decision;
pub mod error;
pub mod filter;
pub mod handler;
pub mod request;
pub mod stats;

// Re-exports for convenience
pub use config::Config;
pub use decision::{CookieRemoval, FilterDecision};
pub use error::{Error, Result};
pub use filter::{FilterMode, RuleStore};
pub use handler::CookieFilterHandler;
pub use request::{Cookie, HttpRequest, InterceptedRequest};
pub use stats::{FilterStats, StatsSnapshot};
