//! Cookie blocklist and domain filtering rules
//!
//! This module holds the rule set consulted for every intercepted request:
//! - A blocklist of cookie names to strip (exact, case-sensitive)
//! - A custom domain list (a domain matches itself and its subdomains)
//! - The filter mode choosing which requests the blocklist applies to
//!
//! Rules live in memory only; files and configuration can seed them at
//! startup but nothing is written back.

mod mode;
mod rule_store;

pub use mode::FilterMode;
pub use rule_store::{validate_domain, ListKind, RuleStore};
