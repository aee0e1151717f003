//! Rule store implementation
//!
//! Holds the cookie blocklist, the custom domain list and the active
//! [`FilterMode`]. Every operation is independently atomic and safe to call
//! from any thread while requests are being filtered.

use super::mode::{FilterMode, ModeCell};
use crate::config::RulesConfig;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Which set a rule list file feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// One cookie name per line
    Cookies,
    /// One domain per line
    Domains,
}

/// Thread-safe cookie blocklist and domain filter configuration
///
/// Both sets sit behind their own read/write lock so that snapshot reads
/// always copy a complete state and concurrent writers never lose an
/// update. The mode is a single atomic and never takes a lock.
#[derive(Debug, Default)]
pub struct RuleStore {
    /// Blocked cookie names (trimmed, case-sensitive)
    cookies: RwLock<HashSet<String>>,
    /// Custom domains (trimmed, lowercase)
    domains: RwLock<HashSet<String>>,
    /// Current filter mode
    mode: ModeCell,
}

impl RuleStore {
    /// Create an empty store in `AllDomains` mode
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with initial rules
    pub fn with_rules<C, D>(mode: FilterMode, cookies: C, domains: D) -> Self
    where
        C: IntoIterator,
        C::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        let store = Self::new();
        store.set_mode(mode);
        store.extend_cookies(cookies);
        store.extend_domains(domains);
        store
    }

    // =========== Cookie blocklist ===========

    /// Add a cookie name to the blocklist
    ///
    /// The name is trimmed first. Returns `false` for empty input or when
    /// the name is already blocked.
    pub fn add_cookie(&self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }

        let added = self.cookies.write().insert(name.to_string());
        if added {
            debug!("Blocked cookie '{}'", name);
        }
        added
    }

    /// Add a cookie name, reporting why it was rejected
    ///
    /// Returns the stored (trimmed) name on success.
    pub fn try_add_cookie(&self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyCookieName);
        }
        if self.add_cookie(name) {
            Ok(name.to_string())
        } else {
            Err(Error::DuplicateCookie(name.to_string()))
        }
    }

    /// Remove a cookie name from the blocklist
    ///
    /// Matches exactly as given: no trimming is applied here, so
    /// `" session "` does not remove `"session"`.
    pub fn remove_cookie(&self, name: &str) -> bool {
        let removed = self.cookies.write().remove(name);
        if removed {
            debug!("Unblocked cookie '{}'", name);
        }
        removed
    }

    /// Check if a cookie name is blocked (exact match)
    pub fn is_blocked(&self, name: &str) -> bool {
        self.cookies.read().contains(name)
    }

    /// Snapshot of all blocked cookie names
    pub fn list_cookies(&self) -> HashSet<String> {
        self.cookies.read().clone()
    }

    /// Blocked cookie names in sorted order
    pub fn sorted_cookies(&self) -> Vec<String> {
        let mut names: Vec<String> = self.list_cookies().into_iter().collect();
        names.sort();
        names
    }

    /// Remove every blocked cookie
    pub fn clear_cookies(&self) {
        self.cookies.write().clear();
    }

    /// Number of blocked cookies
    pub fn count_cookies(&self) -> usize {
        self.cookies.read().len()
    }

    /// Add several cookie names, returning how many were new
    pub fn extend_cookies<I>(&self, names: I) -> usize
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        names
            .into_iter()
            .filter(|name| self.add_cookie(name.as_ref()))
            .count()
    }

    // =========== Custom domains ===========

    /// Add a domain to the custom list
    ///
    /// The domain is trimmed and lowercased. Returns `false` for empty
    /// input or when the domain is already listed. No syntax check is made
    /// here; use [`RuleStore::try_add_domain`] for user input.
    pub fn add_domain(&self, domain: &str) -> bool {
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() {
            return false;
        }

        self.domains.write().insert(domain)
    }

    /// Validate and add a domain typed by a user
    ///
    /// Accepts an optional `http://`/`https://` prefix and trailing path,
    /// both of which are stripped. Returns the stored domain.
    pub fn try_add_domain(&self, input: &str) -> Result<String> {
        let domain = validate_domain(input)?;
        if self.add_domain(&domain) {
            debug!("Added custom domain '{}'", domain);
            Ok(domain)
        } else {
            Err(Error::DuplicateDomain(domain))
        }
    }

    /// Remove a domain from the custom list (lowercased before lookup)
    pub fn remove_domain(&self, domain: &str) -> bool {
        self.domains.write().remove(&domain.to_lowercase())
    }

    /// Check if a domain is in the custom list (lowercased before lookup)
    pub fn is_custom_domain(&self, domain: &str) -> bool {
        self.domains.read().contains(&domain.to_lowercase())
    }

    /// Snapshot of all custom domains
    pub fn list_domains(&self) -> HashSet<String> {
        self.domains.read().clone()
    }

    /// Custom domains in sorted order
    pub fn sorted_domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.list_domains().into_iter().collect();
        domains.sort();
        domains
    }

    /// Remove every custom domain
    pub fn clear_domains(&self) {
        self.domains.write().clear();
    }

    /// Number of custom domains
    pub fn count_domains(&self) -> usize {
        self.domains.read().len()
    }

    /// Add several domains, returning how many were new
    pub fn extend_domains<I>(&self, domains: I) -> usize
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        domains
            .into_iter()
            .filter(|domain| self.add_domain(domain.as_ref()))
            .count()
    }

    /// Check if a host is a custom domain or a subdomain of one
    ///
    /// Subdomain matching is anchored on the dot: with `example.com` listed,
    /// `api.example.com` matches but `notexample.com` does not.
    pub fn matches_domain(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }

        let host = host.to_lowercase();
        let domains = self.domains.read();

        if domains.contains(&host) {
            return true;
        }

        domains.iter().any(|domain| is_subdomain_of(&host, domain))
    }

    // =========== Mode ===========

    /// Get current filter mode
    pub fn mode(&self) -> FilterMode {
        self.mode.load()
    }

    /// Set filter mode
    pub fn set_mode(&self, mode: FilterMode) {
        self.mode.store(mode);
        debug!("Filter mode set to {}", mode);
    }

    /// Set filter mode by name
    ///
    /// Unrecognized names are ignored and leave the current mode in place.
    pub fn set_mode_str(&self, name: &str) -> bool {
        match FilterMode::from_name(name) {
            Some(mode) => {
                self.set_mode(mode);
                true
            }
            None => {
                debug!("Ignoring unknown filter mode '{}'", name);
                false
            }
        }
    }

    // =========== Seeding ===========

    /// Load entries from a list file
    ///
    /// File format:
    /// - One entry per line
    /// - Lines starting with # are comments
    /// - Empty lines are ignored
    ///
    /// Domain lines go through the same validation as user input; invalid
    /// ones are skipped with a warning. Returns the number of new entries.
    pub fn load_list<P: AsRef<Path>>(&self, path: P, kind: ListKind) -> Result<usize> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let mut count = 0;
        for entry in list_entries(&content) {
            let added = match kind {
                ListKind::Cookies => self.add_cookie(entry),
                ListKind::Domains => match validate_domain(entry) {
                    Ok(domain) => self.add_domain(&domain),
                    Err(e) => {
                        warn!("Skipping entry in {}: {}", path.display(), e);
                        false
                    }
                },
            };
            if added {
                count += 1;
            }
        }

        info!("Loaded {} {:?} entries from {}", count, kind, path.display());
        Ok(count)
    }
}

/// Create store from configuration
impl RuleStore {
    /// Build a store from the `[rules]` configuration section
    ///
    /// Inline entries are added first, then every list file. Domains are
    /// validated; an invalid inline domain is a configuration error.
    pub fn from_config(rules: &RulesConfig) -> Result<Self> {
        let store = Self::new();
        store.set_mode(rules.mode);

        for name in &rules.cookies {
            store.add_cookie(name);
        }

        for domain in &rules.domains {
            let domain = validate_domain(domain)
                .map_err(|e| Error::config_value("rules.domains", e.to_string()))?;
            store.add_domain(&domain);
        }

        for path in &rules.cookie_files {
            store.load_list(path, ListKind::Cookies)?;
        }

        for path in &rules.domain_files {
            store.load_list(path, ListKind::Domains)?;
        }

        info!(
            "Rule store ready: {} blocked cookies, {} custom domains, mode {}",
            store.count_cookies(),
            store.count_domains(),
            store.mode()
        );

        Ok(store)
    }
}

/// Normalize and syntax-check a user supplied domain
///
/// Strips an `http://` or `https://` prefix and anything after the first
/// `/`, lowercases, and requires dot-separated labels of up to 63
/// alphanumerics or hyphens (no leading/trailing hyphen) ending in an
/// alphabetic TLD of at least two letters.
pub fn validate_domain(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyDomain);
    }

    let lower = trimmed.to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let host = without_scheme.split('/').next().unwrap_or_default();

    if is_valid_host(host) {
        Ok(host.to_string())
    } else {
        Err(Error::InvalidDomain(trimmed.to_string()))
    }
}

fn is_valid_host(host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    let Some((tld, rest)) = labels.split_last() else {
        return false;
    };

    !rest.is_empty()
        && tld.len() >= 2
        && tld.bytes().all(|b| b.is_ascii_alphabetic())
        && rest.iter().all(|label| is_valid_label(label))
}

fn is_valid_label(label: &str) -> bool {
    (1..=63).contains(&label.len())
        && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        && !label.starts_with('-')
        && !label.ends_with('-')
}

/// `host` ends with `"." + domain`
fn is_subdomain_of(host: &str, domain: &str) -> bool {
    host.len() > domain.len()
        && host.ends_with(domain)
        && host.as_bytes()[host.len() - domain.len() - 1] == b'.'
}

fn list_entries(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_add_cookie_trims() {
        let store = RuleStore::new();
        assert!(store.add_cookie("  session  "));
        assert!(store.is_blocked("session"));
        assert!(!store.is_blocked("  session  "));
    }

    #[test]
    fn test_add_cookie_rejects_blank() {
        let store = RuleStore::new();
        assert!(!store.add_cookie(""));
        assert!(!store.add_cookie("   "));
        assert!(!store.add_cookie("\t\n"));
        assert_eq!(store.count_cookies(), 0);
    }

    #[test]
    fn test_add_cookie_duplicate() {
        let store = RuleStore::new();
        assert!(store.add_cookie("track"));
        assert!(!store.add_cookie(" track"));
        assert_eq!(store.count_cookies(), 1);
    }

    #[test]
    fn test_cookie_names_are_case_sensitive() {
        let store = RuleStore::new();
        store.add_cookie("SessionId");
        assert!(store.is_blocked("SessionId"));
        assert!(!store.is_blocked("sessionid"));
    }

    #[test]
    fn test_remove_cookie_does_not_trim() {
        let store = RuleStore::new();
        store.add_cookie("session");
        assert!(!store.remove_cookie(" session "));
        assert!(store.is_blocked("session"));
        assert!(store.remove_cookie("session"));
        assert!(!store.remove_cookie("session"));
    }

    #[test]
    fn test_list_cookies_is_a_copy() {
        let store = RuleStore::new();
        store.add_cookie("a");
        let mut snapshot = store.list_cookies();
        snapshot.insert("b".to_string());
        snapshot.remove("a");
        assert!(store.is_blocked("a"));
        assert!(!store.is_blocked("b"));
    }

    #[test]
    fn test_clear_cookies() {
        let store = RuleStore::with_rules(FilterMode::AllDomains, ["a", "b"], Vec::<String>::new());
        assert_eq!(store.count_cookies(), 2);
        store.clear_cookies();
        assert_eq!(store.count_cookies(), 0);
    }

    #[test]
    fn test_try_add_cookie() {
        let store = RuleStore::new();
        assert_eq!(store.try_add_cookie(" sid ").unwrap(), "sid");
        assert!(matches!(store.try_add_cookie("sid"), Err(Error::DuplicateCookie(_))));
        assert!(matches!(store.try_add_cookie("  "), Err(Error::EmptyCookieName)));
        assert_eq!(store.count_cookies(), 1);
    }

    #[test]
    fn test_domain_normalization() {
        let store = RuleStore::new();
        assert!(store.add_domain("  Example.COM "));
        assert!(store.is_custom_domain("EXAMPLE.com"));
        assert_eq!(store.sorted_domains(), vec!["example.com".to_string()]);
        assert!(!store.add_domain("example.com"));
        assert!(store.remove_domain("Example.Com"));
        assert_eq!(store.count_domains(), 0);
    }

    #[test]
    fn test_matches_domain_dot_boundary() {
        let store = RuleStore::new();
        store.add_domain("example.com");

        assert!(store.matches_domain("example.com"));
        assert!(store.matches_domain("api.example.com"));
        assert!(store.matches_domain("deep.api.EXAMPLE.com"));
        assert!(!store.matches_domain("notexample.com"));
        assert!(!store.matches_domain("example.com.evil.com"));
        assert!(!store.matches_domain("com"));
        assert!(!store.matches_domain(""));
    }

    #[test]
    fn test_matches_domain_empty_list() {
        let store = RuleStore::new();
        assert!(!store.matches_domain("example.com"));
    }

    #[test]
    fn test_mode_default_and_set() {
        let store = RuleStore::new();
        assert_eq!(store.mode(), FilterMode::AllDomains);
        store.set_mode(FilterMode::CustomDomains);
        assert_eq!(store.mode(), FilterMode::CustomDomains);
    }

    #[test]
    fn test_set_mode_str_ignores_unknown() {
        let store = RuleStore::new();
        store.set_mode(FilterMode::InScopeOnly);
        assert!(!store.set_mode_str("blacklist"));
        assert_eq!(store.mode(), FilterMode::InScopeOnly);
        assert!(store.set_mode_str("custom"));
        assert_eq!(store.mode(), FilterMode::CustomDomains);
    }

    #[test]
    fn test_validate_domain() {
        assert_eq!(validate_domain("example.com").unwrap(), "example.com");
        assert_eq!(validate_domain(" Shop.Example.CO.uk ").unwrap(), "shop.example.co.uk");
        assert_eq!(validate_domain("https://example.com/login").unwrap(), "example.com");
        assert_eq!(validate_domain("HTTP://a-b.example.org").unwrap(), "a-b.example.org");

        assert!(matches!(validate_domain("  "), Err(Error::EmptyDomain)));
        assert!(matches!(validate_domain("localhost"), Err(Error::InvalidDomain(_))));
        assert!(matches!(validate_domain("-bad.com"), Err(Error::InvalidDomain(_))));
        assert!(matches!(validate_domain("bad-.com"), Err(Error::InvalidDomain(_))));
        assert!(matches!(validate_domain("example.c"), Err(Error::InvalidDomain(_))));
        assert!(matches!(validate_domain("example.c0m"), Err(Error::InvalidDomain(_))));
        assert!(matches!(validate_domain("exa mple.com"), Err(Error::InvalidDomain(_))));
        assert!(matches!(validate_domain("example..com"), Err(Error::InvalidDomain(_))));
        assert!(matches!(validate_domain("ftp://example.com"), Err(Error::InvalidDomain(_))));
    }

    #[test]
    fn test_try_add_domain_rejects_without_mutation() {
        let store = RuleStore::new();
        assert!(store.try_add_domain("not a domain").is_err());
        assert_eq!(store.count_domains(), 0);

        assert_eq!(store.try_add_domain("https://Example.com/path").unwrap(), "example.com");
        assert!(matches!(
            store.try_add_domain("example.com"),
            Err(Error::DuplicateDomain(_))
        ));
        assert_eq!(store.count_domains(), 1);
    }

    #[test]
    fn test_load_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# tracking cookies").unwrap();
        writeln!(file, "_ga").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  _gid  ").unwrap();
        writeln!(file, "_ga").unwrap();

        let store = RuleStore::new();
        let count = store.load_list(file.path(), ListKind::Cookies).unwrap();
        assert_eq!(count, 2);
        assert!(store.is_blocked("_ga"));
        assert!(store.is_blocked("_gid"));
    }

    #[test]
    fn test_load_domain_list_skips_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "example.com").unwrap();
        writeln!(file, "not_a_domain").unwrap();
        writeln!(file, "https://Tracker.NET/pixel").unwrap();

        let store = RuleStore::new();
        let count = store.load_list(file.path(), ListKind::Domains).unwrap();
        assert_eq!(count, 2);
        assert!(store.is_custom_domain("tracker.net"));
    }

    #[test]
    fn test_load_list_missing_file() {
        let store = RuleStore::new();
        let result = store.load_list("/nonexistent/cookies.txt", ListKind::Cookies);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_from_config() {
        let rules = RulesConfig {
            mode: FilterMode::CustomDomains,
            cookies: vec!["session".to_string(), " ".to_string()],
            domains: vec!["https://Example.com".to_string()],
            ..RulesConfig::default()
        };

        let store = RuleStore::from_config(&rules).unwrap();
        assert_eq!(store.mode(), FilterMode::CustomDomains);
        assert_eq!(store.count_cookies(), 1);
        assert!(store.is_custom_domain("example.com"));
    }

    #[test]
    fn test_from_config_rejects_invalid_domain() {
        let rules = RulesConfig {
            domains: vec!["not a domain".to_string()],
            ..RulesConfig::default()
        };
        assert!(matches!(
            RuleStore::from_config(&rules),
            Err(Error::ConfigValue { .. })
        ));
    }
}
