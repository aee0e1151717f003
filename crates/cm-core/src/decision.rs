//! Per-request filter decision
//!
//! Computes which cookies to strip from one intercepted request given the
//! current [`RuleStore`] state. The decision holds no state of its own and
//! never fails from the caller's point of view: any fault while inspecting
//! the request degrades to "remove nothing" so that a filtering bug cannot
//! break proxied traffic.

use crate::error::Result;
use crate::filter::{FilterMode, RuleStore};
use crate::request::InterceptedRequest;
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

/// Cookie names to strip from a request
///
/// Names keep the order in which they first appear on the request and are
/// never repeated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CookieRemoval {
    names: Vec<String>,
}

impl CookieRemoval {
    /// Empty removal (request passes unmodified)
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing is to be removed
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of distinct names to remove
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether `name` is to be removed
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Names to remove, in request order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate over names to remove
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.names.iter()
    }

    fn push(&mut self, name: &str) {
        if !self.contains(name) {
            self.names.push(name.to_string());
        }
    }
}

impl<'a> IntoIterator for &'a CookieRemoval {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<CookieRemoval> for Vec<String> {
    fn from(removal: CookieRemoval) -> Self {
        removal.names
    }
}

/// Decides which cookies to remove from intercepted requests
#[derive(Debug, Clone)]
pub struct FilterDecision {
    store: Arc<RuleStore>,
}

impl FilterDecision {
    /// Create a decision engine reading from `store`
    pub fn new(store: Arc<RuleStore>) -> Self {
        Self { store }
    }

    /// The rule store this engine reads from
    pub fn store(&self) -> &Arc<RuleStore> {
        &self.store
    }

    /// Cookies to remove from `request`, or none if anything goes wrong
    pub fn decide<R>(&self, request: &R) -> CookieRemoval
    where
        R: InterceptedRequest + ?Sized,
    {
        self.evaluate(request).unwrap_or_default()
    }

    /// Fault-isolated evaluation
    ///
    /// Returns `None` when a fault was recovered (already logged), so that
    /// callers can account for it.
    pub(crate) fn evaluate<R>(&self, request: &R) -> Option<CookieRemoval>
    where
        R: InterceptedRequest + ?Sized,
    {
        match panic::catch_unwind(AssertUnwindSafe(|| self.try_decide(request))) {
            Ok(Ok(removal)) => Some(removal),
            Ok(Err(e)) => {
                error!("Cookie filter error: {}", e);
                None
            }
            Err(payload) => {
                error!("Cookie filter panicked: {}", panic_message(payload.as_ref()));
                None
            }
        }
    }

    /// Cookies to remove from `request`, propagating inspection errors
    ///
    /// 1. No blocked cookies, or no cookies on the request: nothing to do.
    /// 2. Request outside the active mode's scope: nothing to do.
    /// 3. Otherwise every blocked cookie on the request, in request order.
    pub fn try_decide<R>(&self, request: &R) -> Result<CookieRemoval>
    where
        R: InterceptedRequest + ?Sized,
    {
        if self.store.count_cookies() == 0 {
            return Ok(CookieRemoval::new());
        }

        let cookies = request.cookies()?;
        if cookies.is_empty() {
            return Ok(CookieRemoval::new());
        }

        if !self.should_process(request)? {
            return Ok(CookieRemoval::new());
        }

        let mut removal = CookieRemoval::new();
        for cookie in &cookies {
            if self.store.is_blocked(&cookie.name) {
                removal.push(&cookie.name);
            }
        }

        Ok(removal)
    }

    /// Whether the active filter mode applies the blocklist to `request`
    pub fn should_process<R>(&self, request: &R) -> Result<bool>
    where
        R: InterceptedRequest + ?Sized,
    {
        let mode = self.store.mode();
        let process = match mode {
            FilterMode::AllDomains => true,
            FilterMode::InScopeOnly => request.is_in_scope(),
            FilterMode::CustomDomains => {
                let host = request.host()?;
                self.store.matches_domain(&host)
            }
        };

        if !process {
            debug!("Skipping request to {}: outside {} filter", request.url(), mode);
        }

        Ok(process)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::request::{Cookie, HttpRequest, MockInterceptedRequest};

    fn decision(mode: FilterMode, cookies: &[&str], domains: &[&str]) -> FilterDecision {
        FilterDecision::new(Arc::new(RuleStore::with_rules(
            mode,
            cookies.iter().copied(),
            domains.iter().copied(),
        )))
    }

    fn names(removal: &CookieRemoval) -> Vec<&str> {
        removal.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_all_domains_removes_blocked() {
        let decision = decision(FilterMode::AllDomains, &["session_id", "csrf_token"], &[]);
        let request = HttpRequest::new("example.com")
            .with_cookie("session_id", "abc")
            .with_cookie("lang", "en")
            .with_cookie("csrf_token", "xyz");

        let removal = decision.decide(&request);
        assert_eq!(names(&removal), vec!["session_id", "csrf_token"]);
    }

    #[test]
    fn test_preserves_request_order() {
        let decision = decision(FilterMode::AllDomains, &["a", "b", "c"], &[]);
        let request = HttpRequest::new("example.com")
            .with_cookie("c", "3")
            .with_cookie("a", "1")
            .with_cookie("b", "2");

        assert_eq!(names(&decision.decide(&request)), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_duplicate_cookie_names_collapse() {
        let decision = decision(FilterMode::AllDomains, &["track"], &[]);
        let request = HttpRequest::new("example.com")
            .with_cookie("track", "1")
            .with_cookie("track", "2");

        let removal = decision.decide(&request);
        assert_eq!(removal.len(), 1);
        assert!(removal.contains("track"));
    }

    #[test]
    fn test_in_scope_only() {
        let decision = decision(FilterMode::InScopeOnly, &["session"], &[]);
        let request = HttpRequest::new("example.com").with_cookie("session", "abc");

        assert!(decision.decide(&request.clone().in_scope(false)).is_empty());
        assert_eq!(names(&decision.decide(&request.in_scope(true))), vec!["session"]);
    }

    #[test]
    fn test_custom_domains() {
        let decision = decision(FilterMode::CustomDomains, &["track"], &["example.com"]);

        let shop = HttpRequest::new("shop.example.com").with_cookie("track", "1");
        assert_eq!(names(&decision.decide(&shop)), vec!["track"]);

        let other = HttpRequest::new("other.com").with_cookie("track", "1");
        assert!(decision.decide(&other).is_empty());
    }

    #[test]
    fn test_custom_domains_ignores_in_scope_flag() {
        let decision = decision(FilterMode::CustomDomains, &["track"], &["example.com"]);
        let request = HttpRequest::new("other.com")
            .in_scope(true)
            .with_cookie("track", "1");

        assert!(decision.decide(&request).is_empty());
    }

    #[test]
    fn test_no_blocked_cookie_present() {
        let decision = decision(FilterMode::AllDomains, &["session"], &[]);
        let request = HttpRequest::new("example.com").with_cookie("lang", "en");
        assert!(decision.decide(&request).is_empty());
    }

    #[test]
    fn test_mode_change_applies_to_next_decision() {
        let decision = decision(FilterMode::AllDomains, &["session"], &[]);
        let request = HttpRequest::new("example.com").with_cookie("session", "abc");
        assert!(!decision.decide(&request).is_empty());

        decision.store().set_mode(FilterMode::InScopeOnly);
        assert!(decision.decide(&request).is_empty());
    }

    #[test]
    fn test_fast_path_skips_mode_logic_without_cookies() {
        let decision = decision(FilterMode::CustomDomains, &["session"], &["example.com"]);

        // Any call to host() or is_in_scope() would panic on the mock.
        let mut request = MockInterceptedRequest::new();
        request.expect_cookies().times(1).returning(|| Ok(Vec::new()));

        assert!(decision.try_decide(&request).unwrap().is_empty());
    }

    #[test]
    fn test_fast_path_skips_request_when_blocklist_empty() {
        let decision = decision(FilterMode::AllDomains, &[], &[]);
        let request = MockInterceptedRequest::new();

        assert!(decision.try_decide(&request).unwrap().is_empty());
    }

    #[test]
    fn test_all_domains_never_consults_scope_or_host() {
        let decision = decision(FilterMode::AllDomains, &["session"], &[]);

        let mut request = MockInterceptedRequest::new();
        request
            .expect_cookies()
            .returning(|| Ok(vec![Cookie::new("session", "abc")]));

        assert_eq!(names(&decision.try_decide(&request).unwrap()), vec!["session"]);
    }

    #[test]
    fn test_in_scope_only_consults_predicate_once() {
        let decision = decision(FilterMode::InScopeOnly, &["session"], &[]);

        let mut request = MockInterceptedRequest::new();
        request
            .expect_cookies()
            .returning(|| Ok(vec![Cookie::new("session", "abc")]));
        request.expect_is_in_scope().times(1).return_const(true);

        assert_eq!(names(&decision.try_decide(&request).unwrap()), vec!["session"]);
    }

    #[test]
    fn test_host_error_fails_open() {
        let decision = decision(FilterMode::CustomDomains, &["session"], &["example.com"]);

        let mut request = MockInterceptedRequest::new();
        request
            .expect_cookies()
            .returning(|| Ok(vec![Cookie::new("session", "abc")]));
        request
            .expect_host()
            .returning(|| Err(Error::request("malformed host")));

        assert!(matches!(decision.try_decide(&request), Err(Error::Request(_))));
        assert!(decision.decide(&request).is_empty());
        assert!(decision.evaluate(&request).is_none());
    }

    #[test]
    fn test_cookie_enumeration_error_fails_open() {
        let decision = decision(FilterMode::AllDomains, &["session"], &[]);

        let mut request = MockInterceptedRequest::new();
        request
            .expect_cookies()
            .returning(|| Err(Error::request("unparseable cookie header")));

        assert!(decision.decide(&request).is_empty());
    }

    struct PanickingScope;

    impl InterceptedRequest for PanickingScope {
        fn url(&self) -> String {
            "https://example.com/".to_string()
        }

        fn host(&self) -> Result<String> {
            Ok("example.com".to_string())
        }

        fn is_in_scope(&self) -> bool {
            panic!("scope service unavailable")
        }

        fn cookies(&self) -> Result<Vec<Cookie>> {
            Ok(vec![Cookie::new("session", "abc")])
        }
    }

    #[test]
    fn test_panicking_accessor_fails_open() {
        let decision = decision(FilterMode::InScopeOnly, &["session"], &[]);

        assert!(decision.decide(&PanickingScope).is_empty());
        assert!(decision.evaluate(&PanickingScope).is_none());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(payload.as_ref()), "owned message");

        let payload: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
