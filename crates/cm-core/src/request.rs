//! Intercepted request model
//!
//! The host proxy owns request parsing. The core only needs a host name,
//! the host's in-scope verdict and the cookie parameters, which it reads
//! through [`InterceptedRequest`]. [`HttpRequest`] is a plain owned
//! implementation used by tests, the CLI and hosts that already hold
//! parsed data.

use crate::decision::CookieRemoval;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A cookie parameter attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value (opaque, never inspected)
    #[serde(default)]
    pub value: String,
}

impl Cookie {
    /// Create a cookie parameter
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Read access to a request the host is about to send
///
/// Accessors are fallible because the host may fail to produce them (for
/// example a malformed target). The in-scope predicate is only consulted
/// when the active filter mode needs it.
#[cfg_attr(test, mockall::automock)]
pub trait InterceptedRequest {
    /// Request URL, used for log messages
    fn url(&self) -> String;

    /// Target host name
    fn host(&self) -> Result<String>;

    /// Host's in-scope verdict for this request
    fn is_in_scope(&self) -> bool;

    /// Cookie parameters in the order they appear on the request
    fn cookies(&self) -> Result<Vec<Cookie>>;
}

/// Owned request descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// Request URL
    #[serde(default)]
    pub url: String,
    /// Target host
    pub host: String,
    /// Whether the host considers this request in scope
    #[serde(default)]
    pub in_scope: bool,
    /// Cookie parameters, in request order
    #[serde(default)]
    pub cookies: Vec<Cookie>,
}

impl HttpRequest {
    /// Create a request to `host` with no cookies
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Set the request URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the in-scope flag
    pub fn in_scope(mut self, in_scope: bool) -> Self {
        self.in_scope = in_scope;
        self
    }

    /// Append one cookie
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push(Cookie::new(name, value));
        self
    }

    /// Append every cookie found in a `Cookie:` header value
    pub fn with_cookie_header(mut self, header: &str) -> Self {
        self.cookies.extend(parse_cookie_header(header));
        self
    }

    /// Copy of this request with every cookie named in `removal` stripped
    pub fn without_cookies(&self, removal: &CookieRemoval) -> Self {
        Self {
            url: self.url.clone(),
            host: self.host.clone(),
            in_scope: self.in_scope,
            cookies: self
                .cookies
                .iter()
                .filter(|cookie| !removal.contains(&cookie.name))
                .cloned()
                .collect(),
        }
    }

    /// Render the cookies back into a `Cookie:` header value
    pub fn cookie_header(&self) -> String {
        render_cookie_header(&self.cookies)
    }
}

impl InterceptedRequest for HttpRequest {
    fn url(&self) -> String {
        if self.url.is_empty() {
            self.host.clone()
        } else {
            self.url.clone()
        }
    }

    fn host(&self) -> Result<String> {
        Ok(self.host.clone())
    }

    fn is_in_scope(&self) -> bool {
        self.in_scope
    }

    fn cookies(&self) -> Result<Vec<Cookie>> {
        Ok(self.cookies.clone())
    }
}

/// Split a `Cookie:` header value into name/value pairs
///
/// Pairs are separated by `;`. Each pair splits on its first `=`; a pair
/// without `=` is a name with an empty value. Pairs with an empty name are
/// dropped.
pub fn parse_cookie_header(header: &str) -> Vec<Cookie> {
    header
        .split(';')
        .filter_map(|pair| {
            let pair = pair.trim();
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let name = name.trim();
            if name.is_empty() {
                None
            } else {
                Some(Cookie::new(name, value.trim()))
            }
        })
        .collect()
}

/// Join cookies into a `Cookie:` header value
pub fn render_cookie_header(cookies: &[Cookie]) -> String {
    cookies
        .iter()
        .map(|cookie| format!("{}={}", cookie.name, cookie.value))
        .collect::<Vec<_>>()
        .join("; ")
}
