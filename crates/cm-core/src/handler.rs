//! Interception hook
//!
//! [`CookieFilterHandler`] is what a host proxy registers for outgoing
//! requests. It asks [`FilterDecision`] which cookies to drop, logs each
//! removal and applies it through the host's own strip operation. Whatever
//! happens, the host always gets a request back.

use crate::decision::{CookieRemoval, FilterDecision};
use crate::error::Result;
use crate::filter::RuleStore;
use crate::request::{HttpRequest, InterceptedRequest};
use crate::stats::FilterStats;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Request hook that strips blocked cookies
#[derive(Debug, Clone)]
pub struct CookieFilterHandler {
    decision: FilterDecision,
    stats: Arc<FilterStats>,
}

impl CookieFilterHandler {
    /// Create a handler over a shared rule store
    pub fn new(store: Arc<RuleStore>) -> Self {
        Self {
            decision: FilterDecision::new(store),
            stats: Arc::new(FilterStats::new()),
        }
    }

    /// The rule store consulted for every request
    pub fn store(&self) -> &Arc<RuleStore> {
        self.decision.store()
    }

    /// The decision engine
    pub fn decision(&self) -> &FilterDecision {
        &self.decision
    }

    /// Counters for every request handled so far
    pub fn stats(&self) -> &Arc<FilterStats> {
        &self.stats
    }

    /// Filter one outgoing request
    ///
    /// `strip` is the host's "remove these cookie parameters" operation.
    /// It is only called when at least one cookie has to go. If deciding or
    /// stripping fails, the error is logged and `request` is returned
    /// untouched.
    #[instrument(level = "trace", skip_all)]
    pub fn handle<R, F>(&self, request: R, strip: F) -> R
    where
        R: InterceptedRequest,
        F: FnOnce(&R, &CookieRemoval) -> Result<R>,
    {
        self.stats.record_request();

        let Some(removal) = self.decision.evaluate(&request) else {
            self.stats.record_fault();
            return request;
        };

        if removal.is_empty() {
            return request;
        }

        let stripped = panic::catch_unwind(AssertUnwindSafe(|| {
            let url = request.url();
            for name in &removal {
                info!("Removing cookie '{}' from request to {}", name, url);
            }
            strip(&request, &removal)
        }));

        match stripped {
            Ok(Ok(modified)) => {
                self.stats.record_removal(&removal);
                modified
            }
            Ok(Err(e)) => {
                error!("Cookie filter error: {}", e);
                self.stats.record_fault();
                request
            }
            Err(_) => {
                error!("Cookie filter panicked while stripping cookies; forwarding original request");
                self.stats.record_fault();
                request
            }
        }
    }

    /// Filter an owned [`HttpRequest`]
    pub fn handle_request(&self, request: HttpRequest) -> HttpRequest {
        self.filter_request(request).0
    }

    /// Filter an owned [`HttpRequest`] and report the cookies actually removed
    ///
    /// The removal is empty whenever the original request was forwarded.
    pub fn filter_request(&self, request: HttpRequest) -> (HttpRequest, CookieRemoval) {
        let mut applied = CookieRemoval::new();
        let filtered = self.handle(request, |request, removal| {
            applied = removal.clone();
            Ok(request.without_cookies(removal))
        });
        (filtered, applied)
    }

    /// Responses are never modified
    pub fn handle_response<T>(&self, response: T) -> T {
        response
    }
}
