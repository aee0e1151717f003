//! Filtering statistics
//!
//! Counters are updated from every request thread, so they are plain
//! atomics plus a sharded map for per-cookie counts.

use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live filtering counters
#[derive(Debug, Default)]
pub struct FilterStats {
    requests_seen: AtomicU64,
    requests_modified: AtomicU64,
    cookies_removed: AtomicU64,
    faults_recovered: AtomicU64,
    removed_by_name: DashMap<String, u64>,
}

/// Point-in-time copy of [`FilterStats`]
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Requests passed through the filter
    pub requests_seen: u64,
    /// Requests that had at least one cookie removed
    pub requests_modified: u64,
    /// Total cookie names removed
    pub cookies_removed: u64,
    /// Faults absorbed by failing open
    pub faults_recovered: u64,
    /// Removals per cookie name
    pub removed_by_name: BTreeMap<String, u64>,
}

impl FilterStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_request(&self) {
        self.requests_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fault(&self) {
        self.faults_recovered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_removal<'a, I>(&self, names: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut removed = 0;
        for name in names {
            *self.removed_by_name.entry(name.clone()).or_insert(0) += 1;
            removed += 1;
        }

        if removed > 0 {
            self.requests_modified.fetch_add(1, Ordering::Relaxed);
            self.cookies_removed.fetch_add(removed, Ordering::Relaxed);
        }
    }

    /// Copy the current counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests_seen: self.requests_seen.load(Ordering::Relaxed),
            requests_modified: self.requests_modified.load(Ordering::Relaxed),
            cookies_removed: self.cookies_removed.load(Ordering::Relaxed),
            faults_recovered: self.faults_recovered.load(Ordering::Relaxed),
            removed_by_name: self
                .removed_by_name
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        self.requests_seen.store(0, Ordering::Relaxed);
        self.requests_modified.store(0, Ordering::Relaxed);
        self.cookies_removed.store(0, Ordering::Relaxed);
        self.faults_recovered.store(0, Ordering::Relaxed);
        self.removed_by_name.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_removal() {
        let stats = FilterStats::new();
        stats.record_request();
        stats.record_removal(&["a".to_string(), "b".to_string()]);
        stats.record_request();
        stats.record_removal(&["a".to_string()]);
        stats.record_request();
        stats.record_removal(std::iter::empty());

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.requests_seen, 3);
        assert_eq!(snapshot.requests_modified, 2);
        assert_eq!(snapshot.cookies_removed, 3);
        assert_eq!(snapshot.removed_by_name.get("a"), Some(&2));
        assert_eq!(snapshot.removed_by_name.get("b"), Some(&1));
    }

    #[test]
    fn test_reset() {
        let stats = FilterStats::new();
        stats.record_request();
        stats.record_fault();
        stats.record_removal(&["a".to_string()]);
        stats.reset();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }
}
