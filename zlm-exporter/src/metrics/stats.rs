//! Process-lifetime scrape counters.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;
use zlm_api::Endpoint;

/// Counters that survive across scrape cycles.
#[derive(Debug, Default)]
pub struct ScrapeStats {
    scrapes_total: AtomicU64,
    scrape_errors: DashMap<Endpoint, AtomicU64>,
}

impl ScrapeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a cycle; returns the new total.
    pub fn record_scrape(&self) -> u64 {
        self.scrapes_total.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record a failed source.
    pub fn record_error(&self, endpoint: Endpoint) {
        self.scrape_errors
            .entry(endpoint)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn scrapes_total(&self) -> u64 {
        self.scrapes_total.load(Ordering::Relaxed)
    }

    pub fn errors(&self, endpoint: Endpoint) -> u64 {
        self.scrape_errors
            .get(&endpoint)
            .map(|v| v.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Error counts for every endpoint that has failed at least once,
    /// ordered by endpoint.
    pub fn error_counts(&self) -> BTreeMap<Endpoint, u64> {
        self.scrape_errors
            .iter()
            .map(|e| (*e.key(), e.value().load(Ordering::Relaxed)))
            .collect()
    }

    pub fn snapshot(&self) -> ScrapeStatsSnapshot {
        ScrapeStatsSnapshot {
            scrapes_total: self.scrapes_total(),
            scrape_errors: self
                .error_counts()
                .into_iter()
                .map(|(endpoint, count)| (endpoint.path().to_string(), count))
                .collect(),
        }
    }
}

/// A snapshot of the scrape counters at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeStatsSnapshot {
    pub scrapes_total: u64,
    pub scrape_errors: BTreeMap<String, u64>,
}
