//! Routing counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic counter, cheap to clone and share
#[derive(Debug, Clone, Default)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, value: u64) {
        self.value.fetch_add(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// Counters kept by the orchestrator and its callers
#[derive(Debug, Clone, Default)]
pub struct RoutingMetrics {
    /// Calls to resolve-and-execute
    pub resolutions: Counter,
    /// Resolutions that ended with a successful driver call
    pub successes: Counter,
    /// Resolutions where no provider succeeded
    pub exhaustions: Counter,
    /// Executed provider attempts that failed or timed out and moved on
    pub fallbacks: Counter,
    /// Candidates skipped before execution (unknown driver, bad config)
    pub skipped: Counter,
    /// Contingency hops taken by the shipping caller
    pub contingency_hops: Counter,
}

/// Point-in-time copy of [`RoutingMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub resolutions: u64,
    pub successes: u64,
    pub exhaustions: u64,
    pub fallbacks: u64,
    pub skipped: u64,
    pub contingency_hops: u64,
}

impl RoutingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            resolutions: self.resolutions.get(),
            successes: self.successes.get(),
            exhaustions: self.exhaustions.get(),
            fallbacks: self.fallbacks.get(),
            skipped: self.skipped.get(),
            contingency_hops: self.contingency_hops.get(),
        }
    }

    pub fn reset(&self) {
        self.resolutions.reset();
        self.successes.reset();
        self.exhaustions.reset();
        self.fallbacks.reset();
        self.skipped.reset();
        self.contingency_hops.reset();
    }
}
