//! Lock-free cycle statistics
//!
//! Uses atomics so the processing cycle can bump counters without holding
//! any lock shared with readers. All atomics use Relaxed ordering
//! intentionally—these are statistical counters only, never used for
//! coordination or logic decisions.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Counters accumulated across processing cycles
#[derive(Debug, Default)]
pub struct CycleStats {
    cycles_completed: AtomicU64,
    cycles_failed: AtomicU64,
    trucks_processed: AtomicU64,
    trucks_skipped: AtomicU64,
    trucks_errored: AtomicU64,
    store_failures: AtomicU64,
    last_cycle_ms: AtomicU64,
    max_cycle_ms: AtomicU64,
}

impl CycleStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle_completed(&self, duration_ms: u64) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);
        self.last_cycle_ms.store(duration_ms, Ordering::Relaxed);
        update_atomic_max(&self.max_cycle_ms, duration_ms);
    }

    pub fn record_cycle_failed(&self) {
        self.cycles_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_truck_processed(&self) {
        self.trucks_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_truck_skipped(&self) {
        self.trucks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_truck_errored(&self) {
        self.trucks_errored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::Relaxed)
    }

    pub fn cycles_failed(&self) -> u64 {
        self.cycles_failed.load(Ordering::Relaxed)
    }

    pub fn trucks_processed(&self) -> u64 {
        self.trucks_processed.load(Ordering::Relaxed)
    }

    pub fn store_failures(&self) -> u64 {
        self.store_failures.load(Ordering::Relaxed)
    }

    pub fn last_cycle_ms(&self) -> u64 {
        self.last_cycle_ms.load(Ordering::Relaxed)
    }

    /// Log a summary of all counters
    pub fn report(&self) {
        info!(
            cycles_completed = %self.cycles_completed.load(Ordering::Relaxed),
            cycles_failed = %self.cycles_failed.load(Ordering::Relaxed),
            trucks_processed = %self.trucks_processed.load(Ordering::Relaxed),
            trucks_skipped = %self.trucks_skipped.load(Ordering::Relaxed),
            trucks_errored = %self.trucks_errored.load(Ordering::Relaxed),
            store_failures = %self.store_failures.load(Ordering::Relaxed),
            last_cycle_ms = %self.last_cycle_ms.load(Ordering::Relaxed),
            max_cycle_ms = %self.max_cycle_ms.load(Ordering::Relaxed),
            "cycle_stats"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = CycleStats::new();
        stats.record_truck_processed();
        stats.record_truck_processed();
        stats.record_truck_skipped();
        stats.record_cycle_completed(120);

        assert_eq!(stats.trucks_processed(), 2);
        assert_eq!(stats.cycles_completed(), 1);
        assert_eq!(stats.last_cycle_ms(), 120);
    }

    #[test]
    fn test_max_cycle_tracks_peak() {
        let stats = CycleStats::new();
        stats.record_cycle_completed(100);
        stats.record_cycle_completed(500);
        stats.record_cycle_completed(200);

        assert_eq!(stats.last_cycle_ms(), 200);
        assert_eq!(stats.max_cycle_ms.load(Ordering::Relaxed), 500);
    }
}
