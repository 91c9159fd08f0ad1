//! Short-TTL cache of the last fully computed cycle
//!
//! Readers take the last-published snapshot without touching the cycle lock;
//! the cycle publishes a new snapshot by swapping the Arc under a brief write
//! lock. Invalidation clears the snapshot so the next read recomputes
//! instead of waiting out the TTL.

use crate::domain::types::TrackingRecord;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One published cycle result
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub records: Arc<Vec<TrackingRecord>>,
    pub cycle_id: String,
    pub published_at: Instant,
}

/// TTL cache over the last cycle's records
#[derive(Debug)]
pub struct TrackingCache {
    inner: RwLock<Option<CacheSnapshot>>,
    ttl: Duration,
}

impl TrackingCache {
    pub fn new(ttl: Duration) -> Self {
        Self { inner: RwLock::new(None), ttl }
    }

    /// The current snapshot if it is younger than the TTL
    pub fn fresh(&self) -> Option<CacheSnapshot> {
        let guard = self.inner.read();
        guard
            .as_ref()
            .filter(|snapshot| snapshot.published_at.elapsed() < self.ttl)
            .cloned()
    }

    /// The current snapshot regardless of age (stale-but-available reads)
    pub fn latest(&self) -> Option<CacheSnapshot> {
        self.inner.read().clone()
    }

    /// Atomically replace the published snapshot
    pub fn publish(&self, records: Vec<TrackingRecord>, cycle_id: String) {
        let snapshot =
            CacheSnapshot { records: Arc::new(records), cycle_id, published_at: Instant::now() };
        *self.inner.write() = Some(snapshot);
    }

    /// Drop the snapshot so the next read triggers a fresh cycle
    pub fn invalidate(&self) {
        *self.inner.write() = None;
    }

    /// Age of the published snapshot in seconds, if any
    pub fn age_secs(&self) -> Option<u64> {
        self.inner.read().as_ref().map(|s| s.published_at.elapsed().as_secs())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
