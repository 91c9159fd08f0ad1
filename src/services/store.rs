//! Tracking record persistence contract
//!
//! The pipeline needs exactly two operations from its store: a point lookup
//! by (vehicle, manifest) and an upsert that preserves the first-observed
//! `wait_started_at` across updates. The upsert must be atomic per key so
//! two overlapping cycles cannot race the wait-start floor. A database
//! adapter lives outside the core; the in-memory implementation here backs
//! tests and standalone runs.

use crate::domain::error::StoreError;
use crate::domain::types::{ManifestId, TrackingRecord, VehicleId};
use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Persistence gateway for tracking records
#[async_trait]
pub trait TrackingStore: Send + Sync {
    /// Insert or update the record for its (vehicle, manifest) key.
    ///
    /// On update every field is overwritten except `wait_started_at`, which
    /// becomes `existing.wait_started_at.or(record.wait_started_at)` - once
    /// set it is preserved verbatim on every later upsert for the key.
    async fn upsert(&self, record: &TrackingRecord) -> Result<(), StoreError>;

    /// Point lookup by key
    async fn get(
        &self,
        vehicle: &VehicleId,
        manifest: &ManifestId,
    ) -> Result<Option<TrackingRecord>, StoreError>;
}

/// In-memory store; the mutex is held across the whole read-modify-write so
/// each upsert is atomic per key
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<FxHashMap<(String, String), TrackingRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.lock().is_empty()
    }
}

#[async_trait]
impl TrackingStore for MemoryStore {
    async fn upsert(&self, record: &TrackingRecord) -> Result<(), StoreError> {
        let key = (record.vehicle_id.0.clone(), record.manifest_id.0.clone());
        let mut rows = self.rows.lock();

        let mut row = record.clone();
        if let Some(existing) = rows.get(&key) {
            row.wait_started_at = existing.wait_started_at.or(record.wait_started_at);
        }
        rows.insert(key, row);

        Ok(())
    }

    async fn get(
        &self,
        vehicle: &VehicleId,
        manifest: &ManifestId,
    ) -> Result<Option<TrackingRecord>, StoreError> {
        let rows = self.rows.lock();
        Ok(rows.get(&(vehicle.0.clone(), manifest.0.clone())).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{
        AlertLevel, ContainmentResult, DeliveryState, DischargeState, TrackingRecord,
    };
    use chrono::{DateTime, TimeZone, Utc};

    fn record(wait_started_at: Option<DateTime<Utc>>, wait_minutes: i64) -> TrackingRecord {
        TrackingRecord {
            vehicle_id: VehicleId("ABC-123".to_string()),
            manifest_id: ManifestId("PL-1".to_string()),
            destination_id: "Cerveceria SCZ".to_string(),
            origin: String::new(),
            product: String::new(),
            status: "SALIDA".to_string(),
            latitude: -17.78,
            longitude: -63.18,
            speed_kmh: 0.0,
            containment: ContainmentResult::default(),
            progress_pct: 20.0,
            delivery_state: DeliveryState::Unloading,
            wait_started_at,
            wait_minutes,
            discharge_state: DischargeState::AtDocks,
            alert_level: AlertLevel::Normal,
            persisted: true,
            processed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_then_lookup() {
        let store = MemoryStore::new();
        let t1 = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();

        store.upsert(&record(Some(t1), 0)).await.unwrap();

        let found = store
            .get(&VehicleId("ABC-123".to_string()), &ManifestId("PL-1".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.wait_started_at, Some(t1));
        assert!(store
            .get(&VehicleId("XYZ-999".to_string()), &ManifestId("PL-1".to_string()))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_wait_start_floor_preserved() {
        let store = MemoryStore::new();
        let t1 = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();
        let t2 = t1 + chrono::Duration::hours(2);

        store.upsert(&record(Some(t1), 0)).await.unwrap();
        // A later recomputed start must not displace the floor
        store.upsert(&record(Some(t2), 120)).await.unwrap();

        let found = store
            .get(&VehicleId("ABC-123".to_string()), &ManifestId("PL-1".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.wait_started_at, Some(t1));
        // All other fields are overwritten
        assert_eq!(found.wait_minutes, 120);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_unset_floor_takes_new_value() {
        let store = MemoryStore::new();
        let t1 = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();

        store.upsert(&record(None, 0)).await.unwrap();
        store.upsert(&record(Some(t1), 0)).await.unwrap();

        let found = store
            .get(&VehicleId("ABC-123".to_string()), &ManifestId("PL-1".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.wait_started_at, Some(t1));
    }
}
