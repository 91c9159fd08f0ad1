//! Integration tests for the processing pipeline
//!
//! Drives the engine end-to-end with mock feeds (cache and cycle semantics,
//! feed failure degradation) and walks the alert ladder against the store
//! with an explicit simulated clock.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use fleetwatch::domain::error::FeedError;
use fleetwatch::domain::geometry::Point;
use fleetwatch::domain::progress;
use fleetwatch::domain::types::{
    AlertLevel, DeliveryState, DischargeState, ManifestId, TrackingRecord, TruckSnapshot,
    VehicleId, VehiclePosition,
};
use fleetwatch::infra::config::AlertThresholds;
use fleetwatch::infra::Config;
use fleetwatch::io::geofence_file::GeofenceRow;
use fleetwatch::io::{ManifestFeed, PositionFeed};
use fleetwatch::services::{
    resolver, wait_time, GeofenceIndex, MemoryStore, TrackingEngine, TrackingStore,
};
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

struct MockPositionFeed {
    positions: Vec<VehiclePosition>,
    calls: AtomicU64,
    fail: AtomicBool,
}

#[async_trait]
impl PositionFeed for MockPositionFeed {
    async fn fetch_all(&self) -> Result<Vec<VehiclePosition>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(FeedError::Request("connection refused".to_string()));
        }
        Ok(self.positions.clone())
    }
}

struct MockManifestFeed {
    manifests: Vec<TruckSnapshot>,
    calls: AtomicU64,
}

#[async_trait]
impl ManifestFeed for MockManifestFeed {
    async fn fetch_active(&self) -> Result<Vec<TruckSnapshot>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.manifests.clone())
    }
}

fn manifest(vehicle: &str) -> TruckSnapshot {
    TruckSnapshot {
        vehicle_id: VehicleId(vehicle.to_string()),
        manifest_id: ManifestId("PL-1".to_string()),
        destination_id: "Cerveceria SCZ".to_string(),
        origin: "Planta Norte".to_string(),
        product: "Pilsener Premium".to_string(),
        product_code: "P-01".to_string(),
        status: "SALIDA".to_string(),
        departed_at: Some(Utc.with_ymd_and_hms(2025, 3, 10, 6, 0, 0).unwrap()),
    }
}

fn position(vehicle: &str, lat: f64, lng: f64) -> VehiclePosition {
    VehiclePosition {
        vehicle_id: VehicleId(vehicle.to_string()),
        latitude: lat,
        longitude: lng,
        speed_kmh: 0.0,
        heading: Some(90),
        recorded_at: None,
    }
}

/// Geofence file with a city square and a dock inside it, named so the
/// default "Cerveceria SCZ" profile matches by substring
fn write_fixture_files(dir: &TempDir) -> (String, String) {
    let geofences = dir.path().join("geofences.json");
    std::fs::write(
        &geofences,
        r#"[
            {"level": "CITY", "name": "SANTA CRUZ", "points": "-18.0 -64.0, -18.0 -63.0, -17.0 -63.0, -17.0 -64.0"},
            {"level": "DOCKS", "name": "DOCK - 7 - PLANTA SANTA CRUZ", "points": "-17.6 -63.6, -17.6 -63.4, -17.4 -63.4, -17.4 -63.6"}
        ]"#,
    )
    .unwrap();

    let egress = dir.path().join("tracking.jsonl");
    (
        geofences.to_string_lossy().to_string(),
        egress.to_string_lossy().to_string(),
    )
}

fn test_config(dir: &TempDir) -> Config {
    let (geofences_path, egress_path) = write_fixture_files(dir);
    let config_path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    write!(
        file,
        r#"
[positions]
base_url = "http://unused.test"

[manifests]
base_url = "http://unused.test"

[geofences]
path = "{geofences_path}"

[egress]
file = "{egress_path}"
"#
    )
    .unwrap();

    Config::from_file(&config_path).unwrap()
}

fn build_engine(
    dir: &TempDir,
    manifests: Vec<TruckSnapshot>,
    positions: Vec<VehiclePosition>,
) -> (Arc<TrackingEngine>, Arc<MockPositionFeed>, Arc<MockManifestFeed>, Arc<MemoryStore>) {
    let position_feed = Arc::new(MockPositionFeed {
        positions,
        calls: AtomicU64::new(0),
        fail: AtomicBool::new(false),
    });
    let manifest_feed = Arc::new(MockManifestFeed { manifests, calls: AtomicU64::new(0) });
    let store = Arc::new(MemoryStore::new());

    let engine = Arc::new(TrackingEngine::new(
        test_config(dir),
        position_feed.clone(),
        manifest_feed.clone(),
        store.clone(),
    ));
    (engine, position_feed, manifest_feed, store)
}

#[tokio::test]
async fn test_cycle_derives_record_for_truck_at_dock() {
    let dir = TempDir::new().unwrap();
    let (engine, _, _, store) = build_engine(
        &dir,
        vec![manifest("ABC-123")],
        vec![position("ABC-123", -17.5, -63.5)],
    );

    let records = engine.current_snapshot().await;
    assert_eq!(records.len(), 1);

    let record = &records[0];
    // City (25) + Docks (20), most specific level names the state
    assert_eq!(record.progress_pct, 45.0);
    assert_eq!(record.delivery_state, DeliveryState::Unloading);
    assert_eq!(record.discharge_state, DischargeState::AtDocks);
    assert_eq!(record.alert_level, AlertLevel::Normal);
    assert_eq!(record.wait_minutes, 0);
    assert!(record.wait_started_at.is_some());
    assert!(record.persisted);

    // The record was upserted under its key
    let stored = store
        .get(&VehicleId("ABC-123".to_string()), &ManifestId("PL-1".to_string()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.wait_started_at, record.wait_started_at);
}

#[tokio::test]
async fn test_read_within_ttl_does_not_touch_feeds() {
    let dir = TempDir::new().unwrap();
    let (engine, position_feed, manifest_feed, _) = build_engine(
        &dir,
        vec![manifest("ABC-123")],
        vec![position("ABC-123", -17.5, -63.5)],
    );

    let first = engine.current_snapshot().await;
    assert_eq!(position_feed.calls.load(Ordering::SeqCst), 1);
    assert_eq!(manifest_feed.calls.load(Ordering::SeqCst), 1);

    let second = engine.current_snapshot().await;
    assert_eq!(position_feed.calls.load(Ordering::SeqCst), 1, "cache hit must not refetch");
    assert_eq!(manifest_feed.calls.load(Ordering::SeqCst), 1);

    // Same published snapshot, byte-identical contents
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn test_trigger_cycle_invalidates_cache() {
    let dir = TempDir::new().unwrap();
    let (engine, position_feed, _, _) = build_engine(
        &dir,
        vec![manifest("ABC-123")],
        vec![position("ABC-123", -17.5, -63.5)],
    );

    engine.current_snapshot().await;
    assert!(engine.trigger_cycle().await);
    assert_eq!(position_feed.calls.load(Ordering::SeqCst), 2);

    // The manual trigger cleared the cache, so the next read recomputes
    engine.current_snapshot().await;
    assert_eq!(position_feed.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_wait_start_survives_repeated_cycles() {
    let dir = TempDir::new().unwrap();
    let (engine, _, _, store) = build_engine(
        &dir,
        vec![manifest("ABC-123")],
        vec![position("ABC-123", -17.5, -63.5)],
    );

    engine.current_snapshot().await;
    let first = store
        .get(&VehicleId("ABC-123".to_string()), &ManifestId("PL-1".to_string()))
        .await
        .unwrap()
        .unwrap();

    engine.trigger_cycle().await;
    let second = store
        .get(&VehicleId("ABC-123".to_string()), &ManifestId("PL-1".to_string()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(second.wait_started_at, first.wait_started_at);
}

#[tokio::test]
async fn test_failed_cycle_keeps_previous_snapshot() {
    let dir = TempDir::new().unwrap();
    let (engine, position_feed, _, _) = build_engine(
        &dir,
        vec![manifest("ABC-123")],
        vec![position("ABC-123", -17.5, -63.5)],
    );

    let good = engine.current_snapshot().await;
    assert_eq!(good.len(), 1);

    position_feed.fail.store(true, Ordering::SeqCst);
    assert!(!engine.trigger_cycle().await);

    // Stale-but-available: the degraded read serves the last good batch
    let stale = engine.current_snapshot().await;
    assert_eq!(stale.len(), 1);
}

#[tokio::test]
async fn test_truck_without_position_is_skipped() {
    let dir = TempDir::new().unwrap();
    let (engine, _, _, _) = build_engine(
        &dir,
        vec![manifest("ABC-123"), manifest("NO-GPS-1")],
        vec![position("ABC-123", -17.5, -63.5)],
    );

    let records = engine.current_snapshot().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].vehicle_id.as_str(), "ABC-123");
}

/// Walks one truck through the whole derivation with an explicit clock:
/// first detection pins the wait start, and the alert level climbs through
/// the thresholds as the clock advances, with the start never moving.
#[tokio::test]
async fn test_alert_ladder_with_simulated_clock() {
    let index = GeofenceIndex::build(vec![GeofenceRow {
        level: "DOCKS".to_string(),
        name: "DOCK - 7 - PLANTA SANTA CRUZ".to_string(),
        points: "-17.6 -63.6, -17.6 -63.4, -17.4 -63.4, -17.4 -63.6".to_string(),
    }]);
    let store = MemoryStore::new();
    let thresholds = AlertThresholds::default();
    let snapshot = manifest("ABC-123");
    let t0 = Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap();

    let mut expectations = vec![
        (t0, 0i64, AlertLevel::Normal),
        (t0 + ChronoDuration::hours(5), 300, AlertLevel::Attention),
        (t0 + ChronoDuration::hours(9), 540, AlertLevel::Warning),
        (t0 + ChronoDuration::hours(49), 2940, AlertLevel::Critical),
    ];

    for (now, expected_minutes, expected_level) in expectations.drain(..) {
        let containment = resolver::resolve(&index, None, Point::new(-17.5, -63.5));
        let (progress_pct, delivery_state) = progress::evaluate(&containment);
        assert_eq!(progress_pct, 20.0);
        assert_eq!(delivery_state, DeliveryState::Unloading);

        let persisted_start = store
            .get(&snapshot.vehicle_id, &snapshot.manifest_id)
            .await
            .unwrap()
            .and_then(|r| r.wait_started_at);

        let assessment = wait_time::assess(
            &snapshot.status,
            "SALIDA",
            &containment,
            delivery_state,
            None,
            persisted_start,
            &thresholds,
            now,
        );

        assert_eq!(assessment.wait_minutes, expected_minutes, "at {now}");
        assert_eq!(assessment.alert_level, expected_level, "at {now}");
        assert_eq!(assessment.wait_started_at, Some(t0), "wait start must stay pinned");

        let record = TrackingRecord {
            vehicle_id: snapshot.vehicle_id.clone(),
            manifest_id: snapshot.manifest_id.clone(),
            destination_id: snapshot.destination_id.clone(),
            origin: snapshot.origin.clone(),
            product: snapshot.product.clone(),
            status: snapshot.status.clone(),
            latitude: -17.5,
            longitude: -63.5,
            speed_kmh: 0.0,
            containment,
            progress_pct,
            delivery_state,
            wait_started_at: assessment.wait_started_at,
            wait_minutes: assessment.wait_minutes,
            discharge_state: assessment.discharge_state,
            alert_level: assessment.alert_level,
            persisted: true,
            processed_at: now,
        };
        store.upsert(&record).await.unwrap();
    }

    let final_row = store
        .get(&snapshot.vehicle_id, &snapshot.manifest_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(final_row.wait_started_at, Some(t0));
    assert_eq!(final_row.alert_level, AlertLevel::Critical);
}

#[tokio::test]
async fn test_alert_views_over_snapshot() {
    let dir = TempDir::new().unwrap();
    let (engine, _, _, _) = build_engine(
        &dir,
        vec![manifest("ABC-123")],
        vec![position("ABC-123", -17.5, -63.5)],
    );

    let summary = engine.alert_summary().await;
    assert_eq!(summary.total_waiting, 0);

    let dashboard = engine.alert_dashboard().await;
    assert!(dashboard.critical.is_empty());
    assert!(dashboard.recommendations.is_empty());

    let stats = engine.dashboard_stats().await;
    assert_eq!(stats.total_trucks, 1);
    assert_eq!(stats.discharging, 1);
    assert_eq!(stats.level_counts.get("DOCKS"), Some(&1));

    let health = engine.health();
    assert_eq!(health.geofence_regions, 2);
    assert_eq!(health.cache_records, 1);
    assert!(!health.cycle_in_flight);
}
