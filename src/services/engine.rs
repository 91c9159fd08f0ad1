//! Processing cycle orchestration and read-side views
//!
//! The engine owns every shared piece of state as one context struct built at
//! startup: feeds, store, geofence index, historical waits, thresholds,
//! cache and stats. Cycles are mutually exclusive via an explicit lock so a
//! manual trigger and a scheduled run can never interleave writes for the
//! same key. Readers never take the cycle lock; they read the last-published
//! cache snapshot.

use crate::domain::error::TrackingError;
use crate::domain::geometry::Point;
use crate::domain::progress;
use crate::domain::types::{
    AlertLevel, DeliveryState, HierarchyLevel, TrackingRecord, TruckSnapshot, VehiclePosition,
};
use crate::infra::config::{AlertThresholds, Config};
use crate::infra::stats::CycleStats;
use crate::io::egress::Egress;
use crate::io::geofence_file;
use crate::io::history_file::HistoricalWaits;
use crate::io::manifest_feed::ManifestFeed;
use crate::io::position_feed::PositionFeed;
use crate::services::alerts::{self, AlertDashboard, AlertSummary, CriticalAlert};
use crate::services::cache::TrackingCache;
use crate::services::geofence_index::GeofenceIndex;
use crate::services::resolver;
use crate::services::store::TrackingStore;
use crate::services::wait_time;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Per-state and per-level truck counts for the overview page
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_trucks: usize,
    pub in_transit: usize,
    pub discharging: usize,
    pub critical_alerts: usize,
    pub warning_alerts: usize,
    pub average_progress_pct: f64,
    pub state_counts: HashMap<&'static str, usize>,
    pub level_counts: HashMap<&'static str, usize>,
    pub generated_at: DateTime<Utc>,
}

/// Component readiness snapshot
#[derive(Debug, Clone, Serialize)]
pub struct EngineHealth {
    pub geofence_regions: usize,
    pub geofence_valid: usize,
    pub history_vehicles: usize,
    pub cache_records: usize,
    pub cache_age_secs: Option<u64>,
    pub cycle_in_flight: bool,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub last_cycle_ms: u64,
}

/// The tracking pipeline context
pub struct TrackingEngine {
    config: Config,
    positions: Arc<dyn PositionFeed>,
    manifests: Arc<dyn ManifestFeed>,
    store: Arc<dyn TrackingStore>,
    geofences: RwLock<GeofenceIndex>,
    history: RwLock<HistoricalWaits>,
    thresholds: RwLock<AlertThresholds>,
    cache: TrackingCache,
    cycle_lock: tokio::sync::Mutex<()>,
    egress: Egress,
    stats: CycleStats,
}

impl TrackingEngine {
    /// Build the engine, loading reference data from the configured paths.
    /// Missing or malformed reference files log an error and leave the
    /// corresponding table empty; they never abort startup.
    pub fn new(
        config: Config,
        positions: Arc<dyn PositionFeed>,
        manifests: Arc<dyn ManifestFeed>,
        store: Arc<dyn TrackingStore>,
    ) -> Self {
        let geofences = match geofence_file::load_rows(config.geofences_path()) {
            Ok(rows) => GeofenceIndex::build(rows),
            Err(e) => {
                error!(path = %config.geofences_path(), error = %e, "geofence_load_failed");
                GeofenceIndex::empty()
            }
        };

        let history = if config.history_path().is_empty() {
            HistoricalWaits::default()
        } else {
            match HistoricalWaits::load(config.history_path()) {
                Ok(history) => history,
                Err(e) => {
                    error!(path = %config.history_path(), error = %e, "history_load_failed");
                    HistoricalWaits::default()
                }
            }
        };

        let cache = TrackingCache::new(Duration::from_secs(config.cache_ttl_secs()));
        let egress = Egress::new(config.egress_file());
        let thresholds = config.alert_thresholds();

        Self {
            positions,
            manifests,
            store,
            geofences: RwLock::new(geofences),
            history: RwLock::new(history),
            thresholds: RwLock::new(thresholds),
            cache,
            cycle_lock: tokio::sync::Mutex::new(()),
            egress,
            stats: CycleStats::new(),
            config,
        }
    }

    /// Current per-truck records, cache-served when fresh.
    ///
    /// A stale cache triggers a synchronous cycle; if another caller already
    /// holds the cycle lock this waits for it and reuses its result.
    pub async fn current_snapshot(&self) -> Arc<Vec<TrackingRecord>> {
        if let Some(snapshot) = self.cache.fresh() {
            return snapshot.records;
        }

        let _guard = self.cycle_lock.lock().await;
        // A cycle may have finished while we waited for the lock
        if let Some(snapshot) = self.cache.fresh() {
            return snapshot.records;
        }

        if let Err(e) = self.run_cycle_locked().await {
            warn!(error = %e, "snapshot_refresh_failed");
        }

        // On failure the previous snapshot (possibly stale) stays authoritative
        self.cache.latest().map(|s| s.records).unwrap_or_else(|| Arc::new(Vec::new()))
    }

    /// Run one processing cycle now. Returns false without doing anything
    /// when a cycle is already in flight (idempotent under concurrent calls).
    ///
    /// On completion the cache is invalidated so the next read reflects
    /// fresh data instead of waiting out the TTL.
    pub async fn trigger_cycle(&self) -> bool {
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            info!("cycle_already_in_flight");
            return false;
        };

        let completed = self.run_cycle_locked().await.is_ok();
        if completed {
            self.cache.invalidate();
        }
        completed
    }

    /// Execute one cycle under the held cycle lock, bounded by the configured
    /// timeout. A failed or timed-out cycle leaves the cache untouched.
    async fn run_cycle_locked(&self) -> Result<usize, TrackingError> {
        let started = Instant::now();
        let cycle_id = Uuid::now_v7().to_string();
        let timeout = Duration::from_secs(self.config.cycle_timeout_secs());

        let outcome = match tokio::time::timeout(timeout, self.execute_cycle(&cycle_id)).await {
            Ok(result) => result,
            Err(_) => Err(TrackingError::CycleTimeout(timeout)),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(count) => {
                self.stats.record_cycle_completed(elapsed_ms);
                info!(cycle = %cycle_id, trucks = %count, elapsed_ms = %elapsed_ms, "cycle_completed");
            }
            Err(e) => {
                self.stats.record_cycle_failed();
                error!(cycle = %cycle_id, error = %e, elapsed_ms = %elapsed_ms, "cycle_failed");
            }
        }
        self.stats.report();

        outcome
    }

    async fn execute_cycle(&self, cycle_id: &str) -> Result<usize, TrackingError> {
        let (manifests, positions) =
            tokio::join!(self.manifests.fetch_active(), self.positions.fetch_all());
        // Either feed failing wholesale abandons the cycle; the previous
        // snapshot stays in place
        let manifests = manifests?;
        let positions = positions?;

        let by_vehicle: FxHashMap<&str, &VehiclePosition> =
            positions.iter().map(|p| (p.vehicle_id.as_str(), p)).collect();

        let now = Utc::now();
        let mut records = Vec::with_capacity(manifests.len());

        for manifest in &manifests {
            let Some(position) = by_vehicle.get(manifest.vehicle_id.as_str()).copied() else {
                warn!(vehicle = %manifest.vehicle_id, "no_position_this_cycle");
                self.stats.record_truck_skipped();
                continue;
            };

            match self.process_truck(manifest, position, now).await {
                Ok(record) => {
                    info!(
                        vehicle = %record.vehicle_id,
                        progress = %record.progress_pct,
                        state = %record.delivery_state.as_str(),
                        wait_minutes = %record.wait_minutes,
                        alert = %record.alert_level.as_str(),
                        "truck_processed"
                    );
                    self.stats.record_truck_processed();
                    records.push(record);
                }
                Err(e) => {
                    error!(vehicle = %manifest.vehicle_id, error = %e, "truck_processing_failed");
                    self.stats.record_truck_errored();
                }
            }
        }

        self.egress.write_records(&records);

        let summary = alerts::summarize(&records);
        if summary.total_waiting > 0 {
            info!(
                critical = %summary.critical,
                warning = %summary.warning,
                attention = %summary.attention,
                "waiting_alerts"
            );
        }

        let count = records.len();
        self.cache.publish(records, cycle_id.to_string());
        Ok(count)
    }

    /// Derive and persist the record for one truck. Store failures on lookup
    /// fall back to a first observation; failures on upsert keep the record
    /// in the snapshot unpersisted, to be retried next cycle.
    async fn process_truck(
        &self,
        manifest: &TruckSnapshot,
        position: &VehiclePosition,
        now: DateTime<Utc>,
    ) -> Result<TrackingRecord, TrackingError> {
        let prior = match self.store.get(&manifest.vehicle_id, &manifest.manifest_id).await {
            Ok(prior) => prior,
            Err(e) => {
                warn!(vehicle = %manifest.vehicle_id, error = %e, "prior_record_unavailable");
                None
            }
        };
        let persisted_start = prior.and_then(|p| p.wait_started_at);

        let mut record = {
            let index = self.geofences.read();
            let history = self.history.read();
            let thresholds = *self.thresholds.read();

            let profile = self.config.destination_profile(&manifest.destination_id);
            if profile.is_none() && !manifest.destination_id.is_empty() {
                warn!(
                    vehicle = %manifest.vehicle_id,
                    destination = %manifest.destination_id,
                    "destination_unmapped"
                );
            }

            let point = Point::new(position.latitude, position.longitude);
            let containment = resolver::resolve(&index, profile, point);
            let (progress_pct, delivery_state) = progress::evaluate(&containment);

            let assessment = wait_time::assess(
                &manifest.status,
                self.config.motion_status(),
                &containment,
                delivery_state,
                history.lookup(&manifest.vehicle_id),
                persisted_start,
                &thresholds,
                now,
            );

            TrackingRecord {
                vehicle_id: manifest.vehicle_id.clone(),
                manifest_id: manifest.manifest_id.clone(),
                destination_id: manifest.destination_id.clone(),
                origin: manifest.origin.clone(),
                product: manifest.product.clone(),
                status: manifest.status.clone(),
                latitude: position.latitude,
                longitude: position.longitude,
                speed_kmh: position.speed_kmh,
                containment,
                progress_pct,
                delivery_state,
                wait_started_at: assessment.wait_started_at,
                wait_minutes: assessment.wait_minutes,
                discharge_state: assessment.discharge_state,
                alert_level: assessment.alert_level,
                persisted: true,
                processed_at: now,
            }
        };

        if let Err(e) = self.store.upsert(&record).await {
            warn!(vehicle = %record.vehicle_id, error = %e, "record_upsert_failed");
            self.stats.record_store_failure();
            record.persisted = false;
        }

        Ok(record)
    }

    /// Alert counts over the current snapshot
    pub async fn alert_summary(&self) -> AlertSummary {
        let records = self.current_snapshot().await;
        alerts::summarize(&records)
    }

    /// Critical trucks sorted by priority over the current snapshot
    pub async fn critical_alerts(&self) -> Vec<CriticalAlert> {
        let records = self.current_snapshot().await;
        alerts::critical_alerts(&records)
    }

    /// Full alert dashboard payload over the current snapshot
    pub async fn alert_dashboard(&self) -> AlertDashboard {
        let records = self.current_snapshot().await;
        alerts::dashboard(&records)
    }

    /// Per-state and per-level truck counts over the current snapshot
    pub async fn dashboard_stats(&self) -> DashboardStats {
        let records = self.current_snapshot().await;

        let mut state_counts: HashMap<&'static str, usize> = HashMap::new();
        let mut level_counts: HashMap<&'static str, usize> = HashMap::new();
        let mut critical_alerts = 0;
        let mut warning_alerts = 0;

        for record in records.iter() {
            *state_counts.entry(record.delivery_state.as_str()).or_default() += 1;
            for level in HierarchyLevel::MATCH_PRECEDENCE {
                if record.containment.is_present(level) {
                    *level_counts.entry(level.as_str()).or_default() += 1;
                }
            }
            match record.alert_level {
                AlertLevel::Critical => critical_alerts += 1,
                AlertLevel::Warning => warning_alerts += 1,
                _ => {}
            }
        }

        let total = records.len();
        let average_progress_pct = if total == 0 {
            0.0
        } else {
            let avg = records.iter().map(|r| r.progress_pct).sum::<f64>() / total as f64;
            (avg * 100.0).round() / 100.0
        };

        DashboardStats {
            total_trucks: total,
            in_transit: records
                .iter()
                .filter(|r| r.delivery_state == DeliveryState::InTransit)
                .count(),
            discharging: records.iter().filter(|r| r.delivery_state.in_discharge_zone()).count(),
            critical_alerts,
            warning_alerts,
            average_progress_pct,
            state_counts,
            level_counts,
            generated_at: Utc::now(),
        }
    }

    /// Alert thresholds used by subsequent cycles
    pub fn configuration(&self) -> AlertThresholds {
        *self.thresholds.read()
    }

    /// Replace the alert thresholds; applies to subsequent cycles only
    /// (already-published records keep their classification)
    pub fn update_configuration(&self, thresholds: AlertThresholds) {
        *self.thresholds.write() = thresholds;
        info!(
            attention_hours = %thresholds.attention_hours,
            warning_hours = %thresholds.warning_hours,
            critical_hours = %thresholds.critical_hours,
            "alert_thresholds_updated"
        );
    }

    /// Reload geofence definitions from the configured file
    pub fn reload_geofences(&self) -> anyhow::Result<()> {
        let rows = geofence_file::load_rows(self.config.geofences_path())?;
        let index = GeofenceIndex::build(rows);
        info!(
            regions = %index.total_regions(),
            valid = %index.valid_regions(),
            "geofences_reloaded"
        );
        *self.geofences.write() = index;
        Ok(())
    }

    /// Reload the historical wait-start import from the configured file
    pub fn reload_history(&self) -> anyhow::Result<()> {
        if self.config.history_path().is_empty() {
            *self.history.write() = HistoricalWaits::default();
            return Ok(());
        }
        let history = HistoricalWaits::load(self.config.history_path())?;
        info!(vehicles = %history.len(), "history_reloaded");
        *self.history.write() = history;
        Ok(())
    }

    /// Drop the cached snapshot
    pub fn clear_cache(&self) {
        self.cache.invalidate();
        info!("cache_cleared");
    }

    /// Component readiness for monitoring
    pub fn health(&self) -> EngineHealth {
        let (geofence_regions, geofence_valid) = {
            let index = self.geofences.read();
            (index.total_regions(), index.valid_regions())
        };

        EngineHealth {
            geofence_regions,
            geofence_valid,
            history_vehicles: self.history.read().len(),
            cache_records: self.cache.latest().map(|s| s.records.len()).unwrap_or(0),
            cache_age_secs: self.cache.age_secs(),
            cycle_in_flight: self.cycle_lock.try_lock().is_err(),
            cycles_completed: self.stats.cycles_completed(),
            cycles_failed: self.stats.cycles_failed(),
            last_cycle_ms: self.stats.last_cycle_ms(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
