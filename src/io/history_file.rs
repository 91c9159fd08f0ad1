//! Historical discharge-zone entry import
//!
//! Yard systems export raw entry events per vehicle. Only entries into
//! discharge-related regions matter for wait tracking; the loader filters
//! those and keeps the earliest entry per vehicle, which becomes the floor
//! for `wait_started_at` resolution.

use crate::domain::types::{HierarchyLevel, VehicleId};
use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Timestamp format used by the yard export
const ENTRY_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// One raw entry event row
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRow {
    pub vehicle_id: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub level: String,
    pub entered_at: String,
}

/// Earliest known discharge-zone entry per vehicle
#[derive(Debug, Default)]
pub struct HistoricalWaits {
    earliest: FxHashMap<String, DateTime<Utc>>,
}

impl HistoricalWaits {
    /// Load and reduce the export file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read history file {}", path.display()))?;

        let rows: Vec<HistoryRow> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse history file {}", path.display()))?;

        Ok(Self::from_rows(rows))
    }

    /// Reduce raw rows to the earliest discharge-zone entry per vehicle
    pub fn from_rows(rows: Vec<HistoryRow>) -> Self {
        let mut earliest: FxHashMap<String, DateTime<Utc>> = FxHashMap::default();

        for row in rows {
            if row.vehicle_id.trim().is_empty() {
                continue;
            }

            let level = row.level.parse::<HierarchyLevel>().ok();
            if !is_discharge_region(&row.region, level) {
                continue;
            }

            let entered_at = match NaiveDateTime::parse_from_str(&row.entered_at, ENTRY_FORMAT) {
                Ok(naive) => naive.and_utc(),
                Err(e) => {
                    warn!(
                        vehicle = %row.vehicle_id,
                        raw = %row.entered_at,
                        error = %e,
                        "history_timestamp_unparseable"
                    );
                    continue;
                }
            };

            earliest
                .entry(row.vehicle_id)
                .and_modify(|current| {
                    if entered_at < *current {
                        *current = entered_at;
                    }
                })
                .or_insert(entered_at);
        }

        info!(vehicles = %earliest.len(), "historical_waits_loaded");
        Self { earliest }
    }

    /// Earliest discharge-zone entry for a vehicle, if known
    pub fn lookup(&self, vehicle: &VehicleId) -> Option<DateTime<Utc>> {
        self.earliest.get(vehicle.as_str()).copied()
    }

    pub fn len(&self) -> usize {
        self.earliest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.earliest.is_empty()
    }
}

/// Whether a region name marks a discharge area.
///
/// Dock and track-and-trace zones qualify by name; plant regions qualify only
/// at the distribution-center level.
fn is_discharge_region(region: &str, level: Option<HierarchyLevel>) -> bool {
    let upper = region.to_uppercase();
    if upper.contains("DOCK") || upper.contains("TRACK") || upper.contains("TYT") {
        return true;
    }
    upper.contains("PLANTA") && level == Some(HierarchyLevel::DistributionCenter)
}
