//! Shared types for the fleet tracking core

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Newtype wrapper for vehicle plates to provide type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub String);

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl VehicleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Newtype wrapper for delivery manifest numbers to provide type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub String);

impl std::fmt::Display for ManifestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ManifestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Geofence hierarchy levels, most specific first.
///
/// Matching precedence runs Docks → City; delivery progress accumulates in
/// the opposite direction (City → Docks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HierarchyLevel {
    Docks,
    TrackAndTrace,
    DistributionCenter,
    City,
}

impl HierarchyLevel {
    /// All levels in matching precedence order (most specific first)
    pub const MATCH_PRECEDENCE: [HierarchyLevel; 4] = [
        HierarchyLevel::Docks,
        HierarchyLevel::TrackAndTrace,
        HierarchyLevel::DistributionCenter,
        HierarchyLevel::City,
    ];

    /// All levels in progress accumulation order (least specific first)
    pub const PROGRESS_ORDER: [HierarchyLevel; 4] = [
        HierarchyLevel::City,
        HierarchyLevel::DistributionCenter,
        HierarchyLevel::TrackAndTrace,
        HierarchyLevel::Docks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HierarchyLevel::Docks => "DOCKS",
            HierarchyLevel::TrackAndTrace => "TRACK_AND_TRACE",
            HierarchyLevel::DistributionCenter => "DISTRIBUTION_CENTER",
            HierarchyLevel::City => "CITY",
        }
    }

    /// Stable index for fixed-size per-level storage
    #[inline]
    pub fn idx(&self) -> usize {
        match self {
            HierarchyLevel::Docks => 0,
            HierarchyLevel::TrackAndTrace => 1,
            HierarchyLevel::DistributionCenter => 2,
            HierarchyLevel::City => 3,
        }
    }
}

impl std::str::FromStr for HierarchyLevel {
    type Err = String;

    /// Accepts the canonical names plus the spellings seen in geofence
    /// definition exports ("TRACK AND TRACE", "CITIES").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DOCKS" | "DOCK" => Ok(HierarchyLevel::Docks),
            "TRACK_AND_TRACE" | "TRACK AND TRACE" | "TYT" => Ok(HierarchyLevel::TrackAndTrace),
            "DISTRIBUTION_CENTER" | "DISTRIBUTION CENTER" => Ok(HierarchyLevel::DistributionCenter),
            "CITY" | "CITIES" => Ok(HierarchyLevel::City),
            other => Err(format!("unknown hierarchy level: {other}")),
        }
    }
}

/// Whether a point fell inside some region at a given hierarchy level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainmentStatus {
    Absent,
    Present(String),
}

impl ContainmentStatus {
    #[inline]
    pub fn is_present(&self) -> bool {
        matches!(self, ContainmentStatus::Present(_))
    }

    pub fn region_name(&self) -> Option<&str> {
        match self {
            ContainmentStatus::Present(name) => Some(name),
            ContainmentStatus::Absent => None,
        }
    }
}

/// Per-level containment statuses for one truck position.
///
/// Recomputed every cycle; only its derived effects are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainmentResult {
    statuses: [ContainmentStatus; 4],
}

impl Default for ContainmentResult {
    fn default() -> Self {
        Self {
            statuses: [
                ContainmentStatus::Absent,
                ContainmentStatus::Absent,
                ContainmentStatus::Absent,
                ContainmentStatus::Absent,
            ],
        }
    }
}

impl ContainmentResult {
    pub fn get(&self, level: HierarchyLevel) -> &ContainmentStatus {
        &self.statuses[level.idx()]
    }

    pub fn set(&mut self, level: HierarchyLevel, status: ContainmentStatus) {
        self.statuses[level.idx()] = status;
    }

    #[inline]
    pub fn is_present(&self, level: HierarchyLevel) -> bool {
        self.statuses[level.idx()].is_present()
    }

    /// The most specific level containing the point, if any
    pub fn most_specific_present(&self) -> Option<HierarchyLevel> {
        HierarchyLevel::MATCH_PRECEDENCE.into_iter().find(|level| self.is_present(*level))
    }

    /// True when the point is inside a region at every level
    pub fn all_present(&self) -> bool {
        self.statuses.iter().all(|s| s.is_present())
    }

    pub fn present_count(&self) -> usize {
        self.statuses.iter().filter(|s| s.is_present()).count()
    }
}

/// Coarse label for where in the delivery journey a truck currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryState {
    InTransit,
    InCity,
    InDistributionCenter,
    InUnloadZone,
    Unloading,
    UnloadConfirmed,
}

impl DeliveryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryState::InTransit => "IN_TRANSIT",
            DeliveryState::InCity => "IN_CITY",
            DeliveryState::InDistributionCenter => "IN_DISTRIBUTION_CENTER",
            DeliveryState::InUnloadZone => "IN_UNLOAD_ZONE",
            DeliveryState::Unloading => "UNLOADING",
            DeliveryState::UnloadConfirmed => "UNLOAD_CONFIRMED",
        }
    }

    /// States that count as being in the discharge area for wait tracking
    #[inline]
    pub fn in_discharge_zone(&self) -> bool {
        matches!(
            self,
            DeliveryState::InUnloadZone | DeliveryState::Unloading | DeliveryState::UnloadConfirmed
        )
    }
}

/// Display label for the discharge situation, independent of alert level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DischargeState {
    /// Manifest status is something other than the in-motion status
    HeldByStatus(String),
    AtDocks,
    AtTrackAndTrace,
    Unloading,
    UnloadZone,
    NotWaiting,
}

impl std::fmt::Display for DischargeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DischargeState::HeldByStatus(status) => write!(f, "STATUS_{status}"),
            DischargeState::AtDocks => write!(f, "AT_DOCKS"),
            DischargeState::AtTrackAndTrace => write!(f, "AT_TRACK_AND_TRACE"),
            DischargeState::Unloading => write!(f, "UNLOADING"),
            DischargeState::UnloadZone => write!(f, "UNLOAD_ZONE"),
            DischargeState::NotWaiting => write!(f, "NOT_WAITING"),
        }
    }
}

/// Wait severity classification, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    Normal,
    Attention,
    Warning,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Normal => "NORMAL",
            AlertLevel::Attention => "ATTENTION",
            AlertLevel::Warning => "WARNING",
            AlertLevel::Critical => "CRITICAL",
        }
    }
}

/// One active delivery manifest row from the manifest feed (per-cycle input)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruckSnapshot {
    pub vehicle_id: VehicleId,
    pub manifest_id: ManifestId,
    pub destination_id: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub product_code: String,
    pub status: String,
    #[serde(default)]
    pub departed_at: Option<DateTime<Utc>>,
}

/// Latest known position report for one vehicle (per-cycle input)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehiclePosition {
    pub vehicle_id: VehicleId,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub speed_kmh: f64,
    #[serde(default)]
    pub heading: Option<i32>,
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Fully derived tracking state for one truck, keyed by (vehicle, manifest).
///
/// `wait_started_at` is a monotonic floor: once set for a key it is preserved
/// across upserts and may only move earlier via historical data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingRecord {
    pub vehicle_id: VehicleId,
    pub manifest_id: ManifestId,
    pub destination_id: String,
    pub origin: String,
    pub product: String,
    pub status: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_kmh: f64,
    pub containment: ContainmentResult,
    pub progress_pct: f64,
    pub delivery_state: DeliveryState,
    pub wait_started_at: Option<DateTime<Utc>>,
    pub wait_minutes: i64,
    pub discharge_state: DischargeState,
    pub alert_level: AlertLevel,
    /// False when the store upsert failed and the row only lives in the cache
    pub persisted: bool,
    pub processed_at: DateTime<Utc>,
}

impl TrackingRecord {
    /// Waiting time in hours, rounded to two decimals for display
    pub fn wait_hours(&self) -> f64 {
        (self.wait_minutes as f64 / 60.0 * 100.0).round() / 100.0
    }
}
