//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use crate::domain::types::{AlertLevel, HierarchyLevel};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Wait-time thresholds (hours) for alert classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    #[serde(default = "default_attention_hours")]
    pub attention_hours: f64,
    #[serde(default = "default_warning_hours")]
    pub warning_hours: f64,
    #[serde(default = "default_critical_hours")]
    pub critical_hours: f64,
}

fn default_attention_hours() -> f64 {
    4.0
}

fn default_warning_hours() -> f64 {
    8.0
}

fn default_critical_hours() -> f64 {
    48.0
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            attention_hours: default_attention_hours(),
            warning_hours: default_warning_hours(),
            critical_hours: default_critical_hours(),
        }
    }
}

impl AlertThresholds {
    /// Classify a waiting time into an alert level
    pub fn classify(&self, wait_minutes: i64) -> AlertLevel {
        let hours = wait_minutes as f64 / 60.0;
        if hours >= self.critical_hours {
            AlertLevel::Critical
        } else if hours >= self.warning_hours {
            AlertLevel::Warning
        } else if hours >= self.attention_hours {
            AlertLevel::Attention
        } else {
            AlertLevel::Normal
        }
    }
}

/// Expected region name per hierarchy level for one delivery destination
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DestinationProfile {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub distribution_center: Option<String>,
    #[serde(default)]
    pub track_and_trace: Option<String>,
    #[serde(default)]
    pub docks: Option<String>,
}

impl DestinationProfile {
    /// The region name expected at a hierarchy level, if mapped
    pub fn expected(&self, level: HierarchyLevel) -> Option<&str> {
        match level {
            HierarchyLevel::City => self.city.as_deref(),
            HierarchyLevel::DistributionCenter => self.distribution_center.as_deref(),
            HierarchyLevel::TrackAndTrace => self.track_and_trace.as_deref(),
            HierarchyLevel::Docks => self.docks.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SiteConfig {
    #[serde(default = "default_site_id")]
    pub id: String,
}

fn default_site_id() -> String {
    "fleetwatch".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionsConfig {
    pub base_url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_feed_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestsConfig {
    pub base_url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_feed_timeout_secs")]
    pub timeout_secs: u64,
    /// Status meaning "in motion / departed"; anything else holds the truck
    #[serde(default = "default_motion_status")]
    pub motion_status: String,
    /// Statuses meaning the manifest reached its next leg and is no longer active
    #[serde(default)]
    pub terminal_statuses: Vec<String>,
}

fn default_feed_timeout_secs() -> u64 {
    30
}

fn default_motion_status() -> String {
    "SALIDA".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GeofencesConfig {
    #[serde(default = "default_geofences_path")]
    pub path: String,
}

fn default_geofences_path() -> String {
    "data/geofences.json".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct HistoryConfig {
    /// Empty path disables the historical wait-start import
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_cache_ttl_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CycleConfig {
    #[serde(default = "default_cycle_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_cycle_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_cycle_interval_secs() -> u64 {
    300
}

fn default_cycle_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    /// File path for per-cycle tracking records (JSONL format)
    #[serde(default = "default_egress_file")]
    pub file: String,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self { file: default_egress_file() }
    }
}

fn default_egress_file() -> String {
    "tracking.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DestinationEntry {
    pub id: String,
    #[serde(flatten)]
    pub profile: DestinationProfile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub site: SiteConfig,
    pub positions: PositionsConfig,
    pub manifests: ManifestsConfig,
    #[serde(default)]
    pub geofences: GeofencesConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub alerts: AlertThresholds,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub cycle: CycleConfig,
    #[serde(default)]
    pub egress: EgressConfig,
    #[serde(default)]
    pub destinations: Vec<DestinationEntry>,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    site_id: String,
    positions_base_url: String,
    positions_token: String,
    positions_timeout_secs: u64,
    manifests_base_url: String,
    manifests_token: String,
    manifests_timeout_secs: u64,
    motion_status: String,
    terminal_statuses: Vec<String>,
    geofences_path: String,
    history_path: String,
    alert_thresholds: AlertThresholds,
    cache_ttl_secs: u64,
    cycle_interval_secs: u64,
    cycle_timeout_secs: u64,
    egress_file: String,
    destinations: HashMap<String, DestinationProfile>,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_id: default_site_id(),
            positions_base_url: "http://localhost:8081/api".to_string(),
            positions_token: String::new(),
            positions_timeout_secs: default_feed_timeout_secs(),
            manifests_base_url: "http://localhost:8082/api".to_string(),
            manifests_token: String::new(),
            manifests_timeout_secs: default_feed_timeout_secs(),
            motion_status: default_motion_status(),
            terminal_statuses: Vec::new(),
            geofences_path: default_geofences_path(),
            history_path: String::new(),
            alert_thresholds: AlertThresholds::default(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cycle_interval_secs: default_cycle_interval_secs(),
            cycle_timeout_secs: default_cycle_timeout_secs(),
            egress_file: default_egress_file(),
            destinations: Self::default_destinations(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Built-in profiles for the three brewery plants served by default
    fn default_destinations() -> HashMap<String, DestinationProfile> {
        let mut destinations = HashMap::new();
        destinations.insert(
            "Cerveceria SCZ".to_string(),
            DestinationProfile {
                city: Some("SANTA CRUZ".to_string()),
                distribution_center: Some("PLANTA SANTA CRUZ".to_string()),
                track_and_trace: Some("TYT - PLANTA SANTA CRUZ".to_string()),
                docks: Some("DOCK - 7 - PLANTA SANTA CRUZ".to_string()),
            },
        );
        destinations.insert(
            "Cerveceria LPZ".to_string(),
            DestinationProfile {
                city: Some("LA PAZ".to_string()),
                distribution_center: Some("PLANTA LA PAZ".to_string()),
                track_and_trace: Some("TYT - PLANTA LA PAZ".to_string()),
                docks: Some("DOCK - 3 - PLANTA LA PAZ".to_string()),
            },
        );
        destinations.insert(
            "Cerveceria CBBA".to_string(),
            DestinationProfile {
                city: Some("COCHABAMBA".to_string()),
                distribution_center: Some("PLANTA COCHABAMBA".to_string()),
                track_and_trace: Some("TYT - PLANTA COCHABAMBA".to_string()),
                docks: Some("DOCK - 5 - PLANTA COCHABAMBA".to_string()),
            },
        );
        destinations
    }

    /// Determine config file path from args or environment
    pub fn resolve_config_path(args: &[String]) -> String {
        for (i, arg) in args.iter().enumerate() {
            if arg == "--config" {
                if let Some(path) = args.get(i + 1) {
                    return path.clone();
                }
            }
            if let Some(path) = arg.strip_prefix("--config=") {
                return path.to_string();
            }
        }

        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let mut destinations = Self::default_destinations();
        for entry in toml_config.destinations {
            destinations.insert(entry.id, entry.profile);
        }

        Ok(Self {
            site_id: toml_config.site.id,
            positions_base_url: toml_config.positions.base_url,
            positions_token: toml_config.positions.token,
            positions_timeout_secs: toml_config.positions.timeout_secs,
            manifests_base_url: toml_config.manifests.base_url,
            manifests_token: toml_config.manifests.token,
            manifests_timeout_secs: toml_config.manifests.timeout_secs,
            motion_status: toml_config.manifests.motion_status,
            terminal_statuses: toml_config.manifests.terminal_statuses,
            geofences_path: toml_config.geofences.path,
            history_path: toml_config.history.path,
            alert_thresholds: toml_config.alerts,
            cache_ttl_secs: toml_config.cache.ttl_secs,
            cycle_interval_secs: toml_config.cycle.interval_secs,
            cycle_timeout_secs: toml_config.cycle.timeout_secs,
            egress_file: toml_config.egress.file,
            destinations,
            config_file: path.display().to_string(),
        })
    }

    /// Load configuration - tries the TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Look up the destination profile for a destination id
    pub fn destination_profile(&self, destination_id: &str) -> Option<&DestinationProfile> {
        self.destinations.get(destination_id)
    }

    // Getters for all config fields
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn positions_base_url(&self) -> &str {
        &self.positions_base_url
    }

    pub fn positions_token(&self) -> &str {
        &self.positions_token
    }

    pub fn positions_timeout_secs(&self) -> u64 {
        self.positions_timeout_secs
    }

    pub fn manifests_base_url(&self) -> &str {
        &self.manifests_base_url
    }

    pub fn manifests_token(&self) -> &str {
        &self.manifests_token
    }

    pub fn manifests_timeout_secs(&self) -> u64 {
        self.manifests_timeout_secs
    }

    pub fn motion_status(&self) -> &str {
        &self.motion_status
    }

    pub fn terminal_statuses(&self) -> &[String] {
        &self.terminal_statuses
    }

    pub fn geofences_path(&self) -> &str {
        &self.geofences_path
    }

    pub fn history_path(&self) -> &str {
        &self.history_path
    }

    pub fn alert_thresholds(&self) -> AlertThresholds {
        self.alert_thresholds
    }

    pub fn cache_ttl_secs(&self) -> u64 {
        self.cache_ttl_secs
    }

    pub fn cycle_interval_secs(&self) -> u64 {
        self.cycle_interval_secs
    }

    pub fn cycle_timeout_secs(&self) -> u64 {
        self.cycle_timeout_secs
    }

    pub fn egress_file(&self) -> &str {
        &self.egress_file
    }

    pub fn destinations(&self) -> &HashMap<String, DestinationProfile> {
        &self.destinations
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }
}
