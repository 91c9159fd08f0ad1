//! Infrastructure - configuration and statistics
//!
//! - `config` - TOML configuration loading with defaults fallback
//! - `stats` - lock-free cycle statistics counters

pub mod config;
pub mod stats;

pub use config::{AlertThresholds, Config, DestinationProfile};
pub use stats::CycleStats;
