//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `position_feed` - HTTP client for the fleet telemetry provider
//! - `manifest_feed` - HTTP client for the dispatch system
//! - `geofence_file` - geofence definition file loading
//! - `history_file` - historical discharge-entry import
//! - `egress` - tracking record output to file (JSONL format)

pub mod egress;
pub mod geofence_file;
pub mod history_file;
pub mod manifest_feed;
pub mod position_feed;

// Re-export commonly used types
pub use egress::Egress;
pub use geofence_file::GeofenceRow;
pub use history_file::HistoricalWaits;
pub use manifest_feed::{HttpManifestFeed, ManifestFeed};
pub use position_feed::{HttpPositionFeed, PositionFeed};
