//! Services - business logic and state management
//!
//! This module contains the core pipeline services:
//! - `engine` - processing cycle orchestrator and read-side views
//! - `geofence_index` - named regions grouped by hierarchy level
//! - `resolver` - destination-aware containment resolution
//! - `wait_time` - discharge waiting-time assessment
//! - `store` - persistence gateway contract and in-memory store
//! - `cache` - short-TTL snapshot cache
//! - `alerts` - aggregation, prioritization and recommendations

pub mod alerts;
pub mod cache;
pub mod engine;
pub mod geofence_index;
pub mod resolver;
pub mod store;
pub mod wait_time;

pub use cache::TrackingCache;
pub use engine::TrackingEngine;
pub use geofence_index::{GeofenceIndex, Region};
pub use store::{MemoryStore, TrackingStore};
