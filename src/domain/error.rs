//! Error taxonomy for the tracking pipeline
//!
//! Each component failure maps onto one of these variants so the cycle
//! orchestrator can decide whether to skip one item, skip one truck, or
//! abandon the cycle and leave the previous cache snapshot in place.

use std::time::Duration;
use thiserror::Error;

/// Failures talking to the position or manifest feed
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Request(String),
    #[error("feed returned HTTP status {0}")]
    Status(u16),
    #[error("feed payload malformed: {0}")]
    Malformed(String),
}

/// Failures at the persistence store boundary
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected record: {0}")]
    Rejected(String),
}

/// Failures affecting a single truck or a whole processing cycle
#[derive(Debug, Error)]
pub enum TrackingError {
    /// Malformed reference data (geofence row, destination mapping); the
    /// offending item is skipped and processing continues
    #[error("configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Unexpected failure deriving state for one truck; isolated to it
    #[error("computing state for {vehicle}: {reason}")]
    Compute { vehicle: String, reason: String },

    #[error("processing cycle exceeded {0:?}")]
    CycleTimeout(Duration),
}
