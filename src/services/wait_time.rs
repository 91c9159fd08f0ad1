//! Waiting-time assessment for discharge queues
//!
//! A truck is waiting for discharge when its manifest status is not the
//! in-motion status, when it sits inside a dock or track-and-trace region,
//! or when its delivery state already reads as a discharge state. The start
//! of the wait resolves in precedence order: historical import, previously
//! persisted record, then now (first observation). The assessment takes the
//! clock as an argument so tests can drive a simulated one.
//!
//! The start time is never cleared when a truck leaves and later re-enters
//! the waiting condition; it is set once and preserved by the store's
//! coalescing upsert.

use crate::domain::types::{
    AlertLevel, ContainmentResult, DeliveryState, DischargeState, HierarchyLevel,
};
use crate::infra::config::AlertThresholds;
use chrono::{DateTime, Utc};

/// Outcome of one waiting-time evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct WaitAssessment {
    pub waiting: bool,
    pub wait_started_at: Option<DateTime<Utc>>,
    pub wait_minutes: i64,
    pub discharge_state: DischargeState,
    pub alert_level: AlertLevel,
}

impl WaitAssessment {
    /// The assessment for a truck that is not waiting at all
    fn not_waiting(discharge_state: DischargeState) -> Self {
        Self {
            waiting: false,
            wait_started_at: None,
            wait_minutes: 0,
            discharge_state,
            alert_level: AlertLevel::Normal,
        }
    }
}

/// Evaluate the waiting condition and classify the elapsed wait.
///
/// `history_start` comes from the historical import (keyed by vehicle) and
/// `persisted_start` from the previously stored record for this
/// (vehicle, manifest) key; the caller passes None for either when its
/// source failed (safe fallback: treated as a first observation).
#[allow(clippy::too_many_arguments)]
pub fn assess(
    status: &str,
    motion_status: &str,
    containment: &ContainmentResult,
    delivery_state: DeliveryState,
    history_start: Option<DateTime<Utc>>,
    persisted_start: Option<DateTime<Utc>>,
    thresholds: &AlertThresholds,
    now: DateTime<Utc>,
) -> WaitAssessment {
    let held_by_status = status != motion_status;
    let in_docks = containment.is_present(HierarchyLevel::Docks);
    let in_track_and_trace = containment.is_present(HierarchyLevel::TrackAndTrace);

    let waiting =
        held_by_status || in_docks || in_track_and_trace || delivery_state.in_discharge_zone();

    let discharge_state = if held_by_status {
        DischargeState::HeldByStatus(status.to_string())
    } else if in_docks {
        DischargeState::AtDocks
    } else if in_track_and_trace {
        DischargeState::AtTrackAndTrace
    } else if matches!(delivery_state, DeliveryState::Unloading | DeliveryState::UnloadConfirmed) {
        DischargeState::Unloading
    } else if delivery_state == DeliveryState::InUnloadZone {
        DischargeState::UnloadZone
    } else {
        DischargeState::NotWaiting
    };

    if !waiting {
        return WaitAssessment::not_waiting(discharge_state);
    }

    let wait_started_at = history_start.or(persisted_start).unwrap_or(now);
    let wait_minutes = (now - wait_started_at).num_minutes().max(0);

    WaitAssessment {
        waiting: true,
        wait_started_at: Some(wait_started_at),
        wait_minutes,
        discharge_state,
        alert_level: thresholds.classify(wait_minutes),
    }
}
