//! Delivery progress derivation from containment results
//!
//! Each present hierarchy level contributes a fixed weight independently of
//! the others, and the delivery state follows the most specific present
//! level. The levels are evaluated outside-in, so a later (more specific)
//! match overwrites the state label. When every level is present the result
//! is forced to a confirmed unload regardless of the weighted sum. Sums for
//! non-adjacent level combinations are emitted as-is; do not reorder or cap
//! the intermediate accumulation.

use crate::domain::types::{ContainmentResult, DeliveryState, HierarchyLevel};

/// Progress weight contributed by each present level
pub fn level_weight(level: HierarchyLevel) -> f64 {
    match level {
        HierarchyLevel::City => 25.0,
        HierarchyLevel::DistributionCenter => 25.0,
        HierarchyLevel::TrackAndTrace => 30.0,
        HierarchyLevel::Docks => 20.0,
    }
}

/// Delivery state when the given level is the most specific one present
fn level_state(level: HierarchyLevel) -> DeliveryState {
    match level {
        HierarchyLevel::City => DeliveryState::InCity,
        HierarchyLevel::DistributionCenter => DeliveryState::InDistributionCenter,
        HierarchyLevel::TrackAndTrace => DeliveryState::InUnloadZone,
        HierarchyLevel::Docks => DeliveryState::Unloading,
    }
}

/// Derive `(progress_pct, delivery_state)` from a containment result
pub fn evaluate(containment: &ContainmentResult) -> (f64, DeliveryState) {
    let mut pct = 0.0;
    let mut state = DeliveryState::InTransit;

    for level in HierarchyLevel::PROGRESS_ORDER {
        if containment.is_present(level) {
            pct += level_weight(level);
            state = level_state(level);
        }
    }

    if containment.all_present() {
        return (100.0, DeliveryState::UnloadConfirmed);
    }

    (pct.min(100.0), state)
}
