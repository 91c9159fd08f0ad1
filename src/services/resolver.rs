//! Containment resolution with destination-aware matching
//!
//! Destination metadata is sometimes stale or incomplete, so resolution is
//! two-phase per hierarchy level: first only regions whose name matches the
//! destination profile's expected name (case-insensitive substring in either
//! direction, tolerating variants like "PLANTA SANTA CRUZ" vs "SANTA CRUZ"),
//! then a generic fallback over every region at the level. Without the first
//! phase a truck parked near an unrelated depot of the same level would be
//! mis-attributed.

use crate::domain::geometry::Point;
use crate::domain::types::{ContainmentResult, ContainmentStatus, HierarchyLevel};
use crate::infra::config::DestinationProfile;
use crate::services::geofence_index::GeofenceIndex;

/// Case-insensitive substring match in either direction
fn name_matches(expected: &str, actual: &str) -> bool {
    let expected = expected.to_uppercase();
    let actual = actual.to_uppercase();
    expected.contains(&actual) || actual.contains(&expected)
}

/// Resolve per-level containment for a position, honoring the destination
/// profile's expected region names when available
pub fn resolve(
    index: &GeofenceIndex,
    profile: Option<&DestinationProfile>,
    point: Point,
) -> ContainmentResult {
    let mut result = ContainmentResult::default();

    for level in HierarchyLevel::MATCH_PRECEDENCE {
        // Phase 1: regions named like the destination expects at this level
        if let Some(expected) = profile.and_then(|p| p.expected(level)) {
            let named_match = index
                .regions_at(level)
                .iter()
                .filter(|region| name_matches(expected, &region.name))
                .find(|region| region.contains(point));

            if let Some(region) = named_match {
                result.set(level, ContainmentStatus::Present(region.name.clone()));
                continue;
            }
        }

        // Phase 2: any region at this level, first containing wins
        if let Some(region) = index.first_containing(level, point) {
            result.set(level, ContainmentStatus::Present(region.name.clone()));
        }
    }

    result
}
