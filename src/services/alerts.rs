//! Alert aggregation, prioritization and recommendations
//!
//! Works over the current cycle's records: counts per alert level and per
//! destination, a 0-100 priority score for each critical truck, and
//! rule-based operational recommendations for the dispatch desk.

use crate::domain::types::{AlertLevel, HierarchyLevel, TrackingRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Escalation is flagged past this waiting time
const ESCALATION_HOURS: f64 = 72.0;

/// Counts of trucks per alert level
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertSummary {
    pub total_waiting: usize,
    pub attention: usize,
    pub warning: usize,
    pub critical: usize,
}

/// Alert counts for one destination
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DestinationBreakdown {
    pub attention: usize,
    pub warning: usize,
    pub critical: usize,
    pub total: usize,
}

/// One critical truck with its computed priority
#[derive(Debug, Clone, Serialize)]
pub struct CriticalAlert {
    pub vehicle_id: String,
    pub manifest_id: String,
    pub destination_id: String,
    pub product: String,
    pub wait_hours: f64,
    pub wait_started_at: Option<DateTime<Utc>>,
    pub delivery_state: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_kmh: f64,
    /// Present hierarchy levels with the matched region name
    pub active_regions: Vec<String>,
    pub escalation_required: bool,
    pub priority: u8,
}

/// Roll-up figures for the dispatch overview
#[derive(Debug, Clone, Serialize)]
pub struct ExecutiveSummary {
    pub trucks_with_alerts: usize,
    pub alert_share_pct: f64,
    pub average_waiting_hours: f64,
    pub busiest_destination: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    UrgentEscalation,
    CapacityReview,
    DockAllocation,
}

/// A rule-triggered operational recommendation
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub title: String,
    pub detail: String,
    pub action: String,
}

/// Full alert view over one cycle's records
#[derive(Debug, Clone, Serialize)]
pub struct AlertDashboard {
    pub summary: AlertSummary,
    pub by_destination: HashMap<String, DestinationBreakdown>,
    pub critical: Vec<CriticalAlert>,
    pub executive: ExecutiveSummary,
    pub recommendations: Vec<Recommendation>,
    pub generated_at: DateTime<Utc>,
}

/// Count trucks per alert level
pub fn summarize(records: &[TrackingRecord]) -> AlertSummary {
    let mut summary = AlertSummary::default();
    for record in records {
        match record.alert_level {
            AlertLevel::Normal => continue,
            AlertLevel::Attention => summary.attention += 1,
            AlertLevel::Warning => summary.warning += 1,
            AlertLevel::Critical => summary.critical += 1,
        }
        summary.total_waiting += 1;
    }
    summary
}

/// Alert counts per destination, over trucks with a non-normal level
pub fn by_destination(records: &[TrackingRecord]) -> HashMap<String, DestinationBreakdown> {
    let mut breakdown: HashMap<String, DestinationBreakdown> = HashMap::new();

    for record in records {
        if record.alert_level == AlertLevel::Normal {
            continue;
        }
        let entry = breakdown.entry(record.destination_id.clone()).or_default();
        match record.alert_level {
            AlertLevel::Attention => entry.attention += 1,
            AlertLevel::Warning => entry.warning += 1,
            AlertLevel::Critical => entry.critical += 1,
            AlertLevel::Normal => unreachable!(),
        }
        entry.total += 1;
    }

    breakdown
}

/// Priority score (0-100) for one truck.
///
/// Sum of a wait-time bucket, a geofence bucket, a speed bucket and a
/// product-tag bucket, capped at 100.
pub fn priority_score(record: &TrackingRecord) -> u8 {
    let mut priority = 0u32;

    let wait_hours = record.wait_minutes as f64 / 60.0;
    priority += if wait_hours > 72.0 {
        40
    } else if wait_hours > 48.0 {
        30
    } else if wait_hours > 24.0 {
        20
    } else {
        10
    };

    if record.containment.is_present(HierarchyLevel::Docks) {
        priority += 30;
    } else if record.containment.is_present(HierarchyLevel::TrackAndTrace) {
        priority += 25;
    } else if record.containment.is_present(HierarchyLevel::DistributionCenter) {
        priority += 15;
    }

    if record.speed_kmh == 0.0 {
        priority += 20;
    } else if record.speed_kmh < 5.0 {
        priority += 15;
    }

    let product = record.product.to_uppercase();
    if product.contains("PREMIUM") || product.contains("SPECIAL") {
        priority += 10;
    } else if product.contains("URGENT") {
        priority += 8;
    }

    priority.min(100) as u8
}

/// Critical trucks with details, sorted by priority descending
pub fn critical_alerts(records: &[TrackingRecord]) -> Vec<CriticalAlert> {
    let mut alerts: Vec<CriticalAlert> = records
        .iter()
        .filter(|r| r.alert_level == AlertLevel::Critical)
        .map(|record| {
            let active_regions = HierarchyLevel::MATCH_PRECEDENCE
                .into_iter()
                .filter_map(|level| {
                    record
                        .containment
                        .get(level)
                        .region_name()
                        .map(|name| format!("{}: {}", level.as_str(), name))
                })
                .collect();

            CriticalAlert {
                vehicle_id: record.vehicle_id.0.clone(),
                manifest_id: record.manifest_id.0.clone(),
                destination_id: record.destination_id.clone(),
                product: record.product.clone(),
                wait_hours: record.wait_hours(),
                wait_started_at: record.wait_started_at,
                delivery_state: record.delivery_state.as_str(),
                latitude: record.latitude,
                longitude: record.longitude,
                speed_kmh: record.speed_kmh,
                active_regions,
                escalation_required: record.wait_hours() > ESCALATION_HOURS,
                priority: priority_score(record),
            }
        })
        .collect();

    alerts.sort_by(|a, b| b.priority.cmp(&a.priority));
    alerts
}

/// Rule-based recommendations over the current batch
pub fn recommendations(records: &[TrackingRecord]) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    let critical_count =
        records.iter().filter(|r| r.alert_level == AlertLevel::Critical).count();
    let warning_count = records.iter().filter(|r| r.alert_level == AlertLevel::Warning).count();
    let docks_count =
        records.iter().filter(|r| r.containment.is_present(HierarchyLevel::Docks)).count();

    if critical_count > 3 {
        recs.push(Recommendation {
            kind: RecommendationKind::UrgentEscalation,
            title: "Multiple critical alerts".to_string(),
            detail: format!("{critical_count} trucks past the critical waiting threshold"),
            action: "Activate the immediate escalation protocol".to_string(),
        });
    }

    if warning_count > 5 {
        recs.push(Recommendation {
            kind: RecommendationKind::CapacityReview,
            title: "Growing wait backlog".to_string(),
            detail: format!("{warning_count} trucks past the warning threshold"),
            action: "Review unloading capacity at the distribution centers".to_string(),
        });
    }

    if docks_count > 2 {
        recs.push(Recommendation {
            kind: RecommendationKind::DockAllocation,
            title: "Dock congestion".to_string(),
            detail: format!("{docks_count} trucks sitting at the docks"),
            action: "Rebalance dock assignments".to_string(),
        });
    }

    recs
}

/// Complete alert dashboard view for one batch
pub fn dashboard(records: &[TrackingRecord]) -> AlertDashboard {
    let summary = summarize(records);
    let breakdown = by_destination(records);

    let waiting: Vec<f64> =
        records.iter().filter(|r| r.wait_minutes > 0).map(|r| r.wait_hours()).collect();
    let average_waiting_hours = if waiting.is_empty() {
        0.0
    } else {
        let avg = waiting.iter().sum::<f64>() / waiting.len() as f64;
        (avg * 10.0).round() / 10.0
    };

    let alert_share_pct = if records.is_empty() {
        0.0
    } else {
        let share = summary.total_waiting as f64 / records.len() as f64 * 100.0;
        (share * 10.0).round() / 10.0
    };

    let busiest_destination = breakdown
        .iter()
        .max_by_key(|(_, b)| b.total)
        .map(|(destination, _)| destination.clone());

    AlertDashboard {
        executive: ExecutiveSummary {
            trucks_with_alerts: summary.total_waiting,
            alert_share_pct,
            average_waiting_hours,
            busiest_destination,
        },
        critical: critical_alerts(records),
        recommendations: recommendations(records),
        by_destination: breakdown,
        summary,
        generated_at: Utc::now(),
    }
}
