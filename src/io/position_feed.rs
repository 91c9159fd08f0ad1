//! Vehicle position feed client
//!
//! The fleet telemetry provider exposes a single endpoint returning the last
//! known position for every unit. The feed is best-effort: rows without a
//! vehicle id or coordinates are dropped, and vehicles missing from the
//! response are simply skipped for that cycle.

use crate::domain::error::FeedError;
use crate::domain::types::{VehicleId, VehiclePosition};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Source of current vehicle positions
#[async_trait]
pub trait PositionFeed: Send + Sync {
    /// Fetch the latest position for all known vehicles
    async fn fetch_all(&self) -> Result<Vec<VehiclePosition>, FeedError>;
}

/// Raw feed row; coordinates are optional because the provider emits rows
/// for units that have never reported
#[derive(Debug, Deserialize)]
struct PositionRow {
    #[serde(default)]
    vehicle_id: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    speed_kmh: f64,
    #[serde(default)]
    heading: Option<i32>,
    #[serde(default)]
    recorded_at: Option<DateTime<Utc>>,
}

/// HTTP implementation against the telemetry provider API
pub struct HttpPositionFeed {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl HttpPositionFeed {
    pub fn new(base_url: &str, token: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            url: format!("{}/positions/latest", base_url.trim_end_matches('/')),
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl PositionFeed for HttpPositionFeed {
    async fn fetch_all(&self) -> Result<Vec<VehiclePosition>, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .header("token", &self.token)
            .send()
            .await
            .map_err(|e| FeedError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| FeedError::Request(e.to_string()))?;
        let rows: Vec<PositionRow> =
            serde_json::from_str(&body).map_err(|e| FeedError::Malformed(e.to_string()))?;

        let total = rows.len();
        let positions = convert_rows(rows);
        info!(returned = %total, usable = %positions.len(), "position_feed_fetched");

        Ok(positions)
    }
}

fn convert_rows(rows: Vec<PositionRow>) -> Vec<VehiclePosition> {
    rows.into_iter()
        .filter_map(|row| {
            let (Some(vehicle_id), Some(latitude), Some(longitude)) =
                (row.vehicle_id, row.latitude, row.longitude)
            else {
                debug!("position_row_incomplete");
                return None;
            };
            Some(VehiclePosition {
                vehicle_id: VehicleId(vehicle_id),
                latitude,
                longitude,
                speed_kmh: row.speed_kmh,
                heading: row.heading,
                recorded_at: row.recorded_at,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_drops_incomplete_rows() {
        let rows: Vec<PositionRow> = serde_json::from_str(
            r#"[
                {"vehicle_id": "ABC-123", "latitude": -17.78, "longitude": -63.18, "speed_kmh": 42.5},
                {"vehicle_id": "DEF-456"},
                {"latitude": -17.0, "longitude": -63.0}
            ]"#,
        )
        .unwrap();

        let positions = convert_rows(rows);
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].vehicle_id.as_str(), "ABC-123");
        assert_eq!(positions[0].speed_kmh, 42.5);
    }
}
