//! Active delivery manifest feed client
//!
//! The dispatch system publishes manifest rows per trip. A vehicle is active
//! when its most recent manifest row has not reached a terminal
//! departed-to-next-leg status, so the client reduces the raw rows to the
//! latest row per vehicle before handing them to the pipeline.

use crate::domain::error::FeedError;
use crate::domain::types::TruckSnapshot;
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use std::time::Duration;
use tracing::info;

/// Source of active truck manifests
#[async_trait]
pub trait ManifestFeed: Send + Sync {
    /// Fetch the active manifest snapshot for all trucks in transit
    async fn fetch_active(&self) -> Result<Vec<TruckSnapshot>, FeedError>;
}

/// HTTP implementation against the dispatch system API
pub struct HttpManifestFeed {
    client: reqwest::Client,
    url: String,
    token: String,
    terminal_statuses: Vec<String>,
}

impl HttpManifestFeed {
    pub fn new(base_url: &str, token: &str, timeout_secs: u64, terminal_statuses: &[String]) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            url: format!("{}/manifests/active", base_url.trim_end_matches('/')),
            token: token.to_string(),
            terminal_statuses: terminal_statuses.to_vec(),
        }
    }
}

#[async_trait]
impl ManifestFeed for HttpManifestFeed {
    async fn fetch_active(&self) -> Result<Vec<TruckSnapshot>, FeedError> {
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
        let rows: Vec<TruckSnapshot> =
            serde_json::from_str(&body).map_err(|e| FeedError::Malformed(e.to_string()))?;

        let total = rows.len();
        let active = reduce_active(rows, &self.terminal_statuses);
        info!(returned = %total, active = %active.len(), "manifest_feed_fetched");

        Ok(active)
    }
}

/// Keep the most recent manifest row per vehicle and drop rows that already
/// reached a terminal status
pub(crate) fn reduce_active(
    rows: Vec<TruckSnapshot>,
    terminal_statuses: &[String],
) -> Vec<TruckSnapshot> {
    let mut latest: FxHashMap<String, TruckSnapshot> = FxHashMap::default();

    for row in rows {
        match latest.get(row.vehicle_id.as_str()) {
            Some(existing) if existing.departed_at >= row.departed_at => {}
            _ => {
                latest.insert(row.vehicle_id.0.clone(), row);
            }
        }
    }

    let mut active: Vec<TruckSnapshot> = latest
        .into_values()
        .filter(|row| !terminal_statuses.iter().any(|s| s == &row.status))
        .collect();

    // Stable output order for logs and egress
    active.sort_by(|a, b| a.vehicle_id.0.cmp(&b.vehicle_id.0));
    active
}
