//! Tracking record egress - writes each cycle's records to file
//!
//! Records are written in JSONL format (one JSON object per line) to the
//! file specified in config, for downstream reporting tools.

use crate::domain::types::TrackingRecord;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info};

/// Egress writer for tracking records
pub struct Egress {
    file_path: String,
}

impl Egress {
    pub fn new(file_path: &str) -> Self {
        info!(file_path = %file_path, "egress_initialized");
        Self { file_path: file_path.to_string() }
    }

    /// Write a single record to the egress file
    /// Returns true if successful, false otherwise
    pub fn write_record(&self, record: &TrackingRecord) -> bool {
        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(e) => {
                error!(vehicle = %record.vehicle_id, error = %e, "record_serialize_failed");
                return false;
            }
        };

        match self.append_line(&json) {
            Ok(()) => {
                debug!(
                    vehicle = %record.vehicle_id,
                    manifest = %record.manifest_id,
                    state = %record.delivery_state.as_str(),
                    "record_egressed"
                );
                true
            }
            Err(e) => {
                error!(
                    vehicle = %record.vehicle_id,
                    error = %e,
                    "record_egress_failed"
                );
                false
            }
        }
    }

    /// Append a line to the egress file
    fn append_line(&self, line: &str) -> std::io::Result<()> {
        let path = Path::new(&self.file_path);

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        writeln!(file, "{}", line)?;

        Ok(())
    }

    /// Write a full cycle batch; returns the number written successfully
    pub fn write_records(&self, records: &[TrackingRecord]) -> usize {
        let mut success_count = 0;
        for record in records {
            if self.write_record(record) {
                success_count += 1;
            }
        }
        info!(written = %success_count, total = %records.len(), "cycle_egressed");
        success_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{
        AlertLevel, ContainmentResult, DeliveryState, DischargeState, ManifestId, TrackingRecord,
        VehicleId,
    };
    use chrono::Utc;
    use std::fs;
    use tempfile::tempdir;

    fn sample_record() -> TrackingRecord {
        TrackingRecord {
            vehicle_id: VehicleId("ABC-123".to_string()),
            manifest_id: ManifestId("PL-1".to_string()),
            destination_id: "Cerveceria SCZ".to_string(),
            origin: "Planta Norte".to_string(),
            product: "Pilsener".to_string(),
            status: "SALIDA".to_string(),
            latitude: -17.78,
            longitude: -63.18,
            speed_kmh: 0.0,
            containment: ContainmentResult::default(),
            progress_pct: 0.0,
            delivery_state: DeliveryState::InTransit,
            wait_started_at: None,
            wait_minutes: 0,
            discharge_state: DischargeState::NotWaiting,
            alert_level: AlertLevel::Normal,
            persisted: true,
            processed_at: Utc::now(),
        }
    }

    #[test]
    fn test_write_record() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("tracking.jsonl");
        let egress = Egress::new(file_path.to_str().unwrap());

        assert!(egress.write_record(&sample_record()));

        let content = fs::read_to_string(&file_path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(parsed["vehicle_id"], "ABC-123");
        assert_eq!(parsed["delivery_state"], "IN_TRANSIT");
    }

    #[test]
    fn test_write_records_appends_lines() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("nested/tracking.jsonl");
        let egress = Egress::new(file_path.to_str().unwrap());

        let written = egress.write_records(&[sample_record(), sample_record()]);
        assert_eq!(written, 2);

        let content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
