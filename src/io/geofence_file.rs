//! Geofence definition file loading
//!
//! Definitions arrive as a JSON array of `{level, name, points}` rows, where
//! `points` is the raw coordinate string exported by the mapping tool
//! (comma-separated "lat lng" pairs). The file is reloadable at runtime.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One raw geofence definition row
#[derive(Debug, Clone, Deserialize)]
pub struct GeofenceRow {
    pub level: String,
    pub name: String,
    pub points: String,
}

/// Read geofence rows from a JSON file
pub fn load_rows<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<GeofenceRow>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read geofence file {}", path.display()))?;

    let rows: Vec<GeofenceRow> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse geofence file {}", path.display()))?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_rows() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"level": "CITY", "name": "SANTA CRUZ", "points": "-17.7 -63.2, -17.7 -63.1, -17.8 -63.1, -17.8 -63.2"}},
                {{"level": "DOCKS", "name": "DOCK - 7 - PLANTA SANTA CRUZ", "points": "-17.75 -63.15, -17.75 -63.14, -17.76 -63.14"}}
            ]"#
        )
        .unwrap();
        file.flush().unwrap();

        let rows = load_rows(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].level, "CITY");
        assert_eq!(rows[1].name, "DOCK - 7 - PLANTA SANTA CRUZ");
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(load_rows("/nonexistent/geofences.json").is_err());
    }
}
