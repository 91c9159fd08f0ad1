//! Named geofence regions grouped by hierarchy level
//!
//! The index is built once from the definition file and answers containment
//! queries per level. Regions whose coordinate strings yield fewer than 3
//! valid points are kept with no boundary so they still show up in counts,
//! but they never match a position. A malformed row never fails the build.

use crate::domain::geometry::{parse_coordinate_string, Point, Polygon};
use crate::domain::types::HierarchyLevel;
use crate::io::geofence_file::GeofenceRow;
use tracing::{info, warn};

/// A named polygonal region at one hierarchy level
#[derive(Debug, Clone)]
pub struct Region {
    pub level: HierarchyLevel,
    pub name: String,
    pub boundary: Option<Polygon>,
}

impl Region {
    /// Whether this region's boundary contains the point; boundary-less
    /// regions never match
    pub fn contains(&self, point: Point) -> bool {
        self.boundary.as_ref().is_some_and(|b| b.contains(point))
    }
}

/// All loaded regions, grouped by hierarchy level
#[derive(Debug, Default)]
pub struct GeofenceIndex {
    regions: [Vec<Region>; 4],
}

impl GeofenceIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the index from raw definition rows.
    ///
    /// Rows with an unknown level are skipped with a warning; coordinate
    /// parse failures are handled per token inside the coordinate parser.
    pub fn build(rows: Vec<GeofenceRow>) -> Self {
        let mut index = Self::empty();
        let mut skipped = 0usize;

        for row in rows {
            let level = match row.level.parse::<HierarchyLevel>() {
                Ok(level) => level,
                Err(e) => {
                    warn!(name = %row.name, error = %e, "geofence_row_skipped");
                    skipped += 1;
                    continue;
                }
            };

            let points = parse_coordinate_string(&row.points);
            let boundary = Polygon::new(points);
            if boundary.is_none() {
                warn!(level = %level.as_str(), name = %row.name, "geofence_boundary_unusable");
            }

            index.regions[level.idx()].push(Region { level, name: row.name, boundary });
        }

        for level in HierarchyLevel::MATCH_PRECEDENCE {
            let regions = &index.regions[level.idx()];
            let valid = regions.iter().filter(|r| r.boundary.is_some()).count();
            info!(
                level = %level.as_str(),
                regions = %regions.len(),
                valid = %valid,
                "geofence_level_loaded"
            );
        }
        if skipped > 0 {
            warn!(skipped = %skipped, "geofence_rows_skipped");
        }

        index
    }

    /// All regions at one hierarchy level
    pub fn regions_at(&self, level: HierarchyLevel) -> &[Region] {
        &self.regions[level.idx()]
    }

    /// Names of every region at the level whose boundary contains the point
    pub fn contains(&self, level: HierarchyLevel, point: Point) -> Vec<&str> {
        self.regions[level.idx()]
            .iter()
            .filter(|r| r.contains(point))
            .map(|r| r.name.as_str())
            .collect()
    }

    /// First region at the level containing the point, in load order
    pub fn first_containing(&self, level: HierarchyLevel, point: Point) -> Option<&Region> {
        self.regions[level.idx()].iter().find(|r| r.contains(point))
    }

    pub fn total_regions(&self) -> usize {
        self.regions.iter().map(Vec::len).sum()
    }

    pub fn valid_regions(&self) -> usize {
        self.regions.iter().flatten().filter(|r| r.boundary.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.total_regions() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<GeofenceRow> {
        vec![
            GeofenceRow {
                level: "CITY".to_string(),
                name: "SANTA CRUZ".to_string(),
                points: "0 0, 0 10, 10 10, 10 0".to_string(),
            },
            GeofenceRow {
                level: "DOCKS".to_string(),
                name: "DOCK - 7".to_string(),
                points: "4 4, 4 6, 6 6, 6 4".to_string(),
            },
            GeofenceRow {
                level: "DOCKS".to_string(),
                name: "BROKEN DOCK".to_string(),
                points: "1 1, 2 2".to_string(),
            },
            GeofenceRow {
                level: "WAREHOUSE".to_string(),
                name: "IGNORED".to_string(),
                points: "0 0, 0 1, 1 1".to_string(),
            },
        ]
    }

    #[test]
    fn test_build_counts() {
        let index = GeofenceIndex::build(rows());
        assert_eq!(index.total_regions(), 3);
        assert_eq!(index.valid_regions(), 2);
        assert_eq!(index.regions_at(HierarchyLevel::Docks).len(), 2);
        assert_eq!(index.regions_at(HierarchyLevel::TrackAndTrace).len(), 0);
    }

    #[test]
    fn test_contains_query() {
        let index = GeofenceIndex::build(rows());
        let inside_dock = Point::new(5.0, 5.0);

        assert_eq!(index.contains(HierarchyLevel::Docks, inside_dock), vec!["DOCK - 7"]);
        assert_eq!(index.contains(HierarchyLevel::City, inside_dock), vec!["SANTA CRUZ"]);
        assert!(index.contains(HierarchyLevel::Docks, Point::new(20.0, 20.0)).is_empty());
    }

    #[test]
    fn test_boundaryless_region_never_matches() {
        let index = GeofenceIndex::build(rows());
        // Point inside what BROKEN DOCK's two points would span
        let point = Point::new(1.5, 1.5);
        assert!(index.contains(HierarchyLevel::Docks, point).is_empty());
    }
}
