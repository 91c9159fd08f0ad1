//! Planar polygon containment for geofence boundaries
//!
//! Geofences cover a few city blocks up to a metro area, so coordinates are
//! treated as planar. Boundary membership is closed: a point exactly on an
//! edge or vertex counts as inside.

use serde::{Deserialize, Serialize};

/// A geographic coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A closed polygon with at least 3 vertices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Build a polygon from vertices; returns None for fewer than 3 points
    pub fn new(points: Vec<Point>) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        Some(Self { points })
    }

    pub fn vertices(&self) -> &[Point] {
        &self.points
    }

    /// Even-odd ray casting with closed boundary treatment
    pub fn contains(&self, point: Point) -> bool {
        let n = self.points.len();
        let mut inside = false;

        let mut j = n - 1;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[j];

            if on_segment(a, b, point) {
                return true;
            }

            // Cast a ray in +lng direction, counting edge crossings
            if (a.lat > point.lat) != (b.lat > point.lat) {
                let intersect_lng = (b.lng - a.lng) * (point.lat - a.lat) / (b.lat - a.lat) + a.lng;
                if point.lng < intersect_lng {
                    inside = !inside;
                }
            }
            j = i;
        }

        inside
    }
}

/// Whether `p` lies on the segment between `a` and `b` (within float tolerance)
fn on_segment(a: Point, b: Point, p: Point) -> bool {
    const EPS: f64 = 1e-9;

    let cross = (b.lat - a.lat) * (p.lng - a.lng) - (b.lng - a.lng) * (p.lat - a.lat);
    if cross.abs() > EPS {
        return false;
    }

    let within_lat = p.lat >= a.lat.min(b.lat) - EPS && p.lat <= a.lat.max(b.lat) + EPS;
    let within_lng = p.lng >= a.lng.min(b.lng) - EPS && p.lng <= a.lng.max(b.lng) + EPS;
    within_lat && within_lng
}

/// Parse a raw geofence coordinate string into points.
///
/// The source format is comma-separated `"lat lng"` pairs. Tokens that do not
/// parse as two numbers are skipped individually; the caller decides whether
/// enough points survived to form a boundary.
pub fn parse_coordinate_string(raw: &str) -> Vec<Point> {
    let mut points = Vec::new();

    for pair in raw.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }

        let mut parts = pair.split_whitespace();
        let (Some(lat_str), Some(lng_str)) = (parts.next(), parts.next()) else {
            continue;
        };

        match (lat_str.parse::<f64>(), lng_str.parse::<f64>()) {
            (Ok(lat), Ok(lng)) => points.push(Point::new(lat, lng)),
            _ => continue,
        }
    }

    points
}
