use geo::{HaversineBearing, HaversineLength, LineString, Point};
use serde::{Deserialize, Serialize};

/// A geographic position in degrees, serialized as `[lon, lat]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lon: f64,
    pub lat: f64,
}

impl LngLat {
    #[must_use]
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    #[must_use]
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    /// Position as a `GeoJSON` position (`[lon, lat]`)
    #[must_use]
    pub fn to_position(self) -> Vec<f64> {
        vec![self.lon, self.lat]
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(value: LngLat) -> Self {
        [value.lon, value.lat]
    }
}

impl From<(f64, f64)> for LngLat {
    fn from((lon, lat): (f64, f64)) -> Self {
        Self { lon, lat }
    }
}

/// Normalizes a bearing in degrees into `[0, 360)`.
///
/// Bearings from the haversine formula come back in `[-180, 180]`; a negative
/// value has 360 added.
///
/// # Examples
/// ```
/// use trail_editor::geometry::normalize_bearing;
///
/// assert_eq!(normalize_bearing(-90.0), 270.0);
/// assert_eq!(normalize_bearing(45.0), 45.0);
/// assert_eq!(normalize_bearing(360.0), 0.0);
/// ```
#[must_use]
pub fn normalize_bearing(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Initial great-circle bearing from `from` to `to`, normalized to `[0, 360)`.
#[must_use]
pub fn bearing_degrees(from: LngLat, to: LngLat) -> f64 {
    normalize_bearing(from.to_point().haversine_bearing(to.to_point()))
}

/// Geodesic (haversine) length of a vertex chain in meters.
///
/// Returns 0 for fewer than two vertices.
#[must_use]
pub fn path_length_meters(vertices: &[LngLat]) -> f64 {
    if vertices.len() < 2 {
        return 0.0;
    }
    let line: LineString<f64> = vertices.iter().map(|v| (v.lon, v.lat)).collect();
    line.haversine_length()
}

/// Bearing at the start of a vertex chain.
///
/// Measured from the first vertex to the second when there are exactly two
/// vertices, or to the third when there are three or more. `None` below two
/// vertices.
#[must_use]
pub fn start_bearing(vertices: &[LngLat]) -> Option<f64> {
    match vertices {
        [] | [_] => None,
        [first, second] => Some(bearing_degrees(*first, *second)),
        [first, _, third, ..] => Some(bearing_degrees(*first, *third)),
    }
}

/// Bearing at the end of a vertex chain, looking back from the last vertex.
///
/// Mirrors [`start_bearing`]: last to second-to-last for two vertices, last to
/// third-from-last for three or more.
#[must_use]
pub fn end_bearing(vertices: &[LngLat]) -> Option<f64> {
    match vertices {
        [] | [_] => None,
        [first, second] => Some(bearing_degrees(*second, *first)),
        [.., third_last, _, last] => Some(bearing_degrees(*last, *third_last)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shortest angular distance between two bearings, in [0, 180]
    fn bearing_difference(b1: f64, b2: f64) -> f64 {
        let diff = (normalize_bearing(b1) - normalize_bearing(b2)).abs();
        if diff > 180.0 {
            360.0 - diff
        } else {
            diff
        }
    }

    #[test]
    fn test_normalize_bearing_negative() {
        assert!((normalize_bearing(-10.0) - 350.0).abs() < 1e-10);
        assert!((normalize_bearing(-180.0) - 180.0).abs() < 1e-10);
    }

    #[test]
    fn test_normalize_bearing_stays_below_360() {
        assert_eq!(normalize_bearing(360.0), 0.0);
        assert_eq!(normalize_bearing(0.0), 0.0);
        assert!(normalize_bearing(-1e-18) < 360.0);
    }

    #[test]
    fn test_bearing_due_north_and_east() {
        let origin = LngLat::new(9.0, 45.0);
        let north = bearing_degrees(origin, LngLat::new(9.0, 45.01));
        let east = bearing_degrees(origin, LngLat::new(9.01, 45.0));
        assert!(north.abs() < 1e-6 || (north - 360.0).abs() < 1e-6);
        assert!((east - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_two_vertex_bearings_are_complementary() {
        let vertices = [LngLat::new(9.0, 45.0), LngLat::new(9.01, 45.0)];
        let start = start_bearing(&vertices).expect("two vertices");
        let end = end_bearing(&vertices).expect("two vertices");

        assert!((0.0..360.0).contains(&start));
        assert!((0.0..360.0).contains(&end));
        assert!((bearing_difference(start, end) - 180.0).abs() < 0.01);
    }

    #[test]
    fn test_three_vertex_bearings_skip_middle_vertex() {
        let vertices = [
            LngLat::new(9.0, 45.0),
            LngLat::new(9.0, 45.01),
            LngLat::new(9.01, 45.01),
        ];
        let start = start_bearing(&vertices).expect("three vertices");
        let direct = bearing_degrees(vertices[0], vertices[2]);
        assert_eq!(start, direct);

        let end = end_bearing(&vertices).expect("three vertices");
        assert_eq!(end, bearing_degrees(vertices[2], vertices[0]));
    }

    #[test]
    fn test_bearings_need_two_vertices() {
        assert_eq!(start_bearing(&[]), None);
        assert_eq!(end_bearing(&[LngLat::new(1.0, 1.0)]), None);
    }

    #[test]
    fn test_path_length_single_degree_of_latitude() {
        let vertices = [LngLat::new(0.0, 0.0), LngLat::new(0.0, 1.0)];
        let length = path_length_meters(&vertices);
        // One degree of latitude on the mean-radius sphere is ~111.2 km
        assert!((length - 111_195.0).abs() < 100.0);
    }

    #[test]
    fn test_path_length_is_non_decreasing_when_appending() {
        let points = [
            LngLat::new(9.1, 44.9),
            LngLat::new(9.11, 44.91),
            LngLat::new(9.11, 44.91),
            LngLat::new(9.105, 44.915),
            LngLat::new(9.12, 44.92),
        ];
        let mut previous = 0.0;
        for n in 1..=points.len() {
            let length = path_length_meters(&points[..n]);
            assert!(length >= previous);
            previous = length;
        }
    }

    #[test]
    fn test_lng_lat_serializes_as_array() {
        let json = serde_json::to_string(&LngLat::new(9.1, 44.9)).expect("serialize");
        assert_eq!(json, "[9.1,44.9]");
        let back: LngLat = serde_json::from_str("[9.12,44.92]").expect("deserialize");
        assert_eq!(back, LngLat::new(9.12, 44.92));
    }
}
