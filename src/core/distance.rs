use geo::{HaversineDistance, Point};
use crate::models::{BoundingBox, Coordinates};

/// Meters in one statute mile
pub const METERS_PER_MILE: f64 = 1609.344;

/// Approximate meters per degree of latitude, rounded down so boxes err wide
const METERS_PER_DEGREE: f64 = 111_000.0;

/// Calculate the Haversine distance between two points in meters
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let from = Point::new(lon1, lat1);
    let to = Point::new(lon2, lat2);
    from.haversine_distance(&to)
}

/// Distance between two geocoded points in meters
#[inline]
pub fn distance_between(a: Coordinates, b: Coordinates) -> f64 {
    haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

#[inline]
pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}

#[inline]
pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

/// Calculate a bounding box around a center point
///
/// Cheap pre-filter for radius queries; every point within `radius_meters`
/// lies inside the box, the converse does not hold.
/// 1° latitude ≈ 111km, 1° longitude ≈ 111km * cos(latitude)
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_meters: f64) -> BoundingBox {
    let lat_delta = radius_meters / METERS_PER_DEGREE;

    // Near the poles the longitude span degenerates; cover all longitudes
    let cos_lat = lat.to_radians().cos().abs();
    let lon_delta = if cos_lat < 1e-6 {
        180.0
    } else {
        radius_meters / (METERS_PER_DEGREE * cos_lat)
    };

    BoundingBox {
        min_lat: lat - lat_delta,
        max_lat: lat + lat_delta,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}

/// Check if a point is within a bounding box
///
/// Boxes from `calculate_bounding_box` may extend past ±180° longitude or
/// past a pole; longitudes wrap around the antimeridian and a box reaching a
/// pole spans every longitude.
#[inline]
pub fn is_within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    if lat < bbox.min_lat || lat > bbox.max_lat {
        return false;
    }

    if bbox.max_lat >= 90.0 || bbox.min_lat <= -90.0 || bbox.max_lon - bbox.min_lon >= 360.0 {
        return true;
    }

    if bbox.max_lon > 180.0 {
        lon >= bbox.min_lon || lon <= bbox.max_lon - 360.0
    } else if bbox.min_lon < -180.0 {
        lon <= bbox.max_lon || lon >= bbox.min_lon + 360.0
    } else {
        lon >= bbox.min_lon && lon <= bbox.max_lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // Austin to San Antonio, roughly 118 km
        let distance = haversine_distance(30.2672, -97.7431, 29.4241, -98.4936);
        assert!(
            (distance - 118_000.0).abs() < 5_000.0,
            "Distance should be ~118km, got {}",
            distance
        );
    }

    #[test]
    fn test_mile_conversion() {
        assert!((meters_to_miles(16_093.44) - 10.0).abs() < 1e-9);
        assert!((miles_to_meters(5.0) - 8046.72).abs() < 1e-9);
    }

    #[test]
    fn test_bounding_box() {
        let bbox = calculate_bounding_box(30.2672, -97.7431, 16_093.44);

        assert!(bbox.min_lat < 30.2672);
        assert!(bbox.max_lat > 30.2672);
        assert!(bbox.min_lon < -97.7431);
        assert!(bbox.max_lon > -97.7431);

        // 2 * 16km / 111km per degree
        let lat_span = bbox.max_lat - bbox.min_lat;
        assert!((lat_span - 0.29).abs() < 0.02, "Lat span should be ~0.29 degrees");
    }

    #[test]
    fn test_point_within_bbox() {
        let bbox = calculate_bounding_box(30.2672, -97.7431, 8_000.0);

        assert!(is_within_bounding_box(30.2672, -97.7431, &bbox));
        assert!(is_within_bounding_box(30.28, -97.75, &bbox));
        assert!(!is_within_bounding_box(29.4241, -98.4936, &bbox));
    }

    #[test]
    fn test_bbox_wraps_antimeridian() {
        // Fiji sits on the 180th meridian
        let east = calculate_bounding_box(0.0, 179.95, 20_000.0);
        assert!(east.max_lon > 180.0);
        assert!(is_within_bounding_box(0.0, -179.95, &east));
        assert!(is_within_bounding_box(0.0, 179.9, &east));
        assert!(!is_within_bounding_box(0.0, -170.0, &east));
        assert!(!is_within_bounding_box(0.0, 0.0, &east));

        let west = calculate_bounding_box(0.0, -179.95, 20_000.0);
        assert!(west.min_lon < -180.0);
        assert!(is_within_bounding_box(0.0, 179.95, &west));
        assert!(!is_within_bounding_box(0.0, 170.0, &west));
    }

    #[test]
    fn test_bbox_reaching_pole_spans_all_longitudes() {
        let bbox = calculate_bounding_box(89.95, 0.0, 20_000.0);
        assert!(is_within_bounding_box(89.95, 180.0, &bbox));
        assert!(is_within_bounding_box(89.95, -90.0, &bbox));
        assert!(!is_within_bounding_box(80.0, 0.0, &bbox));
    }
}
