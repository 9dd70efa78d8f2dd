//! Geospatial primitives

use fieldtrack_api::{Coordinate, Geofence};

/// Mean Earth radius used for great-circle distances
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle (haversine) distance in meters.
///
/// Coordinates outside [-90, 90] / [-180, 180] are a caller error and are not
/// checked here.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());
    EARTH_RADIUS_METERS * c
}

/// True iff `point` lies inside `fence` (boundary inclusive)
pub fn is_within_geofence(point: Coordinate, fence: &Geofence) -> bool {
    distance_meters(point, fence.center) <= fence.radius_meters
}
