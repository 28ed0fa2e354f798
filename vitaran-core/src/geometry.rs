//! Great-circle geometry on WGS84 coordinates.

use geo::Point;

/// Mean Earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine great-circle distance between two points, in metres.
///
/// Points follow the `geo` convention: x is longitude, y is latitude, both
/// in degrees.
pub fn haversine_metres(a: Point<f64>, b: Point<f64>) -> f64 {
    let phi1 = a.y().to_radians();
    let phi2 = b.y().to_radians();
    let delta_phi = (b.y() - a.y()).to_radians();
    let delta_lambda = (b.x() - a.x()).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}
