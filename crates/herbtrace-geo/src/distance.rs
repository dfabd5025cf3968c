//! Haversine great-circle distance.
//!
//! Pure function, no failure modes: non-finite inputs propagate to a
//! non-finite result, so callers validate coordinates first.

use herbtrace_types::Coordinate;

/// Mean Earth radius used for all distance calculations.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two coordinates.
///
/// Altitude is ignored.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let sin_lat = (d_lat / 2.0).sin();
    let sin_lon = (d_lon / 2.0).sin();
    let cos_product = a.latitude.to_radians().cos() * b.latitude.to_radians().cos();

    let h = (sin_lon * sin_lon).mul_add(cos_product, sin_lat * sin_lat);
    let central_angle = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * central_angle
}
