//! The authorized collection zone.
//!
//! There is exactly one zone: an origin and a radius. A point is inside
//! when its great-circle distance to the origin does not exceed the radius.

use herbtrace_types::Coordinate;

use crate::distance::distance_km;

/// Default authorized origin (Patiala district, Punjab).
pub const AUTHORIZED_ORIGIN: Coordinate = Coordinate::new(30.3507, 76.3595);

/// Default authorized radius around [`AUTHORIZED_ORIGIN`].
pub const DEFAULT_RADIUS_KM: f64 = 10.0;

/// A circular authorized zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geofence {
    /// Center of the zone.
    pub origin: Coordinate,
    /// Radius in kilometers.
    pub radius_km: f64,
}

/// Result of testing a point against a [`Geofence`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceCheck {
    /// Distance from the zone origin in kilometers.
    pub distance_km: f64,
    /// Whether the point lies within the radius.
    pub inside: bool,
}

impl Geofence {
    /// Create a zone from an origin and radius.
    pub const fn new(origin: Coordinate, radius_km: f64) -> Self {
        Self { origin, radius_km }
    }

    /// Measure a point against the zone.
    ///
    /// A non-finite distance is never inside.
    pub fn check(&self, point: &Coordinate) -> GeofenceCheck {
        let distance = distance_km(point, &self.origin);
        GeofenceCheck {
            distance_km: distance,
            inside: distance <= self.radius_km,
        }
    }

    /// Whether the point lies within the zone.
    pub fn contains(&self, point: &Coordinate) -> bool {
        self.check(point).inside
    }
}

impl Default for Geofence {
    fn default() -> Self {
        Self::new(AUTHORIZED_ORIGIN, DEFAULT_RADIUS_KM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_is_inside() {
        let fence = Geofence::default();
        let check = fence.check(&AUTHORIZED_ORIGIN);
        assert!(check.inside);
        assert!(check.distance_km.abs() < 1e-9);
    }

    #[test]
    fn point_fifty_km_away_is_outside() {
        let fence = Geofence::default();
        // ~0.45 degrees of latitude is ~50 km.
        let far = Coordinate::new(30.3507 + 0.45, 76.3595);
        let check = fence.check(&far);
        assert!(!check.inside);
        assert!(check.distance_km > 49.0 && check.distance_km < 51.0);
    }

    #[test]
    fn boundary_uses_radius_inclusively() {
        let point = Coordinate::new(30.40, 76.3595);
        let d = distance_km(&point, &AUTHORIZED_ORIGIN);
        assert!(Geofence::new(AUTHORIZED_ORIGIN, d).contains(&point));
        assert!(!Geofence::new(AUTHORIZED_ORIGIN, d * 0.999).contains(&point));
    }

    #[test]
    fn nan_point_is_outside() {
        let fence = Geofence::default();
        assert!(!fence.contains(&Coordinate::new(f64::NAN, 76.0)));
    }
}
