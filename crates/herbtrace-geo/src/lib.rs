//! Geographic math for HerbTrace collection sites.
//!
//! # Modules
//!
//! - [`distance`] -- Great-circle distance (haversine) between coordinates.
//! - [`geofence`] -- A single authorized origin plus radius that gates
//!   where collection events may originate.

pub mod distance;
pub mod geofence;

pub use distance::{EARTH_RADIUS_KM, distance_km};
pub use geofence::{AUTHORIZED_ORIGIN, DEFAULT_RADIUS_KM, Geofence, GeofenceCheck};
