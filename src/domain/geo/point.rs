use serde::Serialize;

use crate::error::{Error, Result};

/// Earth mean radius in km. Shared by the proximity index and by callers
/// that re-validate returned nodes; both sides must agree on this constant
/// or they disagree about which nodes count as "nearby".
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A fixed geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Builds a point, rejecting coordinates outside
    /// latitude [-90, 90] / longitude [-180, 180].
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(Error::InvalidQuery(format!("latitude out of range: {}", lat)));
        }

        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(Error::InvalidQuery(format!("longitude out of range: {}", lng)));
        }

        Ok(GeoPoint { lat, lng })
    }
}

/// Great-circle distance in km between two points (haversine formula).
///
/// Symmetric, zero for identical coordinates, monotonic with angular
/// separation. No side effects.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}
