use crate::domain::geo::point::GeoPoint;
use crate::domain::utils::id::PoolId;
use crate::error::{Error, Result};

/// Radius applied when the caller supplies none. This is the only place the
/// default lives; every entry point honors a caller-supplied radius.
pub const DEFAULT_RADIUS_KM: f64 = 500.0;

/// Hard cap on nodes returned by a single search, degraded or not.
pub const MAX_RESULTS: usize = 50;

/// An ephemeral, validated proximity query.
#[derive(Debug, Clone)]
pub struct GeoQuery {
    pub origin: GeoPoint,
    pub radius_km: f64,

    /// Restricts results to nodes with a positive count in the named pool.
    /// Applied before result truncation, not after.
    pub pool: Option<PoolId>,
}

impl GeoQuery {
    pub fn new(lat: f64, lng: f64, radius_km: Option<f64>, pool: Option<PoolId>) -> Result<Self> {
        let origin = GeoPoint::new(lat, lng)?;
        let radius_km = radius_km.unwrap_or(DEFAULT_RADIUS_KM);

        if !radius_km.is_finite() || radius_km <= 0.0 {
            return Err(Error::InvalidQuery(format!("radius must be positive, got {}", radius_km)));
        }

        Ok(GeoQuery { origin, radius_km, pool })
    }
}
