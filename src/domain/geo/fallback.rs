use std::sync::Arc;

use crate::domain::geo::grid_index::{NodeDistance, ProximitySearch};
use crate::domain::geo::query::{GeoQuery, MAX_RESULTS};
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

/// Reason attached to a degraded response when the index itself failed.
pub const REASON_INDEX_UNAVAILABLE: &str = "index unavailable";

/// Reason attached to a degraded response when the query matched nothing.
pub const REASON_NO_NODES_IN_RADIUS: &str = "no nodes in radius";

/// Source of an unfiltered node sample for degraded mode. Implemented by the
/// node registry; no distance ordering is guaranteed.
pub trait NodeDirectory: Send + Sync {
    fn sample(&self, limit: usize) -> Vec<NodeId>;
}

/// One entry of a search response. `distance_km` is only known in normal
/// mode; degraded entries carry `None`.
#[derive(Debug, Clone)]
pub struct RankedNode {
    pub node: NodeId,
    pub distance_km: Option<f64>,
}

/// A search result that is always usable: either a ranked radius match or an
/// unfiltered substitute with a visible caveat.
#[derive(Debug, Clone)]
pub struct NearbyOutcome {
    pub nodes: Vec<RankedNode>,
    pub degraded: bool,
    pub reason: Option<String>,
}

/// Wraps the proximity index and trades precision for availability.
///
/// A sparse deployment or a rural origin point routinely produces an empty
/// radius match; surfacing "no nodes" to an end user in that case is strictly
/// worse than showing unfiltered options with a caveat. Callers that need
/// exactness re-validate the returned nodes against their own radius
/// tolerance with [`haversine_km`](crate::domain::geo::point::haversine_km),
/// which is public for exactly that purpose.
pub struct FallbackCoordinator {
    index: Arc<dyn ProximitySearch>,
    directory: Arc<dyn NodeDirectory>,
}

impl FallbackCoordinator {
    pub fn new(index: Arc<dyn ProximitySearch>, directory: Arc<dyn NodeDirectory>) -> Self {
        FallbackCoordinator { index, directory }
    }

    /// Runs the primary query and degrades on an unavailable index or an
    /// empty match. `InvalidQuery` is a caller bug and still propagates.
    pub fn search(&self, query: &GeoQuery) -> Result<NearbyOutcome> {
        match self.index.find_within(query) {
            Ok(hits) if !hits.is_empty() => Ok(NearbyOutcome {
                nodes: hits.into_iter().map(|NodeDistance { node, distance_km }| RankedNode { node, distance_km: Some(distance_km) }).collect(),
                degraded: false,
                reason: None,
            }),

            Ok(_) => {
                log::info!("Proximity query at ({}, {}) radius {} km matched no nodes. Degrading to the unfiltered node sample.", query.origin.lat, query.origin.lng, query.radius_km);
                Ok(self.degraded(REASON_NO_NODES_IN_RADIUS))
            }

            Err(Error::IndexUnavailable(cause)) => {
                log::warn!("Proximity index unavailable ({}). Degrading to the unfiltered node sample.", cause);
                Ok(self.degraded(REASON_INDEX_UNAVAILABLE))
            }

            Err(other) => Err(other),
        }
    }

    fn degraded(&self, reason: &str) -> NearbyOutcome {
        let nodes = self.directory.sample(MAX_RESULTS).into_iter().map(|node| RankedNode { node, distance_km: None }).collect();

        NearbyOutcome { nodes, degraded: true, reason: Some(reason.to_string()) }
    }
}
