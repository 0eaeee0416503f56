use std::sync::Arc;

use crate::api::response_dto::{BookingResponseDto, CancelResponseDto, ReservationDto, SearchNodeDto, SearchResponseDto};
use crate::domain::geo::fallback::{FallbackCoordinator, RankedNode};
use crate::domain::geo::grid_index::GridIndex;
use crate::domain::geo::point::GeoPoint;
use crate::domain::geo::query::GeoQuery;
use crate::domain::ledger::capacity_ledger::CapacityLedger;
use crate::domain::node::node_registry::NodeRegistry;
use crate::domain::node::resource_node::ResourceNode;
use crate::domain::reservation::engine::ReservationEngine;
use crate::domain::reservation::reservation_store::ReservationStore;
use crate::domain::utils::id::{NodeId, PoolId, RequesterId, ReservationName};
use crate::error::{Error, Result};

/// Wires the node registry, capacity ledger, proximity index and
/// reservation engine into the query surface clients talk to.
///
/// Requester identities arrive already verified by the account service; the
/// core trusts them and does not re-authenticate.
pub struct MedGridService {
    registry: NodeRegistry,
    ledger: Arc<CapacityLedger>,
    index: Arc<GridIndex>,
    coordinator: FallbackCoordinator,
    engine: ReservationEngine,
}

impl MedGridService {
    pub fn new() -> Self {
        let ledger = Arc::new(CapacityLedger::new());
        let registry = NodeRegistry::new();
        let index = Arc::new(GridIndex::new(ledger.clone()));

        let coordinator = FallbackCoordinator::new(index.clone(), Arc::new(registry.clone()));
        let engine = ReservationEngine::new(ledger.clone(), ReservationStore::new());

        MedGridService { registry, ledger, index, coordinator, engine }
    }

    /// Registers a node, seeds its capacity pools in the ledger and indexes
    /// its position.
    ///
    /// Pool capacities are validated up front; a rejected registration
    /// leaves no trace in the registry, so a corrected retry can succeed.
    pub fn register_node(&self, node: ResourceNode) -> Result<()> {
        for capacity in node.pools.values() {
            if *capacity < 0 {
                return Err(Error::InvalidAmount(*capacity));
            }
        }

        let id = node.id.clone();
        let location = node.location;
        let pools: Vec<(PoolId, i64)> = node.pools.iter().map(|(pool, capacity)| (pool.clone(), *capacity)).collect();

        self.registry.register(node)?;

        for (pool, capacity) in pools {
            self.ledger.register_pool(&id, &pool, capacity)?;
        }

        self.index.upsert(id, location)?;
        Ok(())
    }

    /// Radius search around a point. Always returns a usable list; check
    /// `degraded` before trusting the ordering or the radius bound.
    pub fn search(&self, lat: f64, lng: f64, radius_km: Option<f64>, pool: Option<&str>) -> Result<SearchResponseDto> {
        let query = GeoQuery::new(lat, lng, radius_km, pool.map(PoolId::new))?;
        let outcome = self.coordinator.search(&query)?;

        let nodes = outcome.nodes.into_iter().filter_map(|ranked| self.search_node_dto(ranked)).collect();

        Ok(SearchResponseDto { nodes, degraded: outcome.degraded, reason: outcome.reason })
    }

    fn search_node_dto(&self, ranked: RankedNode) -> Option<SearchNodeDto> {
        let Some(node) = self.registry.get(&ranked.node) else {
            // Index and registry are updated together; a miss here means a
            // torn registration and the entry is dropped from the response.
            log::warn!("Node {} is indexed but not registered. Dropping it from the response.", ranked.node);
            return None;
        };

        let pools = self.ledger.pools_of(&node.id).into_iter().map(|(pool, count)| (pool.to_string(), count)).collect();

        Some(SearchNodeDto {
            id: node.id.to_string(),
            name: node.name,
            city: node.city,
            lat: node.location.lat,
            lng: node.location.lng,
            distance_km: ranked.distance_km,
            pools,
        })
    }

    /// Books one unit for a verified requester.
    pub fn book(&self, requester: &str, node: &str, pool: &str) -> Result<BookingResponseDto> {
        let receipt = self.engine.book(RequesterId::new(requester), NodeId::new(node), PoolId::new(pool))?;

        Ok(BookingResponseDto { reservation_id: receipt.reservation.name.to_string(), remaining: receipt.remaining })
    }

    /// Booking with a caller-supplied idempotency key, for retries after an
    /// unknown outcome.
    pub fn book_with_key(&self, requester: &str, node: &str, pool: &str, key: &str) -> Result<BookingResponseDto> {
        let receipt = self.engine.book_with_name(RequesterId::new(requester), NodeId::new(node), PoolId::new(pool), ReservationName::new(key))?;

        Ok(BookingResponseDto { reservation_id: receipt.reservation.name.to_string(), remaining: receipt.remaining })
    }

    pub fn cancel(&self, reservation_id: &str, requester: &str) -> Result<CancelResponseDto> {
        self.engine.cancel(&ReservationName::new(reservation_id), &RequesterId::new(requester))?;
        Ok(CancelResponseDto { ok: true })
    }

    pub fn list_reservations(&self, requester: &str) -> Vec<ReservationDto> {
        self.engine.list_by_requester(&RequesterId::new(requester)).iter().map(ReservationDto::from).collect()
    }

    /// Admin API: absolute capacity reset for one pool.
    pub fn admin_set_capacity(&self, node: &str, pool: &str, value: i64) -> Result<()> {
        self.ledger.admin_set(&NodeId::new(node), &PoolId::new(pool), value)
    }

    /// Admin API: moves a node; registry and index are updated together.
    pub fn update_location(&self, node: &str, lat: f64, lng: f64) -> Result<()> {
        let id = NodeId::new(node);
        let location = GeoPoint::new(lat, lng)?;

        self.registry.update_location(&id, location)?;
        self.index.upsert(id, location)
    }

    pub fn node_count(&self) -> usize {
        self.registry.len()
    }

    pub fn available(&self, node: &str, pool: &str) -> Result<i64> {
        self.ledger.available(&NodeId::new(node), &PoolId::new(pool))
    }
}

impl Default for MedGridService {
    fn default() -> Self {
        Self::new()
    }
}
