use std::collections::HashMap;

use crate::domain::geo::point::GeoPoint;
use crate::domain::utils::id::{NodeId, PoolId};

/// Pool holding one interchangeable bed unit per count.
pub const BEDS_POOL: &str = "beds";

/// Pool holding oxygen cylinders.
pub const OXYGEN_POOL: &str = "oxygen";

/// A capacity-holding entity at a fixed geographic point, e.g. a hospital.
///
/// The location is immutable until explicitly updated by the node's own
/// administrator. Pool counts live in the capacity ledger; the values here
/// are the administered capacities handed over at registration. Nodes are
/// never deleted in normal operation.
#[derive(Debug, Clone)]
pub struct ResourceNode {
    pub id: NodeId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub location: GeoPoint,

    /// Administered capacity per pool at registration time.
    pub pools: HashMap<PoolId, i64>,
}
