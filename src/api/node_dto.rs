use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::geo::point::GeoPoint;
use crate::domain::node::resource_node::{BEDS_POOL, OXYGEN_POOL, ResourceNode};
use crate::domain::utils::id::{NodeId, PoolId};
use crate::error::Result;

/// Root of a node seed file.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NodesDto {
    pub nodes: Vec<NodeDto>,
}

/// One seeded resource node on the wire.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NodeDto {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    pub beds_available: i64,
    pub oxygen_cylinders: Option<i64>,
}

impl NodeDto {
    /// Builds the domain node, validating the coordinates.
    pub fn into_domain(self) -> Result<ResourceNode> {
        let location = GeoPoint::new(self.lat, self.lng)?;

        let mut pools = HashMap::new();
        pools.insert(PoolId::new(BEDS_POOL), self.beds_available);

        if let Some(cylinders) = self.oxygen_cylinders {
            pools.insert(PoolId::new(OXYGEN_POOL), cylinders);
        }

        Ok(ResourceNode { id: NodeId::new(self.id), name: self.name, address: self.address, city: self.city, location, pools })
    }
}
