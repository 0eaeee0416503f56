use slotmap::{SlotMap, new_key_type};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::geo::fallback::NodeDirectory;
use crate::domain::geo::point::GeoPoint;
use crate::domain::node::resource_node::ResourceNode;
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

new_key_type! {
    pub struct NodeKey;
}

#[derive(Debug)]
struct RegistryInner {
    /// Node storage.
    slots: SlotMap<NodeKey, ResourceNode>,

    /// Index lookup internal key (NodeKey) using the public node id.
    id_index: HashMap<NodeId, NodeKey>,

    /// Registration order, for the unfiltered degraded-mode sample.
    order: Vec<NodeKey>,
}

/// Store of all registered resource nodes.
///
/// Both maps are protected with a single lock; counters are not kept here
/// but in the capacity ledger.
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(RegistryInner { slots: SlotMap::with_key(), id_index: HashMap::new(), order: Vec::new() })) }
    }

    /// Adds a node to the registry.
    ///
    /// # Returns
    /// Returns the NodeKey (internal key for the registry) or
    /// `DuplicateNode` if the id is already taken.
    pub fn register(&self, node: ResourceNode) -> Result<NodeKey> {
        let mut guard = self.inner.write().expect("RwLock poisoned");

        if guard.id_index.contains_key(&node.id) {
            return Err(Error::DuplicateNode(node.id));
        }

        let id = node.id.clone();
        let key = guard.slots.insert(node);
        guard.id_index.insert(id, key);
        guard.order.push(key);

        Ok(key)
    }

    /// Get a node snapshot by public id.
    pub fn get(&self, id: &NodeId) -> Option<ResourceNode> {
        let guard = self.inner.read().expect("RwLock poisoned");
        let key = guard.id_index.get(id)?;
        guard.slots.get(*key).cloned()
    }

    /// Moves a node to a new position. Only the node's own administrator
    /// calls this; the proximity index must be updated alongside.
    pub fn update_location(&self, id: &NodeId, location: GeoPoint) -> Result<()> {
        let mut guard = self.inner.write().expect("RwLock poisoned");

        let key = *guard.id_index.get(id).ok_or_else(|| Error::NodeNotFound(id.clone()))?;
        let node = guard.slots.get_mut(key).ok_or_else(|| Error::NodeNotFound(id.clone()))?;

        node.location = location;
        log::info!("Node {} moved to ({}, {}).", id, location.lat, location.lng);

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("RwLock poisoned").slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeDirectory for NodeRegistry {
    /// First `limit` nodes in registration order. No distance ordering
    /// guarantee; this is the degraded-mode substitute set.
    fn sample(&self, limit: usize) -> Vec<NodeId> {
        let guard = self.inner.read().expect("RwLock poisoned");

        guard.order.iter().take(limit).filter_map(|key| guard.slots.get(*key).map(|node| node.id.clone())).collect()
    }
}
