use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use crate::domain::geo::grid_index::PoolAvailability;
use crate::domain::utils::id::{NodeId, PoolId};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PoolKey {
    node: NodeId,
    pool: PoolId,
}

/// One capacity counter. `administered` is the baseline set at registration
/// or by the last admin update; `available` never leaves [0, administered].
#[derive(Debug, Clone, Copy)]
struct PoolCell {
    available: i64,
    administered: i64,
}

/// Result of a release. `clamped` reports the over-release anomaly without
/// failing the call.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseOutcome {
    pub available: i64,
    pub clamped: bool,
}

#[derive(Debug, Default)]
struct LedgerInner {
    /// Each counter behind its own lock, registry of counters behind an
    /// outer lock. Claims on different node/pool keys run concurrently;
    /// claims on the same key serialize on the cell mutex.
    cells: HashMap<PoolKey, Arc<Mutex<PoolCell>>>,

    /// Distinguishes an unknown node from a known node without the pool.
    nodes: HashSet<NodeId>,
}

/// The authoritative per-node, per-pool counter store. Single writer of
/// truth for pool counts; no other component mutates them directly.
#[derive(Debug)]
pub struct CapacityLedger {
    inner: RwLock<LedgerInner>,
}

impl CapacityLedger {
    pub fn new() -> Self {
        CapacityLedger { inner: RwLock::new(LedgerInner::default()) }
    }

    /// Creates a counter with its administered baseline. Called once per
    /// pool at node registration.
    pub fn register_pool(&self, node: &NodeId, pool: &PoolId, capacity: i64) -> Result<()> {
        if capacity < 0 {
            return Err(Error::InvalidAmount(capacity));
        }

        let mut guard = self.inner.write().expect("RwLock poisoned");
        guard.nodes.insert(node.clone());

        let key = PoolKey { node: node.clone(), pool: pool.clone() };
        guard.cells.insert(key, Arc::new(Mutex::new(PoolCell { available: capacity, administered: capacity })));

        Ok(())
    }

    /// Clones the cell handle out of the registry so the outer lock is never
    /// held while a counter is mutated.
    fn cell(&self, node: &NodeId, pool: &PoolId) -> Result<Arc<Mutex<PoolCell>>> {
        let guard = self.inner.read().expect("RwLock poisoned");

        let key = PoolKey { node: node.clone(), pool: pool.clone() };
        match guard.cells.get(&key) {
            Some(cell) => Ok(cell.clone()),
            None if guard.nodes.contains(node) => Err(Error::PoolNotFound { node: node.clone(), pool: pool.clone() }),
            None => Err(Error::NodeNotFound(node.clone())),
        }
    }

    /// Atomically claims `amount` units. Succeeds only if enough units
    /// remain; two concurrent claims can never both take the last unit.
    ///
    /// # Returns
    /// Returns the new available count on success.
    pub fn try_claim(&self, node: &NodeId, pool: &PoolId, amount: i64) -> Result<i64> {
        if amount <= 0 {
            return Err(Error::InvalidAmount(amount));
        }

        let cell = self.cell(node, pool)?;
        let mut counter = cell.lock().expect("Mutex poisoned");

        if counter.available < amount {
            return Err(Error::Exhausted { node: node.clone(), pool: pool.clone() });
        }

        counter.available -= amount;
        log::debug!("Claimed {} unit(s) of {}/{}. {} remaining.", amount, node, pool, counter.available);

        Ok(counter.available)
    }

    /// Returns `amount` units to the pool, clamped at the administered
    /// baseline. Hitting the clamp indicates a bookkeeping bug upstream
    /// (e.g. a double release); it is logged and reported, never an error.
    pub fn release(&self, node: &NodeId, pool: &PoolId, amount: i64) -> Result<ReleaseOutcome> {
        if amount <= 0 {
            return Err(Error::InvalidAmount(amount));
        }

        let cell = self.cell(node, pool)?;
        let mut counter = cell.lock().expect("Mutex poisoned");

        let unclamped = counter.available.saturating_add(amount);
        let clamped = unclamped > counter.administered;

        counter.available = unclamped.min(counter.administered);

        if clamped {
            log::warn!("Over-release on {}/{}: releasing {} unit(s) would raise the count to {} of {} administered. Clamped.", node, pool, amount, unclamped, counter.administered);
        }

        Ok(ReleaseOutcome { available: counter.available, clamped })
    }

    /// Unconditional absolute set by an administrator. Redefines both the
    /// available count and the administered baseline; not subject to the
    /// claim/release invariant check.
    pub fn admin_set(&self, node: &NodeId, pool: &PoolId, value: i64) -> Result<()> {
        if value < 0 {
            return Err(Error::InvalidAmount(value));
        }

        {
            let guard = self.inner.read().expect("RwLock poisoned");
            if !guard.nodes.contains(node) {
                return Err(Error::NodeNotFound(node.clone()));
            }
        }

        match self.cell(node, pool) {
            Ok(cell) => {
                let mut counter = cell.lock().expect("Mutex poisoned");
                *counter = PoolCell { available: value, administered: value };
            }
            // Administrators are the source of pools; an absolute set on a
            // pool the node never had creates it.
            Err(Error::PoolNotFound { .. }) => {
                self.register_pool(node, pool, value)?;
            }
            Err(other) => return Err(other),
        }

        log::info!("Administered capacity of {}/{} set to {}.", node, pool, value);
        Ok(())
    }

    pub fn available(&self, node: &NodeId, pool: &PoolId) -> Result<i64> {
        let cell = self.cell(node, pool)?;
        let counter = cell.lock().expect("Mutex poisoned");
        Ok(counter.available)
    }

    pub fn administered(&self, node: &NodeId, pool: &PoolId) -> Result<i64> {
        let cell = self.cell(node, pool)?;
        let counter = cell.lock().expect("Mutex poisoned");
        Ok(counter.administered)
    }

    /// Snapshot of every pool of one node, for response assembly.
    pub fn pools_of(&self, node: &NodeId) -> Vec<(PoolId, i64)> {
        let guard = self.inner.read().expect("RwLock poisoned");

        let mut pools: Vec<(PoolId, i64)> = guard
            .cells
            .iter()
            .filter(|(key, _)| &key.node == node)
            .map(|(key, cell)| (key.pool.clone(), cell.lock().expect("Mutex poisoned").available))
            .collect();

        pools.sort_by(|a, b| a.0.cmp(&b.0));
        pools
    }
}

impl Default for CapacityLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl PoolAvailability for CapacityLedger {
    fn has_available(&self, node: &NodeId, pool: &PoolId) -> bool {
        self.available(node, pool).map(|count| count > 0).unwrap_or(false)
    }
}
