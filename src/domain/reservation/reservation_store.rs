use slotmap::{SlotMap, new_key_type};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::reservation::reservation::Reservation;
use crate::domain::utils::id::{RequesterId, ReservationName};
use crate::error::{Error, Result};

new_key_type! {
    pub struct ReservationKey;
}

#[derive(Debug)]
struct StoreInner {
    /// Reservation storage.
    slots: SlotMap<ReservationKey, Arc<RwLock<Reservation>>>,

    /// Index lookup internal key (ReservationKey) using the public
    /// reservation name.
    name_index: HashMap<ReservationName, ReservationKey>,

    /// Per-requester keys in append order.
    requester_index: HashMap<RequesterId, Vec<ReservationKey>>,
}

/// The append-and-update reservation ledger.
///
/// Records are appended at booking and only ever updated in place to flip
/// their state; nothing is removed. Single writer of truth for reservation
/// state.
#[derive(Debug, Clone)]
pub struct ReservationStore {
    /// All maps are protected with a single lock.
    inner: Arc<RwLock<StoreInner>>,
}

impl ReservationStore {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(StoreInner { slots: SlotMap::with_key(), name_index: HashMap::new(), requester_index: HashMap::new() })) }
    }

    /// Appends a reservation record.
    ///
    /// # Returns
    /// Returns the ReservationKey (internal key for the store) or
    /// `DuplicateReservation` if the name is already present — the caller's
    /// idempotency boundary for retried bookings.
    pub fn append(&self, reservation: Reservation) -> Result<ReservationKey> {
        let mut guard = self.inner.write().expect("RwLock poisoned");

        if guard.name_index.contains_key(&reservation.name) {
            return Err(Error::DuplicateReservation(reservation.name));
        }

        let name = reservation.name.clone();
        let requester = reservation.requester.clone();

        let key = guard.slots.insert(Arc::new(RwLock::new(reservation)));
        guard.name_index.insert(name, key);
        guard.requester_index.entry(requester).or_default().push(key);

        Ok(key)
    }

    /// Get the shared record handle for a public reservation name.
    pub fn get_by_name(&self, name: &ReservationName) -> Option<Arc<RwLock<Reservation>>> {
        let guard = self.inner.read().expect("RwLock poisoned");
        let key = guard.name_index.get(name)?;
        guard.slots.get(*key).cloned()
    }

    /// Snapshots of all reservations of one requester, newest first.
    pub fn list_by_requester(&self, requester: &RequesterId) -> Vec<Reservation> {
        let guard = self.inner.read().expect("RwLock poisoned");

        let Some(keys) = guard.requester_index.get(requester) else {
            return Vec::new();
        };

        keys.iter().rev().filter_map(|key| guard.slots.get(*key)).map(|handle| handle.read().expect("RwLock poisoned").clone()).collect()
    }
}

impl Default for ReservationStore {
    fn default() -> Self {
        Self::new()
    }
}
