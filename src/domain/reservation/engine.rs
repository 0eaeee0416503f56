use std::sync::Arc;
use uuid::Uuid;

use crate::domain::ledger::capacity_ledger::CapacityLedger;
use crate::domain::reservation::reservation::{Reservation, ReservationState};
use crate::domain::reservation::reservation_store::ReservationStore;
use crate::domain::utils::id::{NodeId, PoolId, RequesterId, ReservationName};
use crate::error::{Error, Result};

/// A successful booking: the appended record plus the node's updated pool
/// count.
#[derive(Debug, Clone)]
pub struct BookingReceipt {
    pub reservation: Reservation,
    pub remaining: i64,
}

/// Orchestrates bookings and cancellations as single logical operations
/// against the capacity ledger and the reservation store.
///
/// Both collaborators may block; no other lock is ever held across a call
/// into them.
#[derive(Clone)]
pub struct ReservationEngine {
    ledger: Arc<CapacityLedger>,
    store: ReservationStore,
}

impl ReservationEngine {
    pub fn new(ledger: Arc<CapacityLedger>, store: ReservationStore) -> Self {
        ReservationEngine { ledger, store }
    }

    /// Books one unit of `pool` at `node` under a generated reservation
    /// name.
    pub fn book(&self, requester: RequesterId, node: NodeId, pool: PoolId) -> Result<BookingReceipt> {
        self.book_with_name(requester, node, pool, ReservationName::new(Uuid::new_v4().to_string()))
    }

    /// Books one unit under a caller-supplied name, the caller-side
    /// idempotency key: a retry after an unknown outcome reuses the name and
    /// is rejected as a duplicate instead of claiming a second unit.
    ///
    /// The ledger claim comes first; the record is appended only on success.
    /// If the append fails after a successful claim, the claimed unit is
    /// released again before the error surfaces, so no capacity leaks.
    pub fn book_with_name(&self, requester: RequesterId, node: NodeId, pool: PoolId, name: ReservationName) -> Result<BookingReceipt> {
        let remaining = self.ledger.try_claim(&node, &pool, 1)?;

        let reservation = Reservation::new(name, requester, node.clone(), pool.clone());

        if let Err(append_error) = self.store.append(reservation.clone()) {
            // Compensating action: the claim must not outlive the failed
            // append.
            if let Err(release_error) = self.ledger.release(&node, &pool, 1) {
                log::error!("Failed to release {}/{} after a failed record append: {}. One unit of capacity is leaked.", node, pool, release_error);
            }

            log::warn!("Booking of {}/{} rolled back, the record append failed: {}", node, pool, append_error);
            return Err(append_error);
        }

        log::info!("Requester {} booked one unit of {}/{} as reservation {}. {} remaining.", reservation.requester, node, pool, reservation.name, remaining);

        Ok(BookingReceipt { reservation, remaining })
    }

    /// Cancels a reservation on behalf of its owner.
    ///
    /// The record is marked `Cancelled` before the ledger release, so there
    /// is no window where capacity is restored while the reservation still
    /// appears `Active`. Cancelling twice is detected (`AlreadyCancelled`),
    /// not silently accepted, so callers can tell a race from a bug.
    pub fn cancel(&self, name: &ReservationName, acting_requester: &RequesterId) -> Result<()> {
        let handle = self.store.get_by_name(name).ok_or_else(|| Error::NotFound(name.clone()))?;

        let (node, pool) = {
            let mut record = handle.write().expect("RwLock poisoned");

            if &record.requester != acting_requester {
                return Err(Error::Forbidden { reservation: name.clone(), requester: acting_requester.clone() });
            }

            if record.state == ReservationState::Cancelled {
                return Err(Error::AlreadyCancelled(name.clone()));
            }

            record.state = ReservationState::Cancelled;
            (record.node.clone(), record.pool.clone())
        };

        // Record is durably Cancelled; now return the unit. An over-release
        // clamp here is logged by the ledger and points at an upstream
        // bookkeeping bug, not at this caller.
        self.ledger.release(&node, &pool, 1)?;

        log::info!("Reservation {} cancelled by {}. Unit returned to {}/{}.", name, acting_requester, node, pool);
        Ok(())
    }

    /// All reservations of one requester, newest first. Pagination is left
    /// to the caller.
    pub fn list_by_requester(&self, requester: &RequesterId) -> Vec<Reservation> {
        self.store.list_by_requester(requester)
    }
}
