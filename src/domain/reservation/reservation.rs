use chrono::{DateTime, Utc};

use crate::domain::utils::id::{NodeId, PoolId, RequesterId, ReservationName};

/// Lifecycle state of a reservation.
///
/// There is no "completed" state distinct from `Active`; a booking remains
/// `Active` until explicitly cancelled. `Cancelled` is terminal — a
/// cancelled reservation is never re-activated, a new one is created
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationState {
    /// The reservation holds one claimed capacity unit.
    Active,

    /// The unit has been returned to the pool. Terminal.
    Cancelled,
}

/// A record of one claimed capacity unit.
///
/// Exclusively owned by the reservation engine; no other component mutates
/// these records directly.
#[derive(Debug, Clone)]
pub struct Reservation {
    /// A globally unique identifier for this reservation.
    pub name: ReservationName,

    /// Who holds the unit.
    pub requester: RequesterId,

    /// Which node's pool the unit was claimed from.
    pub node: NodeId,
    pub pool: PoolId,

    pub created_at: DateTime<Utc>,
    pub state: ReservationState,
}

impl Reservation {
    pub fn new(name: ReservationName, requester: RequesterId, node: NodeId, pool: PoolId) -> Self {
        Reservation { name, requester, node, pool, created_at: Utc::now(), state: ReservationState::Active }
    }
}
