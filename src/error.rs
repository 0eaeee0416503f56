use thiserror::Error;

use crate::domain::utils::id::{NodeId, PoolId, RequesterId, ReservationName};

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse node registry JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    /// Malformed geo input (latitude/longitude/radius out of range).
    #[error("Invalid geo query: {0}")]
    InvalidQuery(String),

    /// The spatial index cannot answer queries. Absorbed by the fallback
    /// coordinator, never surfaced to search callers as a hard failure.
    #[error("Proximity index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Unknown node: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {node} has no capacity pool {pool}")]
    PoolNotFound { node: NodeId, pool: PoolId },

    #[error("A node with id {0} is already registered")]
    DuplicateNode(NodeId),

    #[error("Claim/release amount must be positive, got {0}")]
    InvalidAmount(i64),

    /// Business condition, not a bug: the pool has fewer units left than
    /// the claim asked for.
    #[error("Pool {pool} of node {node} is exhausted")]
    Exhausted { node: NodeId, pool: PoolId },

    #[error("Unknown reservation: {0}")]
    NotFound(ReservationName),

    #[error("Reservation {0} is already cancelled")]
    AlreadyCancelled(ReservationName),

    #[error("Requester {requester} does not own reservation {reservation}")]
    Forbidden { reservation: ReservationName, requester: RequesterId },

    #[error("A reservation named {0} already exists")]
    DuplicateReservation(ReservationName),

    #[error("Geocoding failed: {0}")]
    Geocode(String),
}

impl Error {
    /// Stable machine-readable kind, used by response layers to map errors
    /// without matching on payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::IoError(_) => "io",
            Error::DeserializationError(_) => "deserialization",
            Error::InvalidQuery(_) => "invalid_query",
            Error::IndexUnavailable(_) => "index_unavailable",
            Error::NodeNotFound(_) => "node_not_found",
            Error::PoolNotFound { .. } => "pool_not_found",
            Error::DuplicateNode(_) => "duplicate_node",
            Error::InvalidAmount(_) => "invalid_amount",
            Error::Exhausted { .. } => "exhausted",
            Error::NotFound(_) => "not_found",
            Error::AlreadyCancelled(_) => "already_cancelled",
            Error::Forbidden { .. } => "forbidden",
            Error::DuplicateReservation(_) => "duplicate_reservation",
            Error::Geocode(_) => "geocode",
        }
    }

    /// True for conditions an end user can run into during normal operation
    /// (shown as a disabled action), false for unexpected system faults
    /// (shown as a generic failure with a retry suggestion).
    pub fn is_business_condition(&self) -> bool {
        matches!(
            self,
            Error::Exhausted { .. } | Error::AlreadyCancelled(_) | Error::NotFound(_) | Error::Forbidden { .. }
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Geocode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
