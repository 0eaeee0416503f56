use serde::Serialize;
use std::collections::HashMap;

use crate::domain::reservation::reservation::{Reservation, ReservationState};

/// One node of a search response. `distance_km` is absent for degraded
/// entries; callers re-check it themselves where exactness matters.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SearchNodeDto {
    pub id: String,
    pub name: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,

    /// Remaining units per pool at response time.
    pub pools: HashMap<String, i64>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponseDto {
    pub nodes: Vec<SearchNodeDto>,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponseDto {
    pub reservation_id: String,
    pub remaining: i64,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponseDto {
    pub ok: bool,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDto {
    pub reservation_id: String,
    pub node_id: String,
    pub pool: String,
    pub created_at: String,
    pub state: String,
}

impl From<&Reservation> for ReservationDto {
    fn from(reservation: &Reservation) -> Self {
        let state = match reservation.state {
            ReservationState::Active => "Active",
            ReservationState::Cancelled => "Cancelled",
        };

        ReservationDto {
            reservation_id: reservation.name.to_string(),
            node_id: reservation.node.to_string(),
            pool: reservation.pool.to_string(),
            created_at: reservation.created_at.to_rfc3339(),
            state: state.to_string(),
        }
    }
}
