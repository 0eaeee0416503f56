use std::collections::HashMap;

use medgrid::bootstrap_from_file;
use medgrid::domain::geo::point::GeoPoint;
use medgrid::domain::node::resource_node::ResourceNode;
use medgrid::domain::utils::id::{NodeId, PoolId};
use medgrid::error::Error;
use medgrid::geocoder::{Geocoder, StaticGeocoder};
use medgrid::service::MedGridService;

const SEED_FILE: &str = "src/data/nodes.json";

#[test]
fn test_bootstrap_seeds_all_nodes_from_the_file() {
    let service = bootstrap_from_file(SEED_FILE).unwrap();

    assert_eq!(service.node_count(), 5);
    assert_eq!(service.available("hosp-delhi-001", "beds").unwrap(), 42);
    assert_eq!(service.available("hosp-delhi-001", "oxygen").unwrap(), 120);

    // The Chennai entry has no oxygen pool at all.
    assert!(matches!(service.available("hosp-chennai-001", "oxygen"), Err(Error::PoolNotFound { .. })));
}

#[test]
fn test_search_around_delhi_ranks_by_distance() {
    let service = bootstrap_from_file(SEED_FILE).unwrap();

    // Connaught Place, a few km north of both Delhi hospitals.
    let response = service.search(28.6315, 77.2167, Some(50.0), None).unwrap();

    assert!(!response.degraded);
    assert!(response.reason.is_none());
    assert_eq!(response.nodes.len(), 2);

    let distances: Vec<f64> = response.nodes.iter().map(|node| node.distance_km.unwrap()).collect();
    assert!(distances[0] <= distances[1]);
    assert!(distances.iter().all(|distance| *distance <= 50.0));
    assert!(response.nodes.iter().all(|node| node.pools.contains_key("beds")));
}

#[test]
fn test_pool_filter_drops_nodes_without_free_units() {
    let service = bootstrap_from_file(SEED_FILE).unwrap();

    // Victoria Hospital is seeded with zero beds.
    let response = service.search(12.9716, 77.5946, Some(50.0), Some("beds")).unwrap();
    assert!(response.degraded);

    let response = service.search(12.9716, 77.5946, Some(50.0), Some("oxygen")).unwrap();
    assert!(!response.degraded);
    assert_eq!(response.nodes[0].id, "hosp-bangalore-001");
}

#[test]
fn test_search_far_from_everything_returns_a_degraded_sample() {
    let service = bootstrap_from_file(SEED_FILE).unwrap();

    let response = service.search(0.0, 0.0, Some(1.0), None).unwrap();

    assert!(response.degraded);
    assert_eq!(response.reason.as_deref(), Some("no nodes in radius"));
    assert_eq!(response.nodes.len(), 5);
    assert!(response.nodes.iter().all(|node| node.distance_km.is_none()));
}

#[test]
fn test_invalid_coordinates_are_not_absorbed_by_the_fallback() {
    let service = bootstrap_from_file(SEED_FILE).unwrap();

    assert!(matches!(service.search(95.0, 0.0, None, None), Err(Error::InvalidQuery(_))));
    assert!(matches!(service.search(0.0, 0.0, Some(-1.0), None), Err(Error::InvalidQuery(_))));
}

#[test]
fn test_rejected_registration_leaves_no_partial_node_behind() {
    let service = MedGridService::new();

    let node = ResourceNode {
        id: NodeId::new("hosp-retry-001"),
        name: "Retry Hospital".to_string(),
        address: "1 Retry Road".to_string(),
        city: "Retryville".to_string(),
        location: GeoPoint::new(10.0, 10.0).unwrap(),
        pools: HashMap::from([(PoolId::new("beds"), -3)]),
    };

    assert!(matches!(service.register_node(node.clone()), Err(Error::InvalidAmount(-3))));
    assert_eq!(service.node_count(), 0);

    // The corrected retry must not trip over a half-registered node.
    let mut corrected = node;
    corrected.pools.insert(PoolId::new("beds"), 3);
    service.register_node(corrected).unwrap();

    assert_eq!(service.node_count(), 1);
    assert_eq!(service.available("hosp-retry-001", "beds").unwrap(), 3);
}

#[test]
fn test_book_and_cancel_through_the_service() {
    let service = bootstrap_from_file(SEED_FILE).unwrap();

    let booking = service.book("user-1", "hosp-mumbai-001", "beds").unwrap();
    assert_eq!(booking.remaining, 26);

    let listed = service.list_reservations("user-1");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].state, "Active");
    assert_eq!(listed[0].reservation_id, booking.reservation_id);

    let cancelled = service.cancel(&booking.reservation_id, "user-1").unwrap();
    assert!(cancelled.ok);
    assert_eq!(service.available("hosp-mumbai-001", "beds").unwrap(), 27);

    assert!(matches!(service.cancel(&booking.reservation_id, "user-1"), Err(Error::AlreadyCancelled(_))));
}

#[test]
fn test_exhausted_booking_is_a_business_condition_not_a_fault() {
    let service = bootstrap_from_file(SEED_FILE).unwrap();

    let error = service.book("user-1", "hosp-bangalore-001", "beds").unwrap_err();

    assert_eq!(error.kind(), "exhausted");
    assert!(error.is_business_condition());

    let error = service.book("user-1", "no-such-hospital", "beds").unwrap_err();
    assert_eq!(error.kind(), "node_not_found");
    assert!(!error.is_business_condition());
}

#[test]
fn test_idempotent_booking_through_the_service() {
    let service = bootstrap_from_file(SEED_FILE).unwrap();

    let first = service.book_with_key("user-1", "hosp-delhi-002", "beds", "retry-7").unwrap();
    assert_eq!(first.remaining, 17);

    let retry = service.book_with_key("user-1", "hosp-delhi-002", "beds", "retry-7");
    assert!(matches!(retry, Err(Error::DuplicateReservation(_))));
    assert_eq!(service.available("hosp-delhi-002", "beds").unwrap(), 17);
}

#[test]
fn test_admin_updates_change_capacity_and_position() {
    let service = bootstrap_from_file(SEED_FILE).unwrap();

    service.admin_set_capacity("hosp-bangalore-001", "beds", 12).unwrap();
    assert_eq!(service.available("hosp-bangalore-001", "beds").unwrap(), 12);

    // Move the Chennai node next to the Delhi origin; the index follows.
    service.update_location("hosp-chennai-001", 28.63, 77.22).unwrap();

    let response = service.search(28.6315, 77.2167, Some(50.0), None).unwrap();
    assert!(response.nodes.iter().any(|node| node.id == "hosp-chennai-001"));
}

#[tokio::test]
async fn test_static_geocoder_resolves_known_addresses() {
    let geocoder = StaticGeocoder::new().with("Ansari Nagar, New Delhi", GeoPoint::new(28.567, 77.21).unwrap());

    let point = geocoder.geocode("Ansari Nagar, New Delhi").await.unwrap();
    assert!((point.lat - 28.567).abs() < 1e-9);

    let miss = geocoder.geocode("Nowhere Street 1").await;
    assert!(matches!(miss, Err(Error::Geocode(_))));
}
