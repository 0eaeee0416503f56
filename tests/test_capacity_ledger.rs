use std::sync::Arc;
use std::thread;

use rand::Rng;

use medgrid::domain::ledger::capacity_ledger::CapacityLedger;
use medgrid::domain::utils::id::{NodeId, PoolId};
use medgrid::error::Error;

fn ledger_with(capacity: i64) -> (CapacityLedger, NodeId, PoolId) {
    let ledger = CapacityLedger::new();
    let node = NodeId::new("hosp-001");
    let pool = PoolId::new("beds");

    ledger.register_pool(&node, &pool, capacity).unwrap();
    (ledger, node, pool)
}

#[test]
fn test_claim_decrements_and_returns_new_count() {
    let (ledger, node, pool) = ledger_with(5);

    assert_eq!(ledger.try_claim(&node, &pool, 1).unwrap(), 4);
    assert_eq!(ledger.try_claim(&node, &pool, 2).unwrap(), 2);
    assert_eq!(ledger.available(&node, &pool).unwrap(), 2);
    assert_eq!(ledger.administered(&node, &pool).unwrap(), 5);
}

#[test]
fn test_claim_on_exhausted_pool_fails() {
    let (ledger, node, pool) = ledger_with(1);

    assert_eq!(ledger.try_claim(&node, &pool, 1).unwrap(), 0);
    assert!(matches!(ledger.try_claim(&node, &pool, 1), Err(Error::Exhausted { .. })));
    assert_eq!(ledger.available(&node, &pool).unwrap(), 0);
}

#[test]
fn test_claim_larger_than_remaining_fails_without_partial_decrement() {
    let (ledger, node, pool) = ledger_with(2);

    assert!(matches!(ledger.try_claim(&node, &pool, 3), Err(Error::Exhausted { .. })));
    assert_eq!(ledger.available(&node, &pool).unwrap(), 2);
}

#[test]
fn test_non_positive_amounts_are_rejected() {
    let (ledger, node, pool) = ledger_with(2);

    assert!(matches!(ledger.try_claim(&node, &pool, 0), Err(Error::InvalidAmount(0))));
    assert!(matches!(ledger.try_claim(&node, &pool, -1), Err(Error::InvalidAmount(-1))));
    assert!(matches!(ledger.release(&node, &pool, 0), Err(Error::InvalidAmount(0))));
    assert!(matches!(ledger.admin_set(&node, &pool, -5), Err(Error::InvalidAmount(-5))));
}

#[test]
fn test_unknown_node_and_unknown_pool_are_distinguished() {
    let (ledger, node, _pool) = ledger_with(2);

    let stranger = NodeId::new("hosp-999");
    let oxygen = PoolId::new("oxygen");

    assert!(matches!(ledger.try_claim(&stranger, &oxygen, 1), Err(Error::NodeNotFound(_))));
    assert!(matches!(ledger.try_claim(&node, &oxygen, 1), Err(Error::PoolNotFound { .. })));
}

#[test]
fn test_release_restores_and_clamps_over_release() {
    let (ledger, node, pool) = ledger_with(3);

    ledger.try_claim(&node, &pool, 2).unwrap();

    let outcome = ledger.release(&node, &pool, 1).unwrap();
    assert_eq!(outcome.available, 2);
    assert!(!outcome.clamped);

    // Releasing more than was claimed clamps at the administered baseline
    // and reports the anomaly without failing.
    let outcome = ledger.release(&node, &pool, 5).unwrap();
    assert_eq!(outcome.available, 3);
    assert!(outcome.clamped);
    assert_eq!(ledger.available(&node, &pool).unwrap(), 3);
}

#[test]
fn test_release_of_a_huge_amount_clamps_instead_of_overflowing() {
    let (ledger, node, pool) = ledger_with(3);

    ledger.try_claim(&node, &pool, 1).unwrap();

    let outcome = ledger.release(&node, &pool, i64::MAX).unwrap();
    assert_eq!(outcome.available, 3);
    assert!(outcome.clamped);
}

#[test]
fn test_admin_set_redefines_the_baseline() {
    let (ledger, node, pool) = ledger_with(3);

    ledger.try_claim(&node, &pool, 3).unwrap();

    ledger.admin_set(&node, &pool, 10).unwrap();
    assert_eq!(ledger.available(&node, &pool).unwrap(), 10);
    assert_eq!(ledger.administered(&node, &pool).unwrap(), 10);

    // An absolute set on a pool the node never had creates it.
    let oxygen = PoolId::new("oxygen");
    ledger.admin_set(&node, &oxygen, 7).unwrap();
    assert_eq!(ledger.available(&node, &oxygen).unwrap(), 7);

    let stranger = NodeId::new("hosp-999");
    assert!(matches!(ledger.admin_set(&stranger, &pool, 1), Err(Error::NodeNotFound(_))));
}

#[test]
fn test_concurrent_claims_never_overbook() {
    let (ledger, node, pool) = ledger_with(3);
    let ledger = Arc::new(ledger);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = ledger.clone();
            let node = node.clone();
            let pool = pool.clone();
            thread::spawn(move || ledger.try_claim(&node, &pool, 1))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();

    let successes = results.iter().filter(|result| result.is_ok()).count();
    let exhausted = results.iter().filter(|result| matches!(result, Err(Error::Exhausted { .. }))).count();

    assert_eq!(successes, 3);
    assert_eq!(exhausted, 5);
    assert_eq!(ledger.available(&node, &pool).unwrap(), 0);
}

#[test]
fn test_conservation_holds_over_a_random_claim_release_sequence() {
    let (ledger, node, pool) = ledger_with(10);
    let mut rng = rand::rng();
    let mut active: i64 = 0;

    for _ in 0..500 {
        if rng.random_bool(0.5) {
            if ledger.try_claim(&node, &pool, 1).is_ok() {
                active += 1;
            }
        } else if active > 0 {
            ledger.release(&node, &pool, 1).unwrap();
            active -= 1;
        }

        // administered - active claims == available, after every operation.
        assert_eq!(ledger.administered(&node, &pool).unwrap() - active, ledger.available(&node, &pool).unwrap());
    }
}
