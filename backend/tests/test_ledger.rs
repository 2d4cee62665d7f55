//! Tests for the priority ledger
//!
//! Greedy admission by cost, capacity, atomicity, carry-over of skipped
//! transactions and age-based eviction.

use arena_simulator_core_rs::ledger::{LedgerConfig, LedgerError, PriorityLedger};
use arena_simulator_core_rs::{Team, Transaction};
use proptest::prelude::*;

fn ledger(capacity: u64) -> PriorityLedger {
    PriorityLedger::new(LedgerConfig {
        capacity,
        max_pending_age: None,
    })
}

fn submit_all(ledger: &mut PriorityLedger, costs: &[u32], round: u32) {
    for (i, &cost) in costs.iter().enumerate() {
        ledger.submit(Team::A, Transaction::new(cost, vec![i as i32]), round);
    }
}

#[test]
fn test_admits_highest_cost_first() {
    let mut ledger = ledger(10);
    submit_all(&mut ledger, &[3, 7, 4], 1);

    let admission = ledger.admit(1).unwrap();
    let block = ledger.block(1).unwrap();

    let costs: Vec<u32> = block.transactions().iter().map(|tx| tx.cost()).collect();
    assert_eq!(costs, vec![7, 3]);
    assert_eq!(admission.total_cost, 10);
    assert_eq!(admission.skipped, 1);
    assert_eq!(ledger.pending()[0].transaction.cost(), 4);
}

#[test]
fn test_scan_continues_past_transaction_that_does_not_fit() {
    // 8 fits, 5 does not, 2 still does
    let mut ledger = ledger(10);
    submit_all(&mut ledger, &[5, 8, 2], 1);

    ledger.admit(1).unwrap();
    let costs: Vec<u32> = ledger
        .block(1)
        .unwrap()
        .transactions()
        .iter()
        .map(|tx| tx.cost())
        .collect();
    assert_eq!(costs, vec![8, 2]);
}

#[test]
fn test_skipped_transactions_carry_over_unchanged() {
    let mut ledger = ledger(6);
    ledger.submit(Team::A, Transaction::new(5, vec![1]), 1);
    ledger.submit(Team::B, Transaction::new(4, vec![2]), 1);
    ledger.admit(1).unwrap();

    assert_eq!(ledger.pending().len(), 1);
    let carried = ledger.pending()[0].clone();
    assert_eq!(carried.team, Team::B);
    assert_eq!(carried.submitted_round, 1);

    ledger.submit(Team::A, Transaction::new(1, vec![3]), 2);
    ledger.admit(2).unwrap();
    let block = ledger.block(2).unwrap();
    assert!(block.contains_message("2"));
    assert!(block.contains_message("3"));
    assert!(ledger.pending().is_empty());
}

#[test]
fn test_empty_round_still_gets_a_block() {
    let mut ledger = ledger(10);
    let admission = ledger.admit(1).unwrap();

    assert_eq!(admission.admitted, 0);
    assert!(ledger.block(1).unwrap().is_empty());
    assert_eq!(ledger.num_blocks(), 1);
}

#[test]
fn test_admission_rounds_move_forward() {
    let mut ledger = ledger(10);
    ledger.admit(2).unwrap();

    assert_eq!(
        ledger.admit(2),
        Err(LedgerError::BlockAlreadyAdmitted { round: 2 })
    );
    assert_eq!(
        ledger.admit(1),
        Err(LedgerError::RoundOutOfOrder { round: 1, last: 2 })
    );
    assert_eq!(ledger.latest_block().map(|b| b.round()), Some(2));
}

#[test]
fn test_eviction_discards_only_over_age() {
    let mut ledger = PriorityLedger::new(LedgerConfig {
        capacity: 1,
        max_pending_age: Some(2),
    });
    ledger.submit(Team::A, Transaction::new(5, vec![1]), 1);
    ledger.submit(Team::A, Transaction::new(5, vec![2]), 2);

    // Neither fits; both still young
    assert!(ledger.admit(2).unwrap().evicted.is_empty());
    assert!(ledger.admit(3).unwrap().evicted.is_empty());

    // Round 4: the round-1 transaction is three rounds old
    let admission = ledger.admit(4).unwrap();
    assert_eq!(admission.evicted.len(), 1);
    assert_eq!(admission.evicted[0].transaction.message(), &[1]);
    assert_eq!(ledger.pending().len(), 1);
    assert_eq!(ledger.pending()[0].transaction.message(), &[2]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn admitted_cost_never_exceeds_capacity(
        capacity in 1u64..200,
        costs in prop::collection::vec(0u32..120, 0..40),
    ) {
        let mut ledger = ledger(capacity);
        submit_all(&mut ledger, &costs, 1);
        let admission = ledger.admit(1).unwrap();

        prop_assert!(admission.total_cost <= capacity);
        prop_assert_eq!(admission.admitted + admission.skipped, costs.len());
    }

    #[test]
    fn admission_matches_greedy_scan(
        capacity in 1u64..200,
        costs in prop::collection::vec(0u32..120, 0..40),
    ) {
        let mut ledger = ledger(capacity);
        submit_all(&mut ledger, &costs, 1);
        ledger.admit(1).unwrap();

        // Reference: stable sort by cost descending, then scan
        let mut order: Vec<usize> = (0..costs.len()).collect();
        order.sort_by(|&a, &b| costs[b].cmp(&costs[a]));
        let mut remaining = capacity;
        let mut expected = Vec::new();
        for i in order {
            if costs[i] as u64 <= remaining {
                remaining -= costs[i] as u64;
                expected.push(i as i32);
            }
        }

        let admitted: Vec<i32> = ledger
            .block(1)
            .unwrap()
            .transactions()
            .iter()
            .map(|tx| tx.message()[0])
            .collect();
        prop_assert_eq!(admitted, expected);

        // Whatever was skipped stays pending in arrival order
        let arrivals: Vec<u64> = ledger.pending().iter().map(|p| p.arrival).collect();
        let mut sorted = arrivals.clone();
        sorted.sort();
        prop_assert_eq!(arrivals, sorted);
    }
}
