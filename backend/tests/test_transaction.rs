//! Tests for the Transaction model

use arena_simulator_core_rs::models::transaction::MESSAGE_DELIMITER;
use arena_simulator_core_rs::Transaction;
use std::collections::HashSet;

#[test]
fn test_transaction_new() {
    let tx = Transaction::new(10, vec![1, 2, 3]);

    assert_eq!(tx.cost(), 10);
    assert_eq!(tx.message(), &[1, 2, 3]);
    assert_eq!(tx.serialized_message(), "1_2_3");
}

#[test]
fn test_serialized_message_ignores_cost() {
    let cheap = Transaction::new(1, vec![7, 8]);
    let dear = Transaction::new(900, vec![7, 8]);

    assert_eq!(cheap.serialized_message(), dear.serialized_message());
    assert_ne!(cheap, dear);
}

#[test]
fn test_single_value_has_no_delimiter() {
    let tx = Transaction::new(4, vec![42]);
    assert_eq!(tx.serialized_message(), "42");
    assert!(!tx.serialized_message().contains(MESSAGE_DELIMITER));
}

#[test]
fn test_sort_orders_by_cost_descending() {
    let mut txs = vec![
        Transaction::new(5, vec![1]),
        Transaction::new(10, vec![1]),
        Transaction::new(1, vec![1]),
    ];
    txs.sort();

    let costs: Vec<u32> = txs.iter().map(|tx| tx.cost()).collect();
    assert_eq!(costs, vec![10, 5, 1]);
}

#[test]
fn test_equal_costs_fall_back_to_message() {
    let mut txs = vec![
        Transaction::new(5, vec![1]),
        Transaction::new(20, vec![2]),
        Transaction::new(1, vec![3]),
        Transaction::new(20, vec![0]),
    ];
    txs.sort();

    let costs: Vec<u32> = txs.iter().map(|tx| tx.cost()).collect();
    assert_eq!(costs, vec![20, 20, 5, 1]);
    // Equal costs fall back to the message
    assert_eq!(txs[0].message(), &[0]);
    assert_eq!(txs[1].message(), &[2]);
}

#[test]
fn test_equal_transactions_hash_alike() {
    let mut set = HashSet::new();
    set.insert(Transaction::new(3, vec![1, 2]));
    set.insert(Transaction::new(3, vec![1, 2]));
    set.insert(Transaction::new(3, vec![2, 1]));

    assert_eq!(set.len(), 2);
}

#[test]
fn test_serde_keeps_message_and_cost() {
    let tx = Transaction::new(12, vec![-1, 0, 1]);
    let json = serde_json::to_string(&tx).unwrap();
    let back: Transaction = serde_json::from_str(&json).unwrap();

    assert_eq!(back, tx);
    assert_eq!(back.serialized_message(), "-1_0_1");
}

#[test]
fn test_deserialize_rebuilds_serialized_message() {
    let json = r#"{"cost":1,"message":[1,2,3],"serialized_message":"9_9_9"}"#;
    let tx: Transaction = serde_json::from_str(json).unwrap();

    assert_eq!(tx.serialized_message(), "1_2_3");
    assert_eq!(tx, Transaction::new(1, vec![1, 2, 3]));
}
