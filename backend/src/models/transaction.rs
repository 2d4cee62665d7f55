//! Transaction model
//!
//! A transaction is a bid for space in a round's block: a cost (the priority
//! key, paid in team resources) and a message of integers. Transactions are
//! immutable once built.
//!
//! The serialized message (values joined by `_`) is computed once at
//! construction and reused for hashing and lookup. It depends only on the
//! message, never on the cost.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Delimiter used by [`Transaction::serialized_message`]
pub const MESSAGE_DELIMITER: &str = "_";

/// A cost-prioritized message bid
///
/// # Example
/// ```
/// use arena_simulator_core_rs::Transaction;
///
/// let tx = Transaction::new(10, vec![1, 2, 3]);
/// assert_eq!(tx.cost(), 10);
/// assert_eq!(tx.message(), &[1, 2, 3]);
/// assert_eq!(tx.serialized_message(), "1_2_3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "TransactionWire")]
pub struct Transaction {
    cost: u32,
    message: Vec<i32>,
    serialized_message: String,
}

impl Transaction {
    pub fn new(cost: u32, message: Vec<i32>) -> Self {
        let serialized_message = serialize_message(&message);
        Self {
            cost,
            message,
            serialized_message,
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn message(&self) -> &[i32] {
        &self.message
    }

    pub fn serialized_message(&self) -> &str {
        &self.serialized_message
    }
}

/// Stored form; the serialized message is rebuilt from the payload
#[derive(Deserialize)]
struct TransactionWire {
    cost: u32,
    message: Vec<i32>,
}

impl From<TransactionWire> for Transaction {
    fn from(wire: TransactionWire) -> Self {
        Transaction::new(wire.cost, wire.message)
    }
}

/// Higher cost sorts first; equal costs fall back to the message so the
/// order stays total and consistent with `Eq`
impl Ord for Transaction {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| self.message.cmp(&other.message))
    }
}

impl PartialOrd for Transaction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn serialize_message(message: &[i32]) -> String {
    message
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(MESSAGE_DELIMITER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_message_serializes_to_empty_string() {
        let tx = Transaction::new(3, vec![]);
        assert_eq!(tx.serialized_message(), "");
    }

    #[test]
    fn test_negative_values_keep_their_sign() {
        let tx = Transaction::new(3, vec![-4, 0, 12]);
        assert_eq!(tx.serialized_message(), "-4_0_12");
    }
}
