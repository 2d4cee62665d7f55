//! Blocks: the transactions admitted in one round

use crate::models::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// Transactions admitted into a single round, in admission order
/// (cost descending, arrival ascending)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BlockWire")]
pub struct Block {
    round: u32,
    transactions: Vec<Transaction>,
    total_cost: u64,
}

#[derive(Deserialize)]
struct BlockWire {
    round: u32,
    transactions: Vec<Transaction>,
}

impl From<BlockWire> for Block {
    fn from(wire: BlockWire) -> Self {
        Block::new(wire.round, wire.transactions)
    }
}

impl Block {
    pub(crate) fn new(round: u32, transactions: Vec<Transaction>) -> Self {
        let total_cost = transactions.iter().map(|tx| tx.cost() as u64).sum();
        Self {
            round,
            transactions,
            total_cost,
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn total_cost(&self) -> u64 {
        self.total_cost
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// True if a transaction with this serialized message was admitted
    pub fn contains_message(&self, serialized: &str) -> bool {
        self.transactions
            .iter()
            .any(|tx| tx.serialized_message() == serialized)
    }
}
