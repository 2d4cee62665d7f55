//! Priority Ledger
//!
//! Robots submit transactions during their turns. Once per round the ledger
//! admits a subset of the pending transactions into that round's block,
//! under a fixed capacity expressed in the same units as transaction costs.
//!
//! # Admission (greedy by cost)
//!
//! ```text
//! 1. Evict transactions older than max_pending_age (if configured)
//! 2. Order pending by (cost desc, arrival asc)
//! 3. Scan in that order:
//!      cost <= remaining capacity → admit, remaining -= cost
//!      otherwise                  → skip, keep scanning
//! 4. Skipped transactions stay pending, unchanged, for the next round
//! ```
//!
//! Admission is deliberately not a knapsack solve: greedy order is
//! predictable and auditable, at the price of not maximising admitted cost.
//!
//! # Critical Invariants
//!
//! 1. **Capacity**: a block's total cost never exceeds the capacity
//! 2. **Atomicity**: a transaction is admitted whole or not at all
//! 3. **Stability**: equal costs are admitted oldest first
//! 4. **Immutability**: pending transactions are never modified

mod block;

pub use block::Block;

use crate::models::robot::Team;
use crate::models::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("Block for round {round} was already admitted")]
    BlockAlreadyAdmitted { round: u32 },

    #[error("Cannot admit round {round} after round {last}")]
    RoundOutOfOrder { round: u32, last: u32 },
}

/// Ledger settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Maximum total cost admitted per round
    pub capacity: u64,

    /// Rounds a transaction may stay pending before it is discarded.
    /// `None` keeps transactions pending for the rest of the match.
    #[serde(default)]
    pub max_pending_age: Option<u32>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            max_pending_age: None,
        }
    }
}

/// A transaction waiting for admission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    /// Position in submission order across the whole match
    pub arrival: u64,
    pub submitted_round: u32,
    pub team: Team,
    pub transaction: Transaction,
}

impl PendingTransaction {
    pub fn cost(&self) -> u64 {
        self.transaction.cost() as u64
    }
}

/// Outcome of one admission pass
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    pub round: u32,
    /// Number of transactions placed in the block
    pub admitted: usize,
    pub total_cost: u64,
    /// Transactions that did not fit and remain pending
    pub skipped: usize,
    /// Transactions discarded by the age policy before admission
    pub evicted: Vec<PendingTransaction>,
}

/// Capacity-bounded, cost-prioritized transaction admission
///
/// # Example
/// ```
/// use arena_simulator_core_rs::ledger::{LedgerConfig, PriorityLedger};
/// use arena_simulator_core_rs::{Team, Transaction};
///
/// let mut ledger = PriorityLedger::new(LedgerConfig { capacity: 12, max_pending_age: None });
/// ledger.submit(Team::A, Transaction::new(5, vec![1]), 1);
/// ledger.submit(Team::B, Transaction::new(10, vec![2]), 1);
/// ledger.submit(Team::A, Transaction::new(1, vec![3]), 1);
///
/// let admission = ledger.admit(1).unwrap();
/// assert_eq!(admission.admitted, 2); // 10 then 1; 5 no longer fits
/// assert_eq!(ledger.pending().len(), 1);
/// assert_eq!(ledger.block(1).unwrap().total_cost(), 11);
/// ```
#[derive(Debug, Clone)]
pub struct PriorityLedger {
    config: LedgerConfig,
    /// Pending transactions in arrival order
    pending: Vec<PendingTransaction>,
    next_arrival: u64,
    blocks: BTreeMap<u32, Block>,
}

impl PriorityLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            pending: Vec::new(),
            next_arrival: 0,
            blocks: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn capacity(&self) -> u64 {
        self.config.capacity
    }

    /// Queue a transaction; returns its arrival sequence number
    pub fn submit(&mut self, team: Team, transaction: Transaction, round: u32) -> u64 {
        let arrival = self.next_arrival;
        self.next_arrival += 1;
        self.pending.push(PendingTransaction {
            arrival,
            submitted_round: round,
            team,
            transaction,
        });
        arrival
    }

    /// Pending transactions, oldest first
    pub fn pending(&self) -> &[PendingTransaction] {
        &self.pending
    }

    pub fn block(&self, round: u32) -> Option<&Block> {
        self.blocks.get(&round)
    }

    pub fn latest_block(&self) -> Option<&Block> {
        self.blocks.values().next_back()
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Build the block for `round`
    pub fn admit(&mut self, round: u32) -> Result<Admission, LedgerError> {
        if self.blocks.contains_key(&round) {
            return Err(LedgerError::BlockAlreadyAdmitted { round });
        }
        if let Some(&last) = self.blocks.keys().next_back() {
            if round < last {
                return Err(LedgerError::RoundOutOfOrder { round, last });
            }
        }

        let evicted = self.evict_expired(round);

        let mut order: Vec<usize> = (0..self.pending.len()).collect();
        order.sort_by(|&a, &b| {
            let (a, b) = (&self.pending[a], &self.pending[b]);
            b.cost().cmp(&a.cost()).then(a.arrival.cmp(&b.arrival))
        });

        let mut remaining = self.config.capacity;
        let mut admitted = vec![false; self.pending.len()];
        let mut block_order = Vec::new();
        for index in order {
            let candidate = &self.pending[index];
            if candidate.cost() <= remaining {
                remaining -= candidate.cost();
                admitted[index] = true;
                block_order.push(index);
            } else {
                trace!(
                    round,
                    arrival = candidate.arrival,
                    cost = candidate.cost(),
                    remaining,
                    "transaction does not fit this round"
                );
            }
        }

        let transactions: Vec<Transaction> = block_order
            .iter()
            .map(|&i| self.pending[i].transaction.clone())
            .collect();

        let mut flags = admitted.into_iter();
        self.pending.retain(|_| !flags.next().unwrap_or(false));

        let block = Block::new(round, transactions);
        let admission = Admission {
            round,
            admitted: block.len(),
            total_cost: block.total_cost(),
            skipped: self.pending.len(),
            evicted,
        };
        self.blocks.insert(round, block);
        Ok(admission)
    }

    fn evict_expired(&mut self, round: u32) -> Vec<PendingTransaction> {
        let Some(max_age) = self.config.max_pending_age else {
            return Vec::new();
        };

        let (expired, kept): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|p| round.saturating_sub(p.submitted_round) > max_age);
        self.pending = kept;
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger(capacity: u64) -> PriorityLedger {
        PriorityLedger::new(LedgerConfig {
            capacity,
            max_pending_age: None,
        })
    }

    #[test]
    fn test_ties_admitted_oldest_first() {
        let mut ledger = ledger(5);
        ledger.submit(Team::A, Transaction::new(5, vec![1]), 1);
        ledger.submit(Team::B, Transaction::new(5, vec![2]), 1);

        ledger.admit(1).unwrap();

        assert_eq!(ledger.block(1).unwrap().transactions()[0].message(), &[1]);
        assert_eq!(ledger.pending()[0].transaction.message(), &[2]);
    }

    #[test]
    fn test_oversized_transaction_stays_pending() {
        let mut ledger = ledger(10);
        ledger.submit(Team::A, Transaction::new(50, vec![9]), 1);

        for round in 1..=3 {
            let admission = ledger.admit(round).unwrap();
            assert_eq!(admission.admitted, 0);
            assert_eq!(admission.skipped, 1);
        }
        assert_eq!(ledger.pending()[0].arrival, 0);
    }

    #[test]
    fn test_rejects_duplicate_and_backwards_rounds() {
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
    }

    #[test]
    fn test_eviction_by_age() {
        let mut ledger = PriorityLedger::new(LedgerConfig {
            capacity: 1,
            max_pending_age: Some(1),
        });
        ledger.submit(Team::A, Transaction::new(5, vec![1]), 1);

        assert!(ledger.admit(1).unwrap().evicted.is_empty());
        assert!(ledger.admit(2).unwrap().evicted.is_empty());
        let admission = ledger.admit(3).unwrap();
        assert_eq!(admission.evicted.len(), 1);
        assert!(ledger.pending().is_empty());
    }
}
