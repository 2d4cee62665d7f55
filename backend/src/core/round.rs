//! Round bookkeeping for a match
//!
//! A match advances in discrete rounds. Round 0 is the initial state and is
//! never played; the first playable round is 1 and the last is `max_rounds`.

use serde::{Deserialize, Serialize};

/// Tracks which round a match is in
///
/// # Example
/// ```
/// use arena_simulator_core_rs::RoundClock;
///
/// let mut clock = RoundClock::new(3);
/// assert_eq!(clock.current_round(), 0);
///
/// assert_eq!(clock.advance_round(), 1);
/// assert!(!clock.is_final_round());
/// clock.advance_round();
/// clock.advance_round();
/// assert!(clock.is_final_round());
/// assert!(clock.is_exhausted());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundClock {
    /// Last round that was started (0 before the first round)
    current_round: u32,
    /// Total number of playable rounds
    max_rounds: u32,
}

impl RoundClock {
    /// Create a clock for a match of `max_rounds` rounds
    ///
    /// # Panics
    /// Panics if `max_rounds` is zero
    pub fn new(max_rounds: u32) -> Self {
        assert!(max_rounds > 0, "max_rounds must be positive");
        Self {
            current_round: 0,
            max_rounds,
        }
    }

    /// Move to the next round and return its identifier
    pub fn advance_round(&mut self) -> u32 {
        self.current_round += 1;
        self.current_round
    }

    /// Identifier of the round most recently started (0 = initial state)
    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    /// Identifier the next call to [`advance_round`](Self::advance_round) will return
    pub fn next_round(&self) -> u32 {
        self.current_round + 1
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// True while the current round is the last playable one
    pub fn is_final_round(&self) -> bool {
        self.current_round == self.max_rounds
    }

    /// True once no playable rounds remain
    pub fn is_exhausted(&self) -> bool {
        self.current_round >= self.max_rounds
    }
}
