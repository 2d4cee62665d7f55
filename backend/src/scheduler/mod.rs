//! Round scheduler
//!
//! Owns the world, the provider registry, the ledger and the delta encoder
//! for one match, and advances them together one round at a time.

pub mod config;
pub mod engine;
pub mod mutation;

pub use config::{canonical_hash, ConfigError, MatchConfig};
pub use engine::{
    AbortHandle, Match, MatchError, MatchPhase, MatchReplay, RoundPhase, RoundResult,
};
pub use mutation::{AppliedRound, RoundQueue};
