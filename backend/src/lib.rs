//! Arena Simulator Core - Rust Engine
//!
//! Deterministic, round-based simulator for two-team robot matches with
//! pluggable per-kind control, a capacity-bounded transaction ledger and
//! compact per-round replay deltas.
//!
//! # Architecture
//!
//! - **core**: Round clock
//! - **models**: Domain types (Robot, Map, Transaction, World state, Events)
//! - **rng**: Deterministic random number generation
//! - **control**: Control providers, turn contexts and the provider registry
//! - **ledger**: Priority ledger that admits transactions into per-round blocks
//! - **delta**: Round delta encoding (header, rounds, footer)
//! - **serializer**: Replay stream formats (binary, JSON lines)
//! - **scheduler**: Match config, mutation queue and the round loop
//!
//! # Critical Invariants
//!
//! 1. Same config, map and providers produce byte-identical replays
//! 2. Robot turns run in ascending id order; effects apply after all turns
//! 3. Every round delta's parallel arrays have matching lengths
//! 4. A provider failure ends the match without emitting a partial delta

// Module declarations
pub mod control;
pub mod core;
pub mod delta;
pub mod ledger;
pub mod models;
pub mod rng;
pub mod scheduler;
pub mod serializer;

// Re-exports for convenience
pub use control::{
    ControlError, ControlProvider, ControlProviderRegistry, CowProvider, MatchContext,
    PlayerProvider, RobotPlayer, TurnContext, TurnOutcome,
};
pub use core::RoundClock;
pub use delta::{DeltaEncoder, DeltaError, MatchFooter, MatchHeader, RoundDelta};
pub use ledger::{LedgerConfig, PriorityLedger};
pub use models::{
    event::{DeathCause, Event, EventLog, MatchEndReason},
    location::{Direction, MapLocation},
    map::{BodySpec, GameMap, MapError},
    robot::{InertReason, Robot, RobotId, RobotKind, Team},
    state::{TeamInfo, WorldError, WorldState},
    transaction::Transaction,
};
pub use rng::RngManager;
pub use scheduler::{Match, MatchConfig, MatchError, MatchPhase, RoundResult};
pub use serializer::{ReplayRecord, Serializer, SerializerError, SerializerFactory};
