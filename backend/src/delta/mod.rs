//! Round delta encoding
//!
//! A match replay is a header (round 0), one [`RoundDelta`] per played
//! round, and a footer. Deltas carry only what changed during the round,
//! laid out as parallel arrays so a viewer can scan each change type
//! without decoding the others.

pub mod action;
pub mod encoder;
pub mod record;
pub mod snapshot;

pub use action::{ActionKind, RobotAction, RoundLog, NO_TARGET};
pub use encoder::DeltaEncoder;
pub use record::{
    MatchFooter, MatchHeader, RgbTable, RoundDelta, SpawnedBodyTable, SpawnedProjectileTable,
    VecTable, FORMAT_VERSION,
};
pub use snapshot::WorldSnapshot;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeltaError {
    #[error("Match header was already written")]
    InitialAlreadyEncoded,

    #[error("Round encoded before the match header")]
    InitialNotEncoded,

    #[error("Expected round {expected}, got {actual}")]
    NonMonotonicRound { expected: u32, actual: u32 },

    #[error("Parallel arrays in {group} disagree: {expected} vs {actual}")]
    MismatchedLengths {
        group: &'static str,
        expected: usize,
        actual: usize,
    },
}
