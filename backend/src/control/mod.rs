//! Control Provider Module
//!
//! A control provider decides what the robots of one kind do. The scheduler
//! owns exactly one provider per kind, held in a
//! [`ControlProviderRegistry`], and drives it through a fixed lifecycle:
//!
//! ```text
//! match_started
//!   robot_spawned (round-0 bodies)
//!   round_started → run_robot × live robots → robot_killed / robot_spawned → round_ended
//!   ...
//! match_ended
//! ```
//!
//! Two providers ship with the crate:
//! 1. **CowProvider**: seeded random wandering for neutral cows
//! 2. **PlayerProvider**: hosts one [`RobotPlayer`] strategy per robot,
//!    built by a per-team [`PlayerFactory`]
//!
//! # Implementing a provider
//!
//! ```rust
//! use arena_simulator_core_rs::control::{
//!     ControlError, ControlProvider, MatchContext, TurnContext, TurnOutcome,
//! };
//! use arena_simulator_core_rs::{Robot, RobotId};
//!
//! struct Idle;
//!
//! impl ControlProvider for Idle {
//!     fn match_started(&mut self, _ctx: &MatchContext) -> Result<(), ControlError> { Ok(()) }
//!     fn match_ended(&mut self, _ctx: &MatchContext) -> Result<(), ControlError> { Ok(()) }
//!     fn round_started(&mut self, _ctx: &MatchContext) -> Result<(), ControlError> { Ok(()) }
//!     fn round_ended(&mut self, _ctx: &MatchContext) -> Result<(), ControlError> { Ok(()) }
//!     fn robot_spawned(&mut self, _ctx: &MatchContext, _robot: &Robot) {}
//!     fn robot_killed(&mut self, _ctx: &MatchContext, _robot: &Robot) {}
//!     fn run_robot(&mut self, _turn: &mut TurnContext<'_>) -> TurnOutcome {
//!         TurnOutcome::Completed
//!     }
//!     fn compute_used(&self, _robot: RobotId) -> u64 { 0 }
//!     fn has_terminated(&self, _robot: RobotId) -> bool { false }
//! }
//! ```

mod cow;
mod player;
mod registry;
mod turn;

pub use cow::CowProvider;
pub use player::{PlayerError, PlayerFactory, PlayerProvider, RobotPlayer};
pub use registry::{ControlProviderRegistry, ProviderFailure};
pub use turn::{
    GameActionError, Intent, TurnContext, TurnIntents, ACTION_COST, QUERY_COST,
};

use crate::models::robot::{Robot, RobotId};
use thiserror::Error;

/// Match-wide facts handed to every hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchContext {
    /// Map seed; provider-side randomness must derive from it
    pub seed: u64,
    /// Current round (0 before the first playable round)
    pub round: u32,
    pub max_rounds: u32,
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The turn ran to completion; its staged actions may be committed
    Completed,
    /// The turn's logic failed; staged actions are discarded
    Faulted { reason: String },
}

impl TurnOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TurnOutcome::Completed)
    }
}

/// Errors raised by provider lifecycle hooks
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ControlError {
    #[error("Provider is already running a match")]
    MatchAlreadyStarted,

    #[error("Provider has no match in progress")]
    MatchNotStarted,

    #[error("A provider is already registered for {0}")]
    DuplicateProvider(crate::models::robot::RobotKind),

    #[error("{0}")]
    Hook(String),
}

/// Pluggable controller for every robot of one kind
///
/// Lifecycle hooks that fail are fatal to the match. A failed turn is not:
/// [`run_robot`](ControlProvider::run_robot) reports it as
/// [`TurnOutcome::Faulted`] and the scheduler carries on with other robots.
pub trait ControlProvider {
    /// Called once before round 1
    ///
    /// Calling it again without an intervening `match_ended` must fail with
    /// [`ControlError::MatchAlreadyStarted`].
    fn match_started(&mut self, ctx: &MatchContext) -> Result<(), ControlError>;

    /// Called once when the match stops; must release all per-match state
    fn match_ended(&mut self, ctx: &MatchContext) -> Result<(), ControlError>;

    fn round_started(&mut self, ctx: &MatchContext) -> Result<(), ControlError>;

    fn round_ended(&mut self, ctx: &MatchContext) -> Result<(), ControlError>;

    fn robot_spawned(&mut self, ctx: &MatchContext, robot: &Robot);

    fn robot_killed(&mut self, ctx: &MatchContext, robot: &Robot);

    /// Take one turn for the robot behind `turn`
    ///
    /// Robots of another kind must be ignored and reported as completed.
    fn run_robot(&mut self, turn: &mut TurnContext<'_>) -> TurnOutcome;

    /// Compute the robot used in the current round
    fn compute_used(&self, robot: RobotId) -> u64;

    /// True once the provider has permanently stopped the robot
    fn has_terminated(&self, robot: RobotId) -> bool;
}
