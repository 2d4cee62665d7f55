//! Hosted player strategies
//!
//! [`PlayerProvider`] runs competitor code. Each robot gets its own
//! [`RobotPlayer`] instance, created at spawn by the factory registered for
//! the robot's team. A strategy that returns an error or panics has its turn
//! discarded and is terminated: the robot stays in the world but never runs
//! again.

use crate::control::{
    ControlError, ControlProvider, GameActionError, MatchContext, TurnContext, TurnOutcome,
};
use crate::models::robot::{Robot, RobotId, RobotKind, Team};
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;
use tracing::debug;

/// Failure reported by strategy code
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlayerError {
    #[error("illegal action: {0}")]
    Action(#[from] GameActionError),

    #[error("{0}")]
    Logic(String),
}

/// Strategy for a single robot
pub trait RobotPlayer {
    fn run_turn(&mut self, rc: &mut TurnContext<'_>) -> Result<(), PlayerError>;
}

/// Builds the strategy for a newly spawned robot
pub type PlayerFactory = Box<dyn Fn(&Robot) -> Box<dyn RobotPlayer>>;

/// Provider hosting player strategies for one robot kind
///
/// # Example
/// ```
/// use arena_simulator_core_rs::control::{PlayerError, PlayerProvider, RobotPlayer, TurnContext};
/// use arena_simulator_core_rs::{RobotKind, Team};
///
/// struct Stay;
/// impl RobotPlayer for Stay {
///     fn run_turn(&mut self, _rc: &mut TurnContext<'_>) -> Result<(), PlayerError> {
///         Ok(())
///     }
/// }
///
/// let provider = PlayerProvider::new(RobotKind::Miner)
///     .with_team(Team::A, |_robot| Box::new(Stay) as Box<dyn RobotPlayer>);
/// assert!(provider.has_factory(Team::A));
/// assert!(!provider.has_factory(Team::B));
/// ```
pub struct PlayerProvider {
    kind: RobotKind,
    factories: BTreeMap<Team, PlayerFactory>,
    players: BTreeMap<RobotId, Box<dyn RobotPlayer>>,
    compute: BTreeMap<RobotId, u64>,
    terminated: BTreeSet<RobotId>,
    running: bool,
}

impl std::fmt::Debug for PlayerProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerProvider")
            .field("kind", &self.kind)
            .field("teams", &self.factories.keys().collect::<Vec<_>>())
            .field("players", &self.players.len())
            .field("terminated", &self.terminated)
            .field("running", &self.running)
            .finish()
    }
}

impl PlayerProvider {
    pub fn new(kind: RobotKind) -> Self {
        Self {
            kind,
            factories: BTreeMap::new(),
            players: BTreeMap::new(),
            compute: BTreeMap::new(),
            terminated: BTreeSet::new(),
            running: false,
        }
    }

    /// Register the strategy factory for `team`, replacing any earlier one
    pub fn with_team<F>(mut self, team: Team, factory: F) -> Self
    where
        F: Fn(&Robot) -> Box<dyn RobotPlayer> + 'static,
    {
        self.factories.insert(team, Box::new(factory));
        self
    }

    pub fn kind(&self) -> RobotKind {
        self.kind
    }

    pub fn has_factory(&self, team: Team) -> bool {
        self.factories.contains_key(&team)
    }

    /// Number of robots with a live strategy
    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    fn require_running(&self) -> Result<(), ControlError> {
        if self.running {
            Ok(())
        } else {
            Err(ControlError::MatchNotStarted)
        }
    }

    fn terminate(&mut self, robot: RobotId) {
        self.players.remove(&robot);
        self.terminated.insert(robot);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

impl ControlProvider for PlayerProvider {
    fn match_started(&mut self, _ctx: &MatchContext) -> Result<(), ControlError> {
        if self.running {
            return Err(ControlError::MatchAlreadyStarted);
        }
        self.running = true;
        Ok(())
    }

    fn match_ended(&mut self, _ctx: &MatchContext) -> Result<(), ControlError> {
        self.require_running()?;
        self.players.clear();
        self.compute.clear();
        self.terminated.clear();
        self.running = false;
        Ok(())
    }

    fn round_started(&mut self, _ctx: &MatchContext) -> Result<(), ControlError> {
        self.require_running()?;
        self.compute.clear();
        Ok(())
    }

    fn round_ended(&mut self, _ctx: &MatchContext) -> Result<(), ControlError> {
        self.require_running()
    }

    fn robot_spawned(&mut self, _ctx: &MatchContext, robot: &Robot) {
        if robot.kind() != self.kind {
            return;
        }
        match self.factories.get(&robot.team()) {
            Some(factory) => {
                self.players.insert(robot.id(), factory(robot));
            }
            None => debug!(robot = robot.id().raw(), team = ?robot.team(), "no strategy for team"),
        }
    }

    fn robot_killed(&mut self, _ctx: &MatchContext, robot: &Robot) {
        self.players.remove(&robot.id());
        self.compute.remove(&robot.id());
        self.terminated.remove(&robot.id());
    }

    fn run_robot(&mut self, turn: &mut TurnContext<'_>) -> TurnOutcome {
        let id = turn.id();
        if turn.kind() != self.kind || self.terminated.contains(&id) {
            return TurnOutcome::Completed;
        }
        let Some(player) = self.players.get_mut(&id) else {
            return TurnOutcome::Completed;
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| player.run_turn(turn)));
        self.compute.insert(id, turn.compute_used());

        let reason = match result {
            Ok(Ok(())) => return TurnOutcome::Completed,
            Ok(Err(err)) => err.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };
        self.terminate(id);
        TurnOutcome::Faulted { reason }
    }

    fn compute_used(&self, robot: RobotId) -> u64 {
        self.compute.get(&robot).copied().unwrap_or(0)
    }

    fn has_terminated(&self, robot: RobotId) -> bool {
        self.terminated.contains(&robot)
    }
}
