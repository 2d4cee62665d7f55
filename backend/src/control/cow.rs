//! Neutral cow wandering

use crate::control::{ControlError, ControlProvider, MatchContext, TurnContext, TurnOutcome};
use crate::models::location::Direction;
use crate::models::robot::{Robot, RobotId, RobotKind};
use crate::rng::RngManager;
use tracing::{debug, warn};

/// Random directions a ready cow tries before giving up for the round
pub const COW_MOVE_ATTEMPTS: usize = 4;

/// Moves cows one cell in a random dry direction when they are ready
///
/// The random source is created from the map seed in `match_started` and
/// dropped in `match_ended`, so two matches on the same map see the same
/// cow behaviour. Cow logic is engine logic: it reports no compute use and
/// never terminates a cow.
///
/// # Example
/// ```
/// use arena_simulator_core_rs::control::{ControlProvider, CowProvider, MatchContext};
///
/// let mut cows = CowProvider::new();
/// let ctx = MatchContext { seed: 7, round: 0, max_rounds: 10 };
/// cows.match_started(&ctx).unwrap();
/// assert!(cows.is_running());
/// cows.match_ended(&ctx).unwrap();
/// assert!(!cows.is_running());
/// ```
#[derive(Debug, Default)]
pub struct CowProvider {
    rng: Option<RngManager>,
}

impl CowProvider {
    pub fn new() -> Self {
        Self { rng: None }
    }

    /// True between `match_started` and `match_ended`
    pub fn is_running(&self) -> bool {
        self.rng.is_some()
    }

    fn wander(rng: &mut RngManager, turn: &mut TurnContext<'_>) {
        if !turn.is_ready() {
            return;
        }
        for _ in 0..COW_MOVE_ATTEMPTS {
            let dir = Direction::ALL[rng.index(Direction::ALL.len())];
            let target = turn.adjacent_location(dir);
            if turn.can_move(dir) && !turn.is_flooded(target) {
                if let Err(err) = turn.move_to(dir) {
                    warn!(robot = turn.id().raw(), %err, "cow move rejected after check");
                }
                break;
            }
        }
    }
}

impl ControlProvider for CowProvider {
    fn match_started(&mut self, ctx: &MatchContext) -> Result<(), ControlError> {
        if self.rng.is_some() {
            return Err(ControlError::MatchAlreadyStarted);
        }
        self.rng = Some(RngManager::new(ctx.seed));
        Ok(())
    }

    fn match_ended(&mut self, _ctx: &MatchContext) -> Result<(), ControlError> {
        if self.rng.take().is_none() {
            return Err(ControlError::MatchNotStarted);
        }
        Ok(())
    }

    fn round_started(&mut self, _ctx: &MatchContext) -> Result<(), ControlError> {
        Ok(())
    }

    fn round_ended(&mut self, _ctx: &MatchContext) -> Result<(), ControlError> {
        Ok(())
    }

    fn robot_spawned(&mut self, _ctx: &MatchContext, _robot: &Robot) {}

    fn robot_killed(&mut self, _ctx: &MatchContext, _robot: &Robot) {}

    fn run_robot(&mut self, turn: &mut TurnContext<'_>) -> TurnOutcome {
        if turn.kind() != RobotKind::Cow {
            debug!(robot = turn.id().raw(), kind = %turn.kind(), "cow provider ignoring robot");
            return TurnOutcome::Completed;
        }
        let Some(rng) = self.rng.as_mut() else {
            return TurnOutcome::Faulted {
                reason: ControlError::MatchNotStarted.to_string(),
            };
        };
        Self::wander(rng, turn);
        TurnOutcome::Completed
    }

    fn compute_used(&self, _robot: RobotId) -> u64 {
        0
    }

    fn has_terminated(&self, _robot: RobotId) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::Intent;
    use crate::ledger::{LedgerConfig, PriorityLedger};
    use crate::models::location::MapLocation;
    use crate::models::map::GameMap;
    use crate::models::robot::Team;
    use crate::models::state::WorldState;
    use crate::scheduler::mutation::RoundQueue;

    fn ctx(seed: u64) -> MatchContext {
        MatchContext {
            seed,
            round: 1,
            max_rounds: 10,
        }
    }

    fn first_move(seed: u64, world: &WorldState, cow: RobotId) -> Vec<Intent> {
        let ledger = PriorityLedger::new(LedgerConfig::default());
        let queue = RoundQueue::default();
        let mut provider = CowProvider::new();
        provider.match_started(&ctx(seed)).unwrap();
        let mut turn = TurnContext::new(world, &ledger, &queue, cow, ctx(seed), 0).unwrap();
        assert_eq!(provider.run_robot(&mut turn), TurnOutcome::Completed);
        turn.into_intents().intents
    }

    #[test]
    fn test_same_seed_same_walk() {
        let mut world = WorldState::new(GameMap::flat(9, 9, 5), 0);
        let cow = world
            .spawn_robot(RobotKind::Cow, Team::Neutral, MapLocation::new(4, 4))
            .unwrap();

        let a = first_move(5, &world, cow);
        let b = first_move(5, &world, cow);
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_never_steps_into_water() {
        let centre = MapLocation::new(1, 1);
        let mut map = GameMap::flat(3, 3, 5).with_water_level(0);
        for dir in Direction::ALL {
            map = map.with_elevation(centre.add(dir), -1);
        }
        let mut world = WorldState::new(map, 0);
        let cow = world
            .spawn_robot(RobotKind::Cow, Team::Neutral, centre)
            .unwrap();

        for seed in 0..20 {
            assert!(first_move(seed, &world, cow).is_empty());
        }
    }

    #[test]
    fn test_lifecycle_guards() {
        let mut provider = CowProvider::new();
        assert_eq!(
            provider.match_ended(&ctx(1)),
            Err(ControlError::MatchNotStarted)
        );
        provider.match_started(&ctx(1)).unwrap();
        assert_eq!(
            provider.match_started(&ctx(1)),
            Err(ControlError::MatchAlreadyStarted)
        );
        provider.match_ended(&ctx(1)).unwrap();
        assert!(!provider.is_running());
        provider.match_started(&ctx(1)).unwrap();
    }
}
