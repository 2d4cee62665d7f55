//! Per-robot turn handle
//!
//! A [`TurnContext`] is what a control provider sees of the world while one
//! robot takes its turn. Queries read the world as it stood at the start of
//! the round. Actions are validated immediately but only *staged*: the
//! scheduler commits the staged [`TurnIntents`] after the turn returns, and
//! only if the turn completed within its compute budget. A faulted turn
//! therefore changes nothing.
//!
//! # Compute metering
//!
//! Every world query and action charges compute units, and strategies can
//! charge their own work with [`TurnContext::charge`]. Metering is
//! cooperative: nothing interrupts a turn that overruns, the scheduler
//! notices afterwards.

use crate::control::MatchContext;
use crate::ledger::{Block, PriorityLedger};
use crate::models::indicator::{
    IndicatorDot, IndicatorLine, IndicatorString, Rgb, NUM_INDICATOR_STRINGS,
};
use crate::models::location::{Direction, MapLocation};
use crate::models::robot::{Robot, RobotId, RobotKind, Team};
use crate::models::state::{WorldError, WorldState};
use crate::models::transaction::Transaction;
use crate::scheduler::mutation::RoundQueue;
use std::collections::HashSet;
use thiserror::Error;

/// Compute charged for a world query
pub const QUERY_COST: u64 = 1;

/// Compute charged for an action attempt
pub const ACTION_COST: u64 = 10;

/// Errors returned by illegal robot actions
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GameActionError {
    #[error("Robot is not ready to act")]
    NotReady,

    #[error("{kind} cannot {ability}")]
    MissingAbility {
        kind: RobotKind,
        ability: &'static str,
    },

    #[error("Location {0} is off the map")]
    OffMap(MapLocation),

    #[error("Location {0} is occupied")]
    Occupied(MapLocation),

    #[error("Location {0} is flooded")]
    Flooded(MapLocation),

    #[error("Robot {0} is not an adjacent target")]
    InvalidTarget(RobotId),

    #[error("{spawner} cannot spawn {kind}")]
    CannotSpawn { spawner: RobotKind, kind: RobotKind },

    #[error("Not enough resources: need {required}, have {available}")]
    NotEnoughResources { required: u64, available: u64 },

    #[error("{0:?} robots cannot submit transactions")]
    NoTreasury(Team),

    #[error("Indicator string index {0} is out of range")]
    InvalidIndicatorIndex(i32),
}

/// A world mutation requested during a turn
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Move {
        to: MapLocation,
    },
    Attack {
        target: RobotId,
        damage: i32,
    },
    Spawn {
        kind: RobotKind,
        location: MapLocation,
    },
    Fire {
        direction: Direction,
        damage: i32,
    },
    Submit {
        transaction: Transaction,
    },
    SelfDestruct,
}

/// Everything one robot asked for during one turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnIntents {
    pub robot: RobotId,
    pub team: Team,
    pub location: MapLocation,
    pub intents: Vec<Intent>,
    /// Cooldown rounds earned by the staged actions
    pub cooldown: u32,
    /// Team resources committed by the staged actions
    pub spent: u64,
    pub indicator_strings: Vec<IndicatorString>,
    pub indicator_dots: Vec<IndicatorDot>,
    pub indicator_lines: Vec<IndicatorLine>,
}

impl TurnIntents {
    fn new(robot: &Robot) -> Self {
        Self {
            robot: robot.id(),
            team: robot.team(),
            location: robot.location(),
            intents: Vec::new(),
            cooldown: 0,
            spent: 0,
            indicator_strings: Vec::new(),
            indicator_dots: Vec::new(),
            indicator_lines: Vec::new(),
        }
    }

    /// True if the turn requested nothing at all
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
            && self.indicator_strings.is_empty()
            && self.indicator_dots.is_empty()
            && self.indicator_lines.is_empty()
    }
}

/// The world as one robot sees it during its turn
pub struct TurnContext<'a> {
    world: &'a WorldState,
    ledger: &'a PriorityLedger,
    queue: &'a RoundQueue,
    robot: &'a Robot,
    ctx: MatchContext,
    compute_budget: u64,
    compute_used: u64,
    /// Cells claimed by this turn's own staged moves and spawns
    claimed: HashSet<MapLocation>,
    staged: TurnIntents,
}

impl<'a> TurnContext<'a> {
    /// Open a turn for `robot`
    ///
    /// `queue` holds what earlier robots committed this round; it is used to
    /// keep two robots from claiming the same cell or spending the same
    /// resources.
    pub fn new(
        world: &'a WorldState,
        ledger: &'a PriorityLedger,
        queue: &'a RoundQueue,
        robot: RobotId,
        ctx: MatchContext,
        compute_budget: u64,
    ) -> Result<Self, WorldError> {
        let robot = world.robot(robot).ok_or(WorldError::UnknownRobot(robot))?;
        Ok(Self {
            world,
            ledger,
            queue,
            robot,
            ctx,
            compute_budget,
            compute_used: 0,
            claimed: HashSet::new(),
            staged: TurnIntents::new(robot),
        })
    }

    /// Close the turn and hand back what it staged
    pub fn into_intents(self) -> TurnIntents {
        self.staged
    }

    // ------------------------------------------------------------------
    // Self
    // ------------------------------------------------------------------

    pub fn id(&self) -> RobotId {
        self.robot.id()
    }

    pub fn kind(&self) -> RobotKind {
        self.robot.kind()
    }

    pub fn team(&self) -> Team {
        self.robot.team()
    }

    pub fn location(&self) -> MapLocation {
        self.robot.location()
    }

    pub fn health(&self) -> i32 {
        self.robot.health()
    }

    pub fn round(&self) -> u32 {
        self.ctx.round
    }

    pub fn match_context(&self) -> MatchContext {
        self.ctx
    }

    /// Ready at round start and no cooldown staged yet this turn
    pub fn is_ready(&self) -> bool {
        self.robot.is_ready() && self.staged.cooldown == 0
    }

    pub fn adjacent_location(&self, dir: Direction) -> MapLocation {
        self.robot.location().add(dir)
    }

    // ------------------------------------------------------------------
    // Compute
    // ------------------------------------------------------------------

    /// Charge `units` of compute to this turn
    pub fn charge(&mut self, units: u64) {
        self.compute_used = self.compute_used.saturating_add(units);
    }

    pub fn compute_used(&self) -> u64 {
        self.compute_used
    }

    pub fn compute_budget(&self) -> u64 {
        self.compute_budget
    }

    pub fn compute_remaining(&self) -> u64 {
        self.compute_budget.saturating_sub(self.compute_used)
    }

    // ------------------------------------------------------------------
    // Sensing
    // ------------------------------------------------------------------

    pub fn on_map(&mut self, location: MapLocation) -> bool {
        self.charge(QUERY_COST);
        self.world.on_map(location)
    }

    pub fn is_flooded(&mut self, location: MapLocation) -> bool {
        self.charge(QUERY_COST);
        self.world.is_flooded(location)
    }

    pub fn elevation(&mut self, location: MapLocation) -> Option<i32> {
        self.charge(QUERY_COST);
        self.world.elevation(location)
    }

    pub fn sense_robot_at(&mut self, location: MapLocation) -> Option<&'a Robot> {
        self.charge(QUERY_COST);
        self.world.robot_at(location)
    }

    /// Other robots within `radius_squared` of this robot, ascending by id
    pub fn nearby_robots(&mut self, radius_squared: i32) -> Vec<&'a Robot> {
        let origin = self.robot.location();
        let me = self.robot.id();
        let found: Vec<&'a Robot> = self
            .world
            .robots()
            .filter(|r| r.id() != me && r.location().distance_squared(origin) <= radius_squared)
            .collect();
        self.charge(QUERY_COST + found.len() as u64);
        found
    }

    /// Resources the team can still spend this round
    pub fn team_resources(&self) -> u64 {
        let team = self.robot.team();
        self.world
            .team_info(team)
            .resources
            .saturating_sub(self.queue.spent(team))
            .saturating_sub(self.staged.spent)
    }

    /// Block admitted at the end of an earlier round
    pub fn block(&mut self, round: u32) -> Option<&'a Block> {
        self.charge(QUERY_COST);
        self.ledger.block(round)
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    fn check_ready(&self) -> Result<(), GameActionError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(GameActionError::NotReady)
        }
    }

    fn check_free(&self, location: MapLocation) -> Result<(), GameActionError> {
        if !self.world.on_map(location) {
            return Err(GameActionError::OffMap(location));
        }
        if self.world.is_occupied(location)
            || self.queue.is_reserved(location)
            || self.claimed.contains(&location)
        {
            return Err(GameActionError::Occupied(location));
        }
        Ok(())
    }

    fn check_affordable(&self, cost: u64) -> Result<(), GameActionError> {
        let available = self.team_resources();
        if cost > available {
            return Err(GameActionError::NotEnoughResources {
                required: cost,
                available,
            });
        }
        Ok(())
    }

    fn check_move(&self, dir: Direction) -> Result<MapLocation, GameActionError> {
        let kind = self.robot.kind();
        if !kind.is_mobile() {
            return Err(GameActionError::MissingAbility {
                kind,
                ability: "move",
            });
        }
        self.check_ready()?;
        let target = self.adjacent_location(dir);
        self.check_free(target)?;
        Ok(target)
    }

    pub fn can_move(&mut self, dir: Direction) -> bool {
        self.charge(QUERY_COST);
        self.check_move(dir).is_ok()
    }

    /// Step one cell in `dir`
    pub fn move_to(&mut self, dir: Direction) -> Result<(), GameActionError> {
        self.charge(ACTION_COST);
        let target = self.check_move(dir)?;
        self.claimed.insert(target);
        self.staged.intents.push(Intent::Move { to: target });
        self.staged.cooldown += self.robot.kind().move_cooldown().max(1);
        Ok(())
    }

    fn check_attack(&self, target: RobotId) -> Result<i32, GameActionError> {
        let kind = self.robot.kind();
        let damage = kind.attack_damage().ok_or(GameActionError::MissingAbility {
            kind,
            ability: "attack",
        })?;
        self.check_ready()?;
        let victim = self
            .world
            .robot(target)
            .ok_or(GameActionError::InvalidTarget(target))?;
        if !victim.location().is_adjacent_to(self.robot.location()) {
            return Err(GameActionError::InvalidTarget(target));
        }
        Ok(damage)
    }

    pub fn can_attack(&mut self, target: RobotId) -> bool {
        self.charge(QUERY_COST);
        self.check_attack(target).is_ok()
    }

    /// Melee attack on an adjacent robot
    pub fn attack(&mut self, target: RobotId) -> Result<(), GameActionError> {
        self.charge(ACTION_COST);
        let damage = self.check_attack(target)?;
        self.staged.intents.push(Intent::Attack { target, damage });
        self.staged.cooldown += self.robot.kind().action_cooldown();
        Ok(())
    }

    fn check_spawn(&self, kind: RobotKind, dir: Direction) -> Result<MapLocation, GameActionError> {
        let spawner = self.robot.kind();
        if !spawner.can_spawn(kind) {
            return Err(GameActionError::CannotSpawn { spawner, kind });
        }
        self.check_ready()?;
        let location = self.adjacent_location(dir);
        self.check_free(location)?;
        if self.world.is_flooded(location) {
            return Err(GameActionError::Flooded(location));
        }
        self.check_affordable(kind.spawn_cost())?;
        Ok(location)
    }

    pub fn can_spawn(&mut self, kind: RobotKind, dir: Direction) -> bool {
        self.charge(QUERY_COST);
        self.check_spawn(kind, dir).is_ok()
    }

    /// Spawn a robot in the adjacent cell; its id is assigned when the
    /// round's mutations are applied
    pub fn spawn(&mut self, kind: RobotKind, dir: Direction) -> Result<(), GameActionError> {
        self.charge(ACTION_COST);
        let location = self.check_spawn(kind, dir)?;
        self.claimed.insert(location);
        self.staged.intents.push(Intent::Spawn { kind, location });
        self.staged.spent += kind.spawn_cost();
        self.staged.cooldown += self.robot.kind().action_cooldown();
        Ok(())
    }

    fn check_fire(&self, dir: Direction) -> Result<i32, GameActionError> {
        let kind = self.robot.kind();
        let damage = kind
            .projectile_damage()
            .ok_or(GameActionError::MissingAbility {
                kind,
                ability: "fire",
            })?;
        self.check_ready()?;
        let first_step = self.adjacent_location(dir);
        if !self.world.on_map(first_step) {
            return Err(GameActionError::OffMap(first_step));
        }
        Ok(damage)
    }

    pub fn can_fire(&mut self, dir: Direction) -> bool {
        self.charge(QUERY_COST);
        self.check_fire(dir).is_ok()
    }

    /// Fire a projectile that starts moving next round
    pub fn fire(&mut self, dir: Direction) -> Result<(), GameActionError> {
        self.charge(ACTION_COST);
        let damage = self.check_fire(dir)?;
        self.staged.intents.push(Intent::Fire {
            direction: dir,
            damage,
        });
        self.staged.cooldown += self.robot.kind().action_cooldown();
        Ok(())
    }

    /// Bid `cost` team resources to put `message` on the ledger
    pub fn submit_transaction(
        &mut self,
        message: Vec<i32>,
        cost: u32,
    ) -> Result<(), GameActionError> {
        self.charge(ACTION_COST);
        let team = self.robot.team();
        if !team.is_competing() {
            return Err(GameActionError::NoTreasury(team));
        }
        self.check_affordable(cost as u64)?;
        self.staged.spent += cost as u64;
        self.staged.intents.push(Intent::Submit {
            transaction: Transaction::new(cost, message),
        });
        Ok(())
    }

    /// Remove this robot from the world at the end of the round
    pub fn self_destruct(&mut self) {
        self.charge(ACTION_COST);
        if !self.staged.intents.contains(&Intent::SelfDestruct) {
            self.staged.intents.push(Intent::SelfDestruct);
        }
    }

    // ------------------------------------------------------------------
    // Debug overlays
    // ------------------------------------------------------------------

    pub fn set_indicator_string(
        &mut self,
        index: i32,
        value: impl Into<String>,
    ) -> Result<(), GameActionError> {
        if !(0..NUM_INDICATOR_STRINGS).contains(&index) {
            return Err(GameActionError::InvalidIndicatorIndex(index));
        }
        let robot = self.robot.id();
        self.staged.indicator_strings.retain(|s| s.index != index);
        self.staged.indicator_strings.push(IndicatorString {
            robot,
            index,
            value: value.into(),
        });
        Ok(())
    }

    pub fn set_indicator_dot(&mut self, location: MapLocation, color: Rgb) {
        self.staged.indicator_dots.push(IndicatorDot {
            robot: self.robot.id(),
            location,
            color,
        });
    }

    pub fn set_indicator_line(&mut self, start: MapLocation, end: MapLocation, color: Rgb) {
        self.staged.indicator_lines.push(IndicatorLine {
            robot: self.robot.id(),
            start,
            end,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerConfig;
    use crate::models::map::GameMap;

    fn ctx() -> MatchContext {
        MatchContext {
            seed: 1,
            round: 1,
            max_rounds: 10,
        }
    }

    fn setup() -> (WorldState, PriorityLedger, RoundQueue, RobotId) {
        let mut world = WorldState::new(GameMap::flat(5, 5, 1), 100);
        let miner = world
            .spawn_robot(RobotKind::Miner, Team::A, MapLocation::new(2, 2))
            .unwrap();
        (
            world,
            PriorityLedger::new(LedgerConfig::default()),
            RoundQueue::default(),
            miner,
        )
    }

    #[test]
    fn test_move_is_staged_not_applied() {
        let (world, ledger, queue, miner) = setup();
        let mut turn = TurnContext::new(&world, &ledger, &queue, miner, ctx(), 1_000).unwrap();

        turn.move_to(Direction::North).unwrap();
        assert_eq!(turn.location(), MapLocation::new(2, 2));
        assert!(!turn.is_ready());
        assert_eq!(turn.move_to(Direction::South), Err(GameActionError::NotReady));

        let intents = turn.into_intents();
        assert_eq!(
            intents.intents,
            vec![Intent::Move {
                to: MapLocation::new(2, 3)
            }]
        );
    }

    #[test]
    fn test_spawn_spends_team_resources() {
        let (world, ledger, queue, miner) = setup();
        let mut turn = TurnContext::new(&world, &ledger, &queue, miner, ctx(), 1_000).unwrap();

        assert_eq!(
            turn.spawn(RobotKind::Landscaper, Direction::East),
            Err(GameActionError::NotEnoughResources {
                required: 150,
                available: 100
            })
        );
        turn.submit_transaction(vec![1, 2], 40).unwrap();
        assert_eq!(turn.team_resources(), 60);
    }

    #[test]
    fn test_compute_is_metered() {
        let (world, ledger, queue, miner) = setup();
        let mut turn = TurnContext::new(&world, &ledger, &queue, miner, ctx(), 15).unwrap();

        turn.can_move(Direction::West);
        turn.charge(20);
        assert_eq!(turn.compute_used(), 21);
        assert_eq!(turn.compute_remaining(), 0);
    }

    #[test]
    fn test_indicator_index_bounds() {
        let (world, ledger, queue, miner) = setup();
        let mut turn = TurnContext::new(&world, &ledger, &queue, miner, ctx(), 1_000).unwrap();

        assert!(turn.set_indicator_string(0, "a").is_ok());
        assert!(turn.set_indicator_string(0, "b").is_ok());
        assert_eq!(
            turn.set_indicator_string(NUM_INDICATOR_STRINGS, "c"),
            Err(GameActionError::InvalidIndicatorIndex(NUM_INDICATOR_STRINGS))
        );
        let intents = turn.into_intents();
        assert_eq!(intents.indicator_strings.len(), 1);
        assert_eq!(intents.indicator_strings[0].value, "b");
    }

    #[test]
    fn test_unknown_robot_is_rejected() {
        let (world, ledger, queue, _) = setup();
        assert!(matches!(
            TurnContext::new(&world, &ledger, &queue, RobotId(99), ctx(), 1),
            Err(WorldError::UnknownRobot(RobotId(99)))
        ));
    }
}
