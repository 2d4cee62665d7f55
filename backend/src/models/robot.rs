//! Robot model
//!
//! A robot is the unit of agency in a match. Each robot has:
//! - A unique id, stable for the whole match and never reused
//! - A kind, which selects its control provider and rule parameters
//! - An owning team, a location and a health level
//! - A cooldown (the robot is "ready" when it reaches zero)
//! - Compute counters (cumulative and current round)
//! - An inert flag, set once its turn logic faulted or overran its budget

use crate::models::location::MapLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of a robot or projectile within a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RobotId(pub i32);

impl RobotId {
    pub fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for RobotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owning side of a robot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Team {
    /// Wildlife and other unowned bodies
    Neutral = 0,
    A = 1,
    B = 2,
}

impl Team {
    /// Teams that compete for the win, in wire order
    pub const COMPETING: [Team; 2] = [Team::A, Team::B];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Team> {
        match id {
            0 => Some(Team::Neutral),
            1 => Some(Team::A),
            2 => Some(Team::B),
            _ => None,
        }
    }

    pub fn opponent(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
            Team::Neutral => Team::Neutral,
        }
    }

    pub fn is_competing(self) -> bool {
        self != Team::Neutral
    }
}

/// Robot kind
///
/// The discriminant is the kind identifier; it also fixes the order in which
/// control providers receive lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RobotKind {
    Hq = 0,
    Miner = 1,
    Landscaper = 2,
    Drone = 3,
    Cow = 4,
}

impl RobotKind {
    pub const ALL: [RobotKind; 5] = [
        RobotKind::Hq,
        RobotKind::Miner,
        RobotKind::Landscaper,
        RobotKind::Drone,
        RobotKind::Cow,
    ];

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<RobotKind> {
        RobotKind::ALL.get(id as usize).copied()
    }

    pub fn max_health(self) -> i32 {
        match self {
            RobotKind::Hq => 500,
            RobotKind::Miner => 100,
            RobotKind::Landscaper => 150,
            RobotKind::Drone => 80,
            RobotKind::Cow => 50,
        }
    }

    pub fn is_mobile(self) -> bool {
        !matches!(self, RobotKind::Hq)
    }

    /// Rounds a robot waits after moving
    pub fn move_cooldown(self) -> u32 {
        match self {
            RobotKind::Hq => 0,
            RobotKind::Cow => 2,
            _ => 1,
        }
    }

    /// Rounds a robot waits after attacking, firing or spawning
    pub fn action_cooldown(self) -> u32 {
        match self {
            RobotKind::Drone => 2,
            _ => 1,
        }
    }

    /// Resources a team pays to spawn a robot of this kind
    pub fn spawn_cost(self) -> u64 {
        match self {
            RobotKind::Hq | RobotKind::Cow => 0,
            RobotKind::Miner => 70,
            RobotKind::Landscaper | RobotKind::Drone => 150,
        }
    }

    /// Melee damage dealt to an adjacent robot, if the kind can attack
    pub fn attack_damage(self) -> Option<i32> {
        match self {
            RobotKind::Landscaper => Some(20),
            _ => None,
        }
    }

    /// Damage carried by projectiles fired by this kind, if it can fire
    pub fn projectile_damage(self) -> Option<i32> {
        match self {
            RobotKind::Hq => Some(15),
            RobotKind::Drone => Some(10),
            _ => None,
        }
    }

    pub fn can_spawn(self, kind: RobotKind) -> bool {
        matches!(
            (self, kind),
            (RobotKind::Hq, RobotKind::Miner)
                | (RobotKind::Miner, RobotKind::Landscaper)
                | (RobotKind::Miner, RobotKind::Drone)
        )
    }

    /// Per-round compute allowance when the match config does not override it
    pub fn default_compute_budget(self) -> u64 {
        match self {
            RobotKind::Hq => 20_000,
            _ => 10_000,
        }
    }
}

impl fmt::Display for RobotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RobotKind::Hq => "HQ",
            RobotKind::Miner => "MINER",
            RobotKind::Landscaper => "LANDSCAPER",
            RobotKind::Drone => "DRONE",
            RobotKind::Cow => "COW",
        };
        f.write_str(name)
    }
}

/// Why a robot stopped receiving turns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InertReason {
    /// Turn logic faulted and the provider terminated it
    Terminated,
    /// A turn consumed more compute than the kind's budget
    OverBudget { used: u64, budget: u64 },
    /// No control provider is registered for the robot's kind
    Unmanaged,
}

/// A robot in the world
///
/// # Example
/// ```
/// use arena_simulator_core_rs::{MapLocation, Robot, RobotId, RobotKind, Team};
///
/// let robot = Robot::new(RobotId(1), RobotKind::Miner, Team::A, MapLocation::new(0, 0));
/// assert_eq!(robot.health(), RobotKind::Miner.max_health());
/// assert!(robot.is_ready());
/// assert!(!robot.is_inert());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Robot {
    id: RobotId,
    kind: RobotKind,
    team: Team,
    location: MapLocation,
    health: i32,

    /// Rounds until the robot may act again (ready at zero)
    cooldown: u32,

    /// Compute consumed over the whole match
    compute_used_total: u64,

    /// Compute consumed in the current round
    compute_used_round: u64,

    /// Set once the robot must never run again
    inert: Option<InertReason>,
}

impl Robot {
    pub fn new(id: RobotId, kind: RobotKind, team: Team, location: MapLocation) -> Self {
        Self {
            id,
            kind,
            team,
            location,
            health: kind.max_health(),
            cooldown: 0,
            compute_used_total: 0,
            compute_used_round: 0,
            inert: None,
        }
    }

    pub fn id(&self) -> RobotId {
        self.id
    }

    pub fn kind(&self) -> RobotKind {
        self.kind
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn location(&self) -> MapLocation {
        self.location
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// The per-round "ready" flag
    pub fn is_ready(&self) -> bool {
        self.cooldown == 0
    }

    pub fn compute_used_total(&self) -> u64 {
        self.compute_used_total
    }

    pub fn compute_used_round(&self) -> u64 {
        self.compute_used_round
    }

    pub fn is_inert(&self) -> bool {
        self.inert.is_some()
    }

    pub fn inert_reason(&self) -> Option<&InertReason> {
        self.inert.as_ref()
    }

    pub(crate) fn set_location(&mut self, location: MapLocation) {
        self.location = location;
    }

    /// Apply a signed health change, clamped to `[0, max_health]`
    ///
    /// Returns the new health.
    pub(crate) fn change_health(&mut self, delta: i32) -> i32 {
        self.health = (self.health + delta).clamp(0, self.kind.max_health());
        self.health
    }

    pub(crate) fn add_cooldown(&mut self, rounds: u32) {
        self.cooldown += rounds;
    }

    /// Round-start bookkeeping: tick the cooldown down and reset the
    /// per-round compute counter
    pub(crate) fn begin_round(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
        self.compute_used_round = 0;
    }

    pub(crate) fn record_compute(&mut self, units: u64) {
        self.compute_used_round += units;
        self.compute_used_total += units;
    }

    /// Mark the robot inert; the first reason wins
    pub(crate) fn make_inert(&mut self, reason: InertReason) {
        if self.inert.is_none() {
            self.inert = Some(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn miner() -> Robot {
        Robot::new(RobotId(7), RobotKind::Miner, Team::B, MapLocation::new(1, 1))
    }

    #[test]
    fn test_kind_ids_are_stable() {
        for kind in RobotKind::ALL {
            assert_eq!(RobotKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(RobotKind::from_id(99), None);
    }

    #[test]
    fn test_health_is_clamped() {
        let mut robot = miner();
        assert_eq!(robot.change_health(50), RobotKind::Miner.max_health());
        assert_eq!(robot.change_health(-1_000), 0);
    }

    #[test]
    fn test_cooldown_ticks_down_to_ready() {
        let mut robot = miner();
        robot.add_cooldown(2);
        assert!(!robot.is_ready());
        robot.begin_round();
        assert!(!robot.is_ready());
        robot.begin_round();
        assert!(robot.is_ready());
        robot.begin_round();
        assert_eq!(robot.cooldown(), 0);
    }

    #[test]
    fn test_compute_counters() {
        let mut robot = miner();
        robot.record_compute(30);
        robot.begin_round();
        robot.record_compute(12);
        assert_eq!(robot.compute_used_round(), 12);
        assert_eq!(robot.compute_used_total(), 42);
    }

    #[test]
    fn test_first_inert_reason_wins() {
        let mut robot = miner();
        robot.make_inert(InertReason::Terminated);
        robot.make_inert(InertReason::OverBudget { used: 5, budget: 1 });
        assert_eq!(robot.inert_reason(), Some(&InertReason::Terminated));
    }

    #[test]
    fn test_team_opponents() {
        assert_eq!(Team::A.opponent(), Team::B);
        assert_eq!(Team::Neutral.opponent(), Team::Neutral);
        assert!(!Team::Neutral.is_competing());
    }
}
