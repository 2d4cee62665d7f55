//! Projectile model
//!
//! Projectiles share the robot id space. A projectile advances one cell per
//! round in a fixed direction and is destroyed when it leaves the map or
//! strikes a robot.

use crate::models::location::{Direction, MapLocation};
use crate::models::robot::{RobotId, Team};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    id: RobotId,
    team: Team,
    /// Robot that fired it
    shooter: RobotId,
    location: MapLocation,
    direction: Direction,
    damage: i32,
}

impl Projectile {
    pub fn new(
        id: RobotId,
        team: Team,
        shooter: RobotId,
        location: MapLocation,
        direction: Direction,
        damage: i32,
    ) -> Self {
        Self {
            id,
            team,
            shooter,
            location,
            direction,
            damage,
        }
    }

    pub fn id(&self) -> RobotId {
        self.id
    }

    pub fn team(&self) -> Team {
        self.team
    }

    pub fn shooter(&self) -> RobotId {
        self.shooter
    }

    pub fn location(&self) -> MapLocation {
        self.location
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn damage(&self) -> i32 {
        self.damage
    }

    /// Cell the projectile will occupy after its next step
    pub fn next_location(&self) -> MapLocation {
        self.location.add(self.direction)
    }

    pub(crate) fn set_location(&mut self, location: MapLocation) {
        self.location = location;
    }
}
