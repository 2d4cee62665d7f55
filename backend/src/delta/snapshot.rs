//! Start-of-round capture used to diff a round

use crate::models::location::MapLocation;
use crate::models::robot::{RobotId, Team};
use crate::models::state::{TeamInfo, WorldState};
use std::collections::{BTreeMap, BTreeSet};

/// The parts of the world a round delta reports changes to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldSnapshot {
    pub robots: BTreeMap<RobotId, (MapLocation, i32)>,
    pub projectiles: BTreeSet<RobotId>,
    pub teams: BTreeMap<Team, TeamInfo>,
}

impl WorldSnapshot {
    pub fn capture(world: &WorldState) -> Self {
        Self {
            robots: world
                .robots()
                .map(|r| (r.id(), (r.location(), r.health())))
                .collect(),
            projectiles: world.projectiles().map(|p| p.id()).collect(),
            teams: world.teams().clone(),
        }
    }
}
