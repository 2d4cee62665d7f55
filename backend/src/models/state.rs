//! World State
//!
//! The authoritative state of a match: the map, every live robot and
//! projectile, team resources and scores, and the id counter.
//!
//! # Critical Invariants
//!
//! 1. **Unique ids**: robot and projectile ids come from one counter and are
//!    never reused within a match
//! 2. **Occupancy**: at most one robot per cell; the occupancy index always
//!    mirrors robot locations
//! 3. **Deterministic iteration**: robots and projectiles are kept in
//!    id-ordered maps so every scan is reproducible

use crate::models::location::{Direction, MapLocation};
use crate::models::map::GameMap;
use crate::models::projectile::Projectile;
use crate::models::robot::{Robot, RobotId, RobotKind, Team};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// First id handed out in a match
pub const FIRST_ROBOT_ID: i32 = 1;

#[derive(Debug, Error, PartialEq)]
pub enum WorldError {
    #[error("Location {0} is off the map")]
    OffMap(MapLocation),

    #[error("Location {location} is occupied by robot {occupant}")]
    Occupied {
        location: MapLocation,
        occupant: RobotId,
    },

    #[error("Robot {0} does not exist")]
    UnknownRobot(RobotId),
}

/// Per-team counters carried in every round record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub resources: u64,
    pub score: u32,
}

/// Complete world state
///
/// # Example
///
/// ```rust
/// use arena_simulator_core_rs::{GameMap, MapLocation, RobotKind, Team, WorldState};
///
/// let mut world = WorldState::new(GameMap::flat(5, 5, 1), 200);
/// let id = world
///     .spawn_robot(RobotKind::Miner, Team::A, MapLocation::new(2, 2))
///     .unwrap();
///
/// assert_eq!(world.robot_at(MapLocation::new(2, 2)).map(|r| r.id()), Some(id));
/// assert_eq!(world.team_info(Team::A).resources, 200);
/// ```
#[derive(Debug, Clone)]
pub struct WorldState {
    map: GameMap,
    robots: BTreeMap<RobotId, Robot>,
    projectiles: BTreeMap<RobotId, Projectile>,
    occupancy: HashMap<MapLocation, RobotId>,
    teams: BTreeMap<Team, TeamInfo>,
    next_id: i32,
}

impl WorldState {
    /// Create an empty world; competing teams start with `starting_resources`
    ///
    /// Initial bodies listed in the map are not spawned here. The scheduler
    /// spawns them so control providers see every spawn.
    pub fn new(map: GameMap, starting_resources: u64) -> Self {
        let teams = Team::COMPETING
            .into_iter()
            .map(|team| {
                (
                    team,
                    TeamInfo {
                        resources: starting_resources,
                        score: 0,
                    },
                )
            })
            .collect();

        Self {
            map,
            robots: BTreeMap::new(),
            projectiles: BTreeMap::new(),
            occupancy: HashMap::new(),
            teams,
            next_id: FIRST_ROBOT_ID,
        }
    }

    pub fn map(&self) -> &GameMap {
        &self.map
    }

    pub fn on_map(&self, location: MapLocation) -> bool {
        self.map.on_map(location)
    }

    pub fn is_flooded(&self, location: MapLocation) -> bool {
        self.map.is_flooded(location)
    }

    pub fn elevation(&self, location: MapLocation) -> Option<i32> {
        self.map.elevation_at(location)
    }

    pub fn robot(&self, id: RobotId) -> Option<&Robot> {
        self.robots.get(&id)
    }

    pub(crate) fn robot_mut(&mut self, id: RobotId) -> Option<&mut Robot> {
        self.robots.get_mut(&id)
    }

    pub fn robot_at(&self, location: MapLocation) -> Option<&Robot> {
        self.occupancy
            .get(&location)
            .and_then(|id| self.robots.get(id))
    }

    pub fn is_occupied(&self, location: MapLocation) -> bool {
        self.occupancy.contains_key(&location)
    }

    /// All robots, ascending by id
    pub fn robots(&self) -> impl Iterator<Item = &Robot> {
        self.robots.values()
    }

    /// Ids of every robot in the world, ascending
    pub fn live_robot_ids(&self) -> Vec<RobotId> {
        self.robots.keys().copied().collect()
    }

    pub fn num_robots(&self) -> usize {
        self.robots.len()
    }

    pub fn projectile(&self, id: RobotId) -> Option<&Projectile> {
        self.projectiles.get(&id)
    }

    /// All projectiles, ascending by id
    pub fn projectiles(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.values()
    }

    pub fn num_projectiles(&self) -> usize {
        self.projectiles.len()
    }

    /// Counters for a team; neutral and unknown teams read as zero
    pub fn team_info(&self, team: Team) -> TeamInfo {
        self.teams.get(&team).copied().unwrap_or_default()
    }

    pub fn teams(&self) -> &BTreeMap<Team, TeamInfo> {
        &self.teams
    }

    pub(crate) fn team_info_mut(&mut self, team: Team) -> Option<&mut TeamInfo> {
        self.teams.get_mut(&team)
    }

    pub fn team_has_robots(&self, team: Team) -> bool {
        self.robots.values().any(|r| r.team() == team)
    }

    /// Id the next spawn will receive
    pub fn peek_next_id(&self) -> RobotId {
        RobotId(self.next_id)
    }

    fn allocate_id(&mut self) -> RobotId {
        let id = RobotId(self.next_id);
        self.next_id += 1;
        id
    }

    fn check_free(&self, location: MapLocation) -> Result<(), WorldError> {
        if !self.map.on_map(location) {
            return Err(WorldError::OffMap(location));
        }
        if let Some(occupant) = self.occupancy.get(&location) {
            return Err(WorldError::Occupied {
                location,
                occupant: *occupant,
            });
        }
        Ok(())
    }

    /// Place a new robot and return its freshly allocated id
    pub fn spawn_robot(
        &mut self,
        kind: RobotKind,
        team: Team,
        location: MapLocation,
    ) -> Result<RobotId, WorldError> {
        self.check_free(location)?;
        let id = self.allocate_id();
        self.robots
            .insert(id, Robot::new(id, kind, team, location));
        self.occupancy.insert(location, id);
        Ok(id)
    }

    /// Remove a robot from the world, returning it
    pub fn remove_robot(&mut self, id: RobotId) -> Option<Robot> {
        let robot = self.robots.remove(&id)?;
        self.occupancy.remove(&robot.location());
        Some(robot)
    }

    pub fn move_robot(&mut self, id: RobotId, to: MapLocation) -> Result<(), WorldError> {
        let from = self
            .robots
            .get(&id)
            .map(|r| r.location())
            .ok_or(WorldError::UnknownRobot(id))?;
        if from == to {
            return Ok(());
        }
        self.check_free(to)?;

        self.occupancy.remove(&from);
        self.occupancy.insert(to, id);
        if let Some(robot) = self.robots.get_mut(&id) {
            robot.set_location(to);
        }
        Ok(())
    }

    pub fn spawn_projectile(
        &mut self,
        team: Team,
        shooter: RobotId,
        location: MapLocation,
        direction: Direction,
        damage: i32,
    ) -> RobotId {
        let id = self.allocate_id();
        self.projectiles.insert(
            id,
            Projectile::new(id, team, shooter, location, direction, damage),
        );
        id
    }

    pub fn remove_projectile(&mut self, id: RobotId) -> Option<Projectile> {
        self.projectiles.remove(&id)
    }

    pub(crate) fn projectile_mut(&mut self, id: RobotId) -> Option<&mut Projectile> {
        self.projectiles.get_mut(&id)
    }

    /// Round-start bookkeeping for every robot
    pub(crate) fn begin_round(&mut self) {
        for robot in self.robots.values_mut() {
            robot.begin_round();
        }
    }
}
