//! Round diffing
//!
//! The encoder compares the world at the end of a round against the
//! snapshot taken when the round began. Robots that did nothing visible are
//! absent from every change array; only the team counters are written
//! unconditionally.
//!
//! # Critical Invariants
//!
//! 1. **Header once**: the round-0 header is produced exactly once, before
//!    any round
//! 2. **Contiguous rounds**: round ids run 1, 2, 3, ... with no gaps
//! 3. **Aligned arrays**: every delta passes [`RoundDelta::validate`]

use crate::delta::action::RoundLog;
use crate::delta::record::{MatchHeader, RoundDelta, SpawnedBodyTable, FORMAT_VERSION};
use crate::delta::snapshot::WorldSnapshot;
use crate::delta::DeltaError;
use crate::models::robot::Team;
use crate::models::state::WorldState;

#[derive(Debug, Clone, Default)]
pub struct DeltaEncoder {
    header_written: bool,
    last_round: u32,
}

fn team_rows(world: &WorldState) -> (Vec<u8>, Vec<u64>, Vec<u32>) {
    let mut ids = Vec::with_capacity(Team::COMPETING.len());
    let mut resources = Vec::with_capacity(Team::COMPETING.len());
    let mut scores = Vec::with_capacity(Team::COMPETING.len());
    for team in Team::COMPETING {
        let info = world.team_info(team);
        ids.push(team.id());
        resources.push(info.resources);
        scores.push(info.score);
    }
    (ids, resources, scores)
}

impl DeltaEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last round encoded (0 once only the header is out)
    pub fn last_round(&self) -> u32 {
        self.last_round
    }

    pub fn header_written(&self) -> bool {
        self.header_written
    }

    /// Describe the world as it stands before round 1
    pub fn encode_initial(
        &mut self,
        world: &WorldState,
        config_hash: &str,
        max_rounds: u32,
    ) -> Result<MatchHeader, DeltaError> {
        if self.header_written {
            return Err(DeltaError::InitialAlreadyEncoded);
        }

        let mut bodies = SpawnedBodyTable::default();
        for robot in world.robots() {
            bodies.robot_ids.push(robot.id().raw());
            bodies.team_ids.push(robot.team().id());
            bodies.kinds.push(robot.kind().id());
            bodies.locs.push(robot.location());
        }

        let map = world.map();
        let (team_ids, team_resources, team_scores) = team_rows(world);
        let header = MatchHeader {
            format_version: FORMAT_VERSION,
            config_hash: config_hash.to_string(),
            seed: map.seed,
            max_rounds,
            map_width: map.width,
            map_height: map.height,
            water_level: map.water_level,
            elevation: map.elevation.clone(),
            initial_bodies: bodies,
            team_ids,
            team_resources,
            team_scores,
        };
        header.validate()?;

        self.header_written = true;
        Ok(header)
    }

    /// Diff the world against the round's starting snapshot
    pub fn encode_round(
        &mut self,
        round: u32,
        before: &WorldSnapshot,
        world: &WorldState,
        log: &RoundLog,
    ) -> Result<RoundDelta, DeltaError> {
        if !self.header_written {
            return Err(DeltaError::InitialNotEncoded);
        }
        let expected = self.last_round + 1;
        if round != expected {
            return Err(DeltaError::NonMonotonicRound {
                expected,
                actual: round,
            });
        }

        let (team_ids, team_resources, team_scores) = team_rows(world);
        let mut delta = RoundDelta {
            team_ids,
            team_resources,
            team_scores,
            round_id: round,
            ..Default::default()
        };

        for robot in world.robots() {
            let id = robot.id();
            match before.robots.get(&id) {
                Some(&(location, health)) => {
                    if robot.location() != location {
                        delta.moved_ids.push(id.raw());
                        delta.moved_locs.push(robot.location());
                    }
                    if robot.health() != health {
                        delta.health_changed_ids.push(id.raw());
                        delta.health_levels.push(robot.health());
                    }
                }
                None => {
                    let spawned = &mut delta.spawned_bodies;
                    spawned.robot_ids.push(id.raw());
                    spawned.team_ids.push(robot.team().id());
                    spawned.kinds.push(robot.kind().id());
                    spawned.locs.push(robot.location());
                }
            }
        }

        delta.died_ids = before
            .robots
            .keys()
            .filter(|id| world.robot(**id).is_none())
            .map(|id| id.raw())
            .collect();

        for projectile in world.projectiles() {
            if before.projectiles.contains(&projectile.id()) {
                continue;
            }
            let spawned = &mut delta.spawned_projectiles;
            spawned.ids.push(projectile.id().raw());
            spawned.team_ids.push(projectile.team().id());
            spawned.locs.push(projectile.location());
            spawned.directions.push(projectile.direction() as u8);
            spawned.damages.push(projectile.damage());
        }

        delta.died_projectile_ids = before
            .projectiles
            .iter()
            .filter(|id| world.projectile(**id).is_none())
            .map(|id| id.raw())
            .collect();

        for action in &log.actions {
            delta.action_ids.push(action.robot.raw());
            delta.actions.push(action.kind.id());
            delta.action_targets.push(action.target_id());
        }

        for s in &log.indicator_strings {
            delta.indicator_string_ids.push(s.robot.raw());
            delta.indicator_string_indices.push(s.index);
            delta.indicator_string_values.push(s.value.clone());
        }

        for dot in &log.indicator_dots {
            delta.indicator_dot_ids.push(dot.robot.raw());
            delta.indicator_dot_locs.push(dot.location);
            delta.indicator_dot_rgbs.push(dot.color);
        }

        for line in &log.indicator_lines {
            delta.indicator_line_ids.push(line.robot.raw());
            delta.indicator_line_start_locs.push(line.start);
            delta.indicator_line_end_locs.push(line.end);
            delta.indicator_line_rgbs.push(line.color);
        }

        delta.validate()?;
        self.last_round = round;
        Ok(delta)
    }
}
