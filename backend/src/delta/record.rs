//! Replay record layouts
//!
//! Everything here is struct-of-arrays: each logical row is spread across
//! parallel vectors that must stay the same length. [`RoundDelta::validate`]
//! checks every group.

use crate::delta::DeltaError;
use crate::models::event::MatchEndReason;
use crate::models::indicator::Rgb;
use crate::models::location::MapLocation;
use crate::models::robot::Team;
use serde::{Deserialize, Serialize};

/// Replay format version written in every header
pub const FORMAT_VERSION: u32 = 1;

fn check_group(group: &'static str, lengths: &[usize]) -> Result<(), DeltaError> {
    let Some(&expected) = lengths.first() else {
        return Ok(());
    };
    match lengths.iter().find(|&&len| len != expected) {
        Some(&actual) => Err(DeltaError::MismatchedLengths {
            group,
            expected,
            actual,
        }),
        None => Ok(()),
    }
}

/// Parallel x/y coordinates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VecTable {
    pub xs: Vec<i32>,
    pub ys: Vec<i32>,
}

impl VecTable {
    pub fn push(&mut self, location: MapLocation) {
        self.xs.push(location.x);
        self.ys.push(location.y);
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<MapLocation> {
        Some(MapLocation::new(*self.xs.get(index)?, *self.ys.get(index)?))
    }

    fn lengths(&self) -> [usize; 2] {
        [self.xs.len(), self.ys.len()]
    }
}

/// Parallel red/green/blue channels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbTable {
    pub red: Vec<u8>,
    pub green: Vec<u8>,
    pub blue: Vec<u8>,
}

impl RgbTable {
    pub fn push(&mut self, color: Rgb) {
        self.red.push(color.r);
        self.green.push(color.g);
        self.blue.push(color.b);
    }

    pub fn len(&self) -> usize {
        self.red.len()
    }

    pub fn is_empty(&self) -> bool {
        self.red.is_empty()
    }

    fn lengths(&self) -> [usize; 3] {
        [self.red.len(), self.green.len(), self.blue.len()]
    }
}

/// Robots that appeared
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnedBodyTable {
    pub robot_ids: Vec<i32>,
    pub team_ids: Vec<u8>,
    pub kinds: Vec<u8>,
    pub locs: VecTable,
}

impl SpawnedBodyTable {
    pub fn len(&self) -> usize {
        self.robot_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.robot_ids.is_empty()
    }

    fn validate(&self, group: &'static str) -> Result<(), DeltaError> {
        let [xs, ys] = self.locs.lengths();
        check_group(
            group,
            &[self.robot_ids.len(), self.team_ids.len(), self.kinds.len(), xs, ys],
        )
    }
}

/// Projectiles that appeared
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnedProjectileTable {
    pub ids: Vec<i32>,
    pub team_ids: Vec<u8>,
    pub locs: VecTable,
    pub directions: Vec<u8>,
    pub damages: Vec<i32>,
}

impl SpawnedProjectileTable {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Everything a spectator needs to advance the replay by one round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundDelta {
    /// Team counters, one row per competing team, in every round
    pub team_ids: Vec<u8>,
    pub team_resources: Vec<u64>,
    pub team_scores: Vec<u32>,

    pub moved_ids: Vec<i32>,
    pub moved_locs: VecTable,

    pub spawned_bodies: SpawnedBodyTable,
    pub spawned_projectiles: SpawnedProjectileTable,

    pub health_changed_ids: Vec<i32>,
    pub health_levels: Vec<i32>,

    pub died_ids: Vec<i32>,
    pub died_projectile_ids: Vec<i32>,

    pub action_ids: Vec<i32>,
    pub actions: Vec<u8>,
    pub action_targets: Vec<i32>,

    pub indicator_string_ids: Vec<i32>,
    pub indicator_string_indices: Vec<i32>,
    pub indicator_string_values: Vec<String>,

    pub indicator_dot_ids: Vec<i32>,
    pub indicator_dot_locs: VecTable,
    pub indicator_dot_rgbs: RgbTable,

    pub indicator_line_ids: Vec<i32>,
    pub indicator_line_start_locs: VecTable,
    pub indicator_line_end_locs: VecTable,
    pub indicator_line_rgbs: RgbTable,

    pub round_id: u32,
}

impl RoundDelta {
    /// Check that every group of parallel arrays lines up
    pub fn validate(&self) -> Result<(), DeltaError> {
        check_group(
            "teams",
            &[
                self.team_ids.len(),
                self.team_resources.len(),
                self.team_scores.len(),
            ],
        )?;

        let [xs, ys] = self.moved_locs.lengths();
        check_group("moved", &[self.moved_ids.len(), xs, ys])?;

        self.spawned_bodies.validate("spawned_bodies")?;

        let p = &self.spawned_projectiles;
        let [xs, ys] = p.locs.lengths();
        check_group(
            "spawned_projectiles",
            &[p.ids.len(), p.team_ids.len(), xs, ys, p.directions.len(), p.damages.len()],
        )?;

        check_group(
            "health",
            &[self.health_changed_ids.len(), self.health_levels.len()],
        )?;

        check_group(
            "actions",
            &[
                self.action_ids.len(),
                self.actions.len(),
                self.action_targets.len(),
            ],
        )?;

        check_group(
            "indicator_strings",
            &[
                self.indicator_string_ids.len(),
                self.indicator_string_indices.len(),
                self.indicator_string_values.len(),
            ],
        )?;

        let [xs, ys] = self.indicator_dot_locs.lengths();
        let [r, g, b] = self.indicator_dot_rgbs.lengths();
        check_group("indicator_dots", &[self.indicator_dot_ids.len(), xs, ys, r, g, b])?;

        let [sx, sy] = self.indicator_line_start_locs.lengths();
        let [ex, ey] = self.indicator_line_end_locs.lengths();
        let [r, g, b] = self.indicator_line_rgbs.lengths();
        check_group(
            "indicator_lines",
            &[self.indicator_line_ids.len(), sx, sy, ex, ey, r, g, b],
        )
    }

    /// True if nothing but the team counters was recorded
    pub fn is_quiet(&self) -> bool {
        self.moved_ids.is_empty()
            && self.spawned_bodies.is_empty()
            && self.spawned_projectiles.is_empty()
            && self.health_changed_ids.is_empty()
            && self.died_ids.is_empty()
            && self.died_projectile_ids.is_empty()
            && self.action_ids.is_empty()
            && self.indicator_string_ids.is_empty()
            && self.indicator_dot_ids.is_empty()
            && self.indicator_line_ids.is_empty()
    }

    /// True if the robot appears anywhere in the round's changes
    pub fn mentions(&self, robot: i32) -> bool {
        self.moved_ids.contains(&robot)
            || self.spawned_bodies.robot_ids.contains(&robot)
            || self.health_changed_ids.contains(&robot)
            || self.died_ids.contains(&robot)
            || self.action_ids.contains(&robot)
            || self.action_targets.contains(&robot)
            || self.indicator_string_ids.contains(&robot)
            || self.indicator_dot_ids.contains(&robot)
            || self.indicator_line_ids.contains(&robot)
    }

    /// Counters for `team`, if the team is in the record
    pub fn team_counters(&self, team: Team) -> Option<(u64, u32)> {
        let row = self.team_ids.iter().position(|&id| id == team.id())?;
        Some((*self.team_resources.get(row)?, *self.team_scores.get(row)?))
    }
}

/// Round 0: the board and every body present before play starts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchHeader {
    pub format_version: u32,
    /// SHA-256 of the canonical match configuration
    pub config_hash: String,
    pub seed: u64,
    pub max_rounds: u32,
    pub map_width: i32,
    pub map_height: i32,
    pub water_level: i32,
    pub elevation: Vec<i32>,
    pub initial_bodies: SpawnedBodyTable,
    pub team_ids: Vec<u8>,
    pub team_resources: Vec<u64>,
    pub team_scores: Vec<u32>,
}

impl MatchHeader {
    pub fn validate(&self) -> Result<(), DeltaError> {
        check_group(
            "teams",
            &[
                self.team_ids.len(),
                self.team_resources.len(),
                self.team_scores.len(),
            ],
        )?;
        self.initial_bodies.validate("initial_bodies")
    }
}

/// How the match ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFooter {
    pub winner: Option<Team>,
    pub reason: MatchEndReason,
    /// Last round that produced a delta
    pub rounds_played: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_delta_is_valid_and_quiet() {
        let delta = RoundDelta::default();
        assert!(delta.validate().is_ok());
        assert!(delta.is_quiet());
    }

    #[test]
    fn test_detects_ragged_group() {
        let mut delta = RoundDelta::default();
        delta.moved_ids.push(3);
        delta.moved_locs.push(MapLocation::new(1, 1));
        delta.moved_locs.ys.push(2);

        assert_eq!(
            delta.validate(),
            Err(DeltaError::MismatchedLengths {
                group: "moved",
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn test_team_counters_lookup() {
        let delta = RoundDelta {
            team_ids: vec![1, 2],
            team_resources: vec![10, 20],
            team_scores: vec![0, 3],
            ..Default::default()
        };
        assert_eq!(delta.team_counters(Team::B), Some((20, 3)));
        assert_eq!(delta.team_counters(Team::Neutral), None);
    }
}
