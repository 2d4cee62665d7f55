//! Round mutation queue
//!
//! Turns commit their staged intents here in turn order. Nothing touches the
//! world until every robot has run; then [`RoundQueue::apply`] resolves the
//! whole round in a fixed order:
//!
//! ```text
//! 1. Projectiles already in flight advance one cell (hit or leave the map)
//! 2. Damage from hits and attacks, in commit order
//! 3. Deaths: destroyed robots, then self-destructs
//! 4. Spawns: robots, then projectiles (ids are allocated here)
//! 5. Moves
//! 6. Cooldowns
//! 7. Transaction costs
//! ```
//!
//! Robots that die in step 3 spawn nothing and do not move. Their
//! transactions still go out: a broadcast made during the turn stands.

use crate::control::{Intent, TurnIntents};
use crate::delta::{ActionKind, RobotAction, RoundLog};
use crate::models::event::DeathCause;
use crate::models::location::MapLocation;
use crate::models::robot::{Robot, RobotId, Team};
use crate::models::state::WorldState;
use crate::models::transaction::Transaction;
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// Intents committed so far this round
#[derive(Debug, Clone, Default)]
pub struct RoundQueue {
    committed: Vec<TurnIntents>,
    reserved: HashSet<MapLocation>,
    spent: BTreeMap<Team, u64>,
}

/// What applying a round changed, for hooks and logging
#[derive(Debug, Clone, Default)]
pub struct AppliedRound {
    /// Removed robots with their final state
    pub deaths: Vec<(Robot, DeathCause)>,
    /// New robot ids, in allocation order
    pub spawned: Vec<RobotId>,
    /// Submitted transactions, in submission order
    pub transactions: Vec<(RobotId, Team, Transaction)>,
    pub log: RoundLog,
}

fn debit(world: &mut WorldState, team: Team, amount: u64) {
    if let Some(info) = world.team_info_mut(team) {
        info.resources = info.resources.saturating_sub(amount);
    }
}

impl RoundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if a committed move or spawn already claims `location`
    pub fn is_reserved(&self, location: MapLocation) -> bool {
        self.reserved.contains(&location)
    }

    /// Resources committed by `team` this round
    pub fn spent(&self, team: Team) -> u64 {
        self.spent.get(&team).copied().unwrap_or(0)
    }

    /// Number of committed turns
    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    pub fn commit(&mut self, intents: TurnIntents) {
        for intent in &intents.intents {
            match intent {
                Intent::Move { to } => {
                    self.reserved.insert(*to);
                }
                Intent::Spawn { location, .. } => {
                    self.reserved.insert(*location);
                }
                _ => {}
            }
        }
        if intents.spent > 0 {
            *self.spent.entry(intents.team).or_insert(0) += intents.spent;
        }
        self.committed.push(intents);
    }

    /// Resolve the round against the world
    pub fn apply(self, world: &mut WorldState) -> AppliedRound {
        let mut applied = AppliedRound::default();
        let mut damage: Vec<(RobotId, i32, Team)> = Vec::new();

        // 1. projectiles in flight
        let in_flight: Vec<RobotId> = world.projectiles().map(|p| p.id()).collect();
        for id in in_flight {
            let Some(projectile) = world.projectile(id) else {
                continue;
            };
            let next = projectile.next_location();
            let (team, amount) = (projectile.team(), projectile.damage());
            if !world.on_map(next) {
                world.remove_projectile(id);
            } else if let Some(victim) = world.robot_at(next).map(|r| r.id()) {
                damage.push((victim, amount, team));
                world.remove_projectile(id);
            } else if let Some(projectile) = world.projectile_mut(id) {
                projectile.set_location(next);
            }
        }

        let mut self_destructs = Vec::new();
        for turn in &self.committed {
            for intent in &turn.intents {
                match intent {
                    Intent::Attack {
                        target,
                        damage: amount,
                    } => {
                        damage.push((*target, *amount, turn.team));
                        applied.log.actions.push(RobotAction::new(
                            turn.robot,
                            ActionKind::Attack,
                            Some(*target),
                        ));
                    }
                    Intent::Submit { .. } => {
                        applied
                            .log
                            .actions
                            .push(RobotAction::new(turn.robot, ActionKind::Broadcast, None));
                    }
                    Intent::SelfDestruct => self_destructs.push(turn.robot),
                    _ => {}
                }
            }
            applied
                .log
                .indicator_strings
                .extend(turn.indicator_strings.iter().cloned());
            applied
                .log
                .indicator_dots
                .extend(turn.indicator_dots.iter().cloned());
            applied
                .log
                .indicator_lines
                .extend(turn.indicator_lines.iter().cloned());
        }

        // 2. damage
        let mut dead: Vec<(RobotId, DeathCause)> = Vec::new();
        for (target, amount, source_team) in damage {
            let Some(robot) = world.robot_mut(target) else {
                continue;
            };
            if robot.health() == 0 {
                continue;
            }
            let victim_team = robot.team();
            if robot.change_health(-amount) == 0 {
                dead.push((target, DeathCause::Destroyed));
                if source_team.is_competing() && source_team != victim_team {
                    if let Some(info) = world.team_info_mut(source_team) {
                        info.score += 1;
                    }
                }
            }
        }

        // 3. deaths
        for robot in self_destructs {
            if !dead.iter().any(|(id, _)| *id == robot) {
                dead.push((robot, DeathCause::SelfDestruct));
                applied
                    .log
                    .actions
                    .push(RobotAction::new(robot, ActionKind::SelfDestruct, None));
            }
        }
        for (id, cause) in dead {
            if let Some(robot) = world.remove_robot(id) {
                applied.deaths.push((robot, cause));
            }
        }

        // 4. spawns
        for turn in &self.committed {
            if world.robot(turn.robot).is_none() {
                continue;
            }
            for intent in &turn.intents {
                if let Intent::Spawn { kind, location } = intent {
                    match world.spawn_robot(*kind, turn.team, *location) {
                        Ok(id) => {
                            debit(world, turn.team, kind.spawn_cost());
                            applied.spawned.push(id);
                            applied.log.actions.push(RobotAction::new(
                                turn.robot,
                                ActionKind::SpawnUnit,
                                Some(id),
                            ));
                        }
                        Err(err) => {
                            warn!(robot = turn.robot.raw(), %err, "staged spawn could not be placed")
                        }
                    }
                }
            }
        }
        for turn in &self.committed {
            if world.robot(turn.robot).is_none() {
                continue;
            }
            for intent in &turn.intents {
                if let Intent::Fire {
                    direction,
                    damage: amount,
                } = intent
                {
                    let id = world.spawn_projectile(
                        turn.team,
                        turn.robot,
                        turn.location,
                        *direction,
                        *amount,
                    );
                    applied.log.actions.push(RobotAction::new(
                        turn.robot,
                        ActionKind::FireProjectile,
                        Some(id),
                    ));
                }
            }
        }

        // 5. moves
        for turn in &self.committed {
            for intent in &turn.intents {
                if let Intent::Move { to } = intent {
                    if world.robot(turn.robot).is_none() {
                        continue;
                    }
                    if let Err(err) = world.move_robot(turn.robot, *to) {
                        warn!(robot = turn.robot.raw(), %err, "staged move could not be applied");
                    }
                }
            }
        }

        // 6. cooldowns
        for turn in &self.committed {
            if let Some(robot) = world.robot_mut(turn.robot) {
                robot.add_cooldown(turn.cooldown);
            }
        }

        // 7. transactions
        for turn in self.committed {
            for intent in turn.intents {
                if let Intent::Submit { transaction } = intent {
                    debit(world, turn.team, transaction.cost() as u64);
                    applied
                        .transactions
                        .push((turn.robot, turn.team, transaction));
                }
            }
        }

        applied
    }
}
