//! Tests for round delta encoding
//!
//! Encoder sequencing errors, what each kind of change looks like in a
//! delta, and array alignment across generated matches.

use arena_simulator_core_rs::control::{PlayerError, PlayerProvider, RobotPlayer, TurnContext};
use arena_simulator_core_rs::delta::{ActionKind, RoundLog, WorldSnapshot, NO_TARGET};
use arena_simulator_core_rs::scheduler::MatchReplay;
use arena_simulator_core_rs::{
    BodySpec, ControlProviderRegistry, CowProvider, DeltaEncoder, DeltaError, Direction, GameMap,
    MapLocation, Match, MatchConfig, MatchEndReason, RobotKind, Team, WorldState,
};
use proptest::prelude::*;

fn body(kind: RobotKind, team: Team, x: i32, y: i32) -> BodySpec {
    BodySpec {
        kind,
        team,
        location: MapLocation::new(x, y),
    }
}

// ============================================================================
// Encoder sequencing
// ============================================================================

fn small_world() -> WorldState {
    let mut world = WorldState::new(GameMap::flat(4, 4, 1), 50);
    world
        .spawn_robot(RobotKind::Hq, Team::A, MapLocation::new(0, 0))
        .unwrap();
    world
}

#[test]
fn test_round_before_header_is_rejected() {
    let world = small_world();
    let mut encoder = DeltaEncoder::new();
    let before = WorldSnapshot::capture(&world);

    assert_eq!(
        encoder.encode_round(1, &before, &world, &RoundLog::default()),
        Err(DeltaError::InitialNotEncoded)
    );
}

#[test]
fn test_header_cannot_be_encoded_twice() {
    let world = small_world();
    let mut encoder = DeltaEncoder::new();
    encoder.encode_initial(&world, "hash", 10).unwrap();

    assert_eq!(
        encoder.encode_initial(&world, "hash", 10),
        Err(DeltaError::InitialAlreadyEncoded)
    );
}

#[test]
fn test_rounds_must_be_consecutive() {
    let world = small_world();
    let mut encoder = DeltaEncoder::new();
    encoder.encode_initial(&world, "hash", 10).unwrap();
    let before = WorldSnapshot::capture(&world);
    let log = RoundLog::default();

    assert_eq!(
        encoder.encode_round(2, &before, &world, &log),
        Err(DeltaError::NonMonotonicRound {
            expected: 1,
            actual: 2
        })
    );
    let delta = encoder.encode_round(1, &before, &world, &log).unwrap();
    assert!(delta.is_quiet());
    assert_eq!(
        encoder.encode_round(1, &before, &world, &log),
        Err(DeltaError::NonMonotonicRound {
            expected: 2,
            actual: 1
        })
    );
}

#[test]
fn test_header_describes_round_zero() {
    let map = GameMap::flat(3, 2, 8)
        .with_water_level(1)
        .with_body(body(RobotKind::Hq, Team::B, 2, 1))
        .with_body(body(RobotKind::Cow, Team::Neutral, 0, 0));
    let registry = ControlProviderRegistry::new()
        .with_provider(RobotKind::Cow, CowProvider::new())
        .unwrap();
    let mut game = Match::new(MatchConfig::default(), map, registry).unwrap();
    let header = game.start().unwrap();

    assert_eq!((header.map_width, header.map_height), (3, 2));
    assert_eq!(header.elevation.len(), 6);
    assert_eq!(header.water_level, 1);
    assert_eq!(header.seed, 8);
    assert_eq!(header.initial_bodies.robot_ids, vec![1, 2]);
    assert_eq!(
        header.initial_bodies.kinds,
        vec![RobotKind::Hq.id(), RobotKind::Cow.id()]
    );
    assert_eq!(header.team_ids, vec![Team::A.id(), Team::B.id()]);
    assert_eq!(header.config_hash, game.config_hash());
    assert!(header.validate().is_ok());
}

// ============================================================================
// Changes as they appear in deltas
// ============================================================================

/// Fires once to the east on its first turn
struct OneShot {
    fired: bool,
}

impl RobotPlayer for OneShot {
    fn run_turn(&mut self, rc: &mut TurnContext<'_>) -> Result<(), PlayerError> {
        if !self.fired {
            rc.fire(Direction::East)?;
            self.fired = true;
        }
        Ok(())
    }
}

/// Broadcasts on round 1, marks the board on round 2, leaves on round 3
struct Herald;

impl RobotPlayer for Herald {
    fn run_turn(&mut self, rc: &mut TurnContext<'_>) -> Result<(), PlayerError> {
        use arena_simulator_core_rs::models::indicator::Rgb;
        match rc.round() {
            1 => rc.submit_transaction(vec![4, 2], 5)?,
            2 => {
                let here = rc.location();
                rc.set_indicator_dot(here, Rgb::new(255, 0, 0));
                rc.set_indicator_line(here, MapLocation::new(0, 0), Rgb::new(0, 0, 255));
            }
            3 => rc.self_destruct(),
            _ => {}
        }
        Ok(())
    }
}

fn shooting_range(with_target: bool) -> MatchReplay {
    let mut map = GameMap::flat(5, 1, 6).with_body(body(RobotKind::Hq, Team::A, 0, 0));
    if with_target {
        map = map.with_body(body(RobotKind::Miner, Team::B, 3, 0));
    }
    let registry = ControlProviderRegistry::new()
        .with_provider(
            RobotKind::Hq,
            PlayerProvider::new(RobotKind::Hq).with_team(Team::A, |_| {
                Box::new(OneShot { fired: false }) as Box<dyn RobotPlayer>
            }),
        )
        .unwrap()
        .with_provider(RobotKind::Miner, PlayerProvider::new(RobotKind::Miner))
        .unwrap();
    let config = MatchConfig {
        max_rounds: 8,
        ..Default::default()
    };
    Match::new(config, map, registry)
        .unwrap()
        .run_to_completion()
        .unwrap()
}

#[test]
fn test_projectile_flies_off_the_map() {
    let replay = shooting_range(false);

    let first = &replay.rounds[0];
    assert_eq!(first.spawned_projectiles.ids, vec![2]);
    assert_eq!(first.spawned_projectiles.directions, vec![Direction::East as u8]);
    assert_eq!(first.action_ids, vec![1]);
    assert_eq!(first.actions, vec![ActionKind::FireProjectile.id()]);
    assert_eq!(first.action_targets, vec![2]);

    // One cell per round from x = 0: leaves the five-wide map on round 6
    let died: Vec<u32> = replay
        .rounds
        .iter()
        .filter(|d| d.died_projectile_ids.contains(&2))
        .map(|d| d.round_id)
        .collect();
    assert_eq!(died, vec![6]);
}

#[test]
fn test_projectile_hit_changes_health() {
    let replay = shooting_range(true);

    // Launched round 1 at x = 0, reaches the miner at x = 3 on round 4
    assert_eq!(replay.rounds[0].spawned_projectiles.ids, vec![3]);
    let hit = &replay.rounds[3];
    assert_eq!(hit.died_projectile_ids, vec![3]);
    assert_eq!(hit.health_changed_ids, vec![2]);
    assert_eq!(
        hit.health_levels,
        vec![RobotKind::Miner.max_health() - RobotKind::Hq.projectile_damage().unwrap()]
    );
    assert!(replay.rounds[4..].iter().all(|d| d.health_changed_ids.is_empty()));
}

#[test]
fn test_broadcast_indicators_and_self_destruct() {
    let map = GameMap::flat(4, 4, 2).with_body(body(RobotKind::Miner, Team::A, 2, 2));
    let registry = ControlProviderRegistry::new()
        .with_provider(
            RobotKind::Miner,
            PlayerProvider::new(RobotKind::Miner)
                .with_team(Team::A, |_| Box::new(Herald) as Box<dyn RobotPlayer>),
        )
        .unwrap();
    let config = MatchConfig {
        max_rounds: 4,
        ..Default::default()
    };
    let mut game = Match::new(config, map, registry).unwrap();
    let replay = game.run_to_completion().unwrap();

    let broadcast = &replay.rounds[0];
    assert_eq!(broadcast.actions, vec![ActionKind::Broadcast.id()]);
    assert_eq!(broadcast.action_targets, vec![NO_TARGET]);
    assert_eq!(broadcast.team_counters(Team::A), Some((195, 0)));
    assert!(game.ledger().block(1).unwrap().contains_message("4_2"));

    let marked = &replay.rounds[1];
    assert_eq!(marked.indicator_dot_ids, vec![1]);
    assert_eq!(marked.indicator_dot_locs.get(0), Some(MapLocation::new(2, 2)));
    assert_eq!(marked.indicator_dot_rgbs.red, vec![255]);
    assert_eq!(marked.indicator_line_ids, vec![1]);
    assert_eq!(
        marked.indicator_line_end_locs.get(0),
        Some(MapLocation::new(0, 0))
    );
    assert!(marked.action_ids.is_empty());

    let gone = &replay.rounds[2];
    assert_eq!(gone.died_ids, vec![1]);
    assert_eq!(gone.actions, vec![ActionKind::SelfDestruct.id()]);
    assert_eq!(gone.action_targets, vec![NO_TARGET]);

    // Team A is wiped out by its own hand
    assert_eq!(replay.rounds.len(), 3);
    assert_eq!(replay.footer.reason, MatchEndReason::Elimination);
}

// ============================================================================
// Alignment over generated matches
// ============================================================================

/// Wanders and chats; attacks when it can
struct Busy;

impl RobotPlayer for Busy {
    fn run_turn(&mut self, rc: &mut TurnContext<'_>) -> Result<(), PlayerError> {
        let team = rc.team();
        let enemy = rc
            .nearby_robots(2)
            .into_iter()
            .find(|r| r.team() != team)
            .map(|r| r.id());
        if let Some(enemy) = enemy {
            if rc.can_attack(enemy) {
                rc.attack(enemy)?;
            }
        }
        let start = (rc.round() as usize + rc.id().raw() as usize) % 8;
        for step in 0..8 {
            let dir = Direction::ALL[(start + step) % 8];
            if rc.can_move(dir) {
                rc.move_to(dir)?;
                break;
            }
        }
        rc.set_indicator_string(rc.id().raw() % 3, "busy")?;
        Ok(())
    }
}

fn generated_match(seed: u64, width: i32, bodies: &[(u8, u8, i32)]) -> MatchReplay {
    let mut map = GameMap::flat(width, width, seed).with_water_level(0);
    let mut taken = Vec::new();
    for &(kind, team, cell) in bodies {
        let location = MapLocation::new(cell % width, cell / width);
        if taken.contains(&location) {
            continue;
        }
        taken.push(location);
        let (kind, team) = match (kind % 3, team % 2) {
            (0, _) => (RobotKind::Cow, Team::Neutral),
            (1, 0) => (RobotKind::Landscaper, Team::A),
            (1, _) => (RobotKind::Landscaper, Team::B),
            (_, 0) => (RobotKind::Drone, Team::A),
            (_, _) => (RobotKind::Drone, Team::B),
        };
        map = map.with_body(BodySpec {
            kind,
            team,
            location,
        });
    }
    let busy = |kind| {
        PlayerProvider::new(kind)
            .with_team(Team::A, |_| Box::new(Busy) as Box<dyn RobotPlayer>)
            .with_team(Team::B, |_| Box::new(Busy) as Box<dyn RobotPlayer>)
    };
    let registry = ControlProviderRegistry::new()
        .with_provider(RobotKind::Landscaper, busy(RobotKind::Landscaper))
        .unwrap()
        .with_provider(RobotKind::Drone, busy(RobotKind::Drone))
        .unwrap()
        .with_provider(RobotKind::Cow, CowProvider::new())
        .unwrap();
    let config = MatchConfig {
        max_rounds: 15,
        ..Default::default()
    };
    Match::new(config, map, registry)
        .unwrap()
        .run_to_completion()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn delta_arrays_stay_aligned(
        seed in any::<u64>(),
        width in 3i32..9,
        bodies in prop::collection::vec((any::<u8>(), any::<u8>(), 0i32..81), 0..12),
    ) {
        let bodies: Vec<_> = bodies
            .into_iter()
            .map(|(k, t, cell)| (k, t, cell % (width * width)))
            .collect();
        let replay = generated_match(seed, width, &bodies);

        prop_assert!(replay.header.validate().is_ok());
        for (index, delta) in replay.rounds.iter().enumerate() {
            prop_assert!(delta.validate().is_ok());
            prop_assert_eq!(delta.round_id as usize, index + 1);
            prop_assert_eq!(delta.moved_ids.len(), delta.moved_locs.len());
            prop_assert_eq!(delta.health_changed_ids.len(), delta.health_levels.len());
            prop_assert_eq!(delta.action_ids.len(), delta.action_targets.len());
            prop_assert_eq!(delta.team_ids.len(), 2);
            for id in &delta.died_ids {
                prop_assert!(!delta.moved_ids.contains(id));
            }
        }
    }
}
