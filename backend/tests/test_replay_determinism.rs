//! Replay determinism
//!
//! Two runs of the same match must produce byte-identical replays, and a
//! binary replay must read back as exactly the records that were written.

use arena_simulator_core_rs::control::{PlayerError, PlayerProvider, RobotPlayer, TurnContext};
use arena_simulator_core_rs::models::indicator::Rgb;
use arena_simulator_core_rs::serializer::{
    BinarySerializerFactory, JsonSerializerFactory, ReplayRecord, SerializerFactory,
};
use arena_simulator_core_rs::{
    BodySpec, ControlProviderRegistry, CowProvider, Direction, GameMap, MapLocation, Match,
    MatchConfig, RobotKind, Team,
};
use std::io::Cursor;

/// Spawns miners while it can afford them and bids on the ledger every round
struct Builder;

impl RobotPlayer for Builder {
    fn run_turn(&mut self, rc: &mut TurnContext<'_>) -> Result<(), PlayerError> {
        for dir in Direction::ALL {
            if rc.can_spawn(RobotKind::Miner, dir) {
                rc.spawn(RobotKind::Miner, dir)?;
                break;
            }
        }
        if rc.team_resources() >= 3 {
            rc.submit_transaction(vec![rc.id().raw(), rc.round() as i32], 3)?;
        }
        rc.set_indicator_string(0, format!("round {}", rc.round()))?;
        Ok(())
    }
}

/// Walks in a direction derived from its id and the round
struct Wanderer;

impl RobotPlayer for Wanderer {
    fn run_turn(&mut self, rc: &mut TurnContext<'_>) -> Result<(), PlayerError> {
        let start = (rc.id().raw() as usize + rc.round() as usize) % Direction::ALL.len();
        for offset in 0..Direction::ALL.len() {
            let dir = Direction::ALL[(start + offset) % Direction::ALL.len()];
            if rc.can_move(dir) {
                rc.move_to(dir)?;
                let here = rc.location();
                rc.set_indicator_line(here, rc.adjacent_location(dir), Rgb::new(0, 255, 0));
                break;
            }
        }
        Ok(())
    }
}

fn arena() -> GameMap {
    let mut map = GameMap::flat(12, 12, 2024)
        .with_water_level(0)
        .with_elevation(MapLocation::new(6, 6), -3);
    for (kind, team, x, y) in [
        (RobotKind::Hq, Team::A, 1, 1),
        (RobotKind::Hq, Team::B, 10, 10),
        (RobotKind::Cow, Team::Neutral, 5, 5),
        (RobotKind::Cow, Team::Neutral, 7, 4),
    ] {
        map = map.with_body(BodySpec {
            kind,
            team,
            location: MapLocation::new(x, y),
        });
    }
    map
}

fn registry() -> ControlProviderRegistry {
    ControlProviderRegistry::new()
        .with_provider(
            RobotKind::Hq,
            PlayerProvider::new(RobotKind::Hq)
                .with_team(Team::A, |_| Box::new(Builder) as Box<dyn RobotPlayer>)
                .with_team(Team::B, |_| Box::new(Builder) as Box<dyn RobotPlayer>),
        )
        .unwrap()
        .with_provider(
            RobotKind::Miner,
            PlayerProvider::new(RobotKind::Miner)
                .with_team(Team::A, |_| Box::new(Wanderer) as Box<dyn RobotPlayer>)
                .with_team(Team::B, |_| Box::new(Wanderer) as Box<dyn RobotPlayer>),
        )
        .unwrap()
        .with_provider(RobotKind::Cow, CowProvider::new())
        .unwrap()
}

fn config() -> MatchConfig {
    MatchConfig {
        max_rounds: 25,
        ..Default::default()
    }
}

fn binary_replay() -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut out = BinarySerializerFactory
            .create_serializer(Some(Box::new(&mut buf)), None)
            .unwrap();
        let mut game = Match::new(config(), arena(), registry()).unwrap();
        game.run(out.as_mut()).unwrap();
    }
    buf
}

#[test]
fn test_binary_replays_are_byte_identical() {
    let first = binary_replay();
    let second = binary_replay();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_json_replays_are_byte_identical() {
    let run = || {
        let mut buf = Vec::new();
        {
            let mut out = JsonSerializerFactory
                .create_serializer(Some(Box::new(&mut buf)), None)
                .unwrap();
            let mut game = Match::new(config(), arena(), registry()).unwrap();
            game.run(out.as_mut()).unwrap();
        }
        buf
    };
    assert_eq!(run(), run());
}

#[test]
fn test_binary_read_back_matches_written_records() {
    let bytes = binary_replay();

    let mut game = Match::new(config(), arena(), registry()).unwrap();
    let replay = game.run_to_completion().unwrap();

    let mut input = BinarySerializerFactory
        .create_serializer(None, Some(Box::new(Cursor::new(bytes))))
        .unwrap();
    let mut records = Vec::new();
    while let Some(record) = input.read_record().unwrap() {
        records.push(record);
    }

    assert_eq!(records.len(), replay.rounds.len() + 2);
    assert_eq!(records[0], ReplayRecord::Header(replay.header.clone()));
    for (record, delta) in records[1..].iter().zip(&replay.rounds) {
        assert_eq!(record, &ReplayRecord::Round(delta.clone()));
    }
    assert_eq!(
        records.last(),
        Some(&ReplayRecord::Footer(replay.footer.clone()))
    );
}

#[test]
fn test_match_activity_shows_up_in_deltas() {
    let mut game = Match::new(config(), arena(), registry()).unwrap();
    let replay = game.run_to_completion().unwrap();

    let spawned: usize = replay
        .rounds
        .iter()
        .map(|d| d.spawned_bodies.len())
        .sum();
    let moved: usize = replay.rounds.iter().map(|d| d.moved_ids.len()).sum();
    let strings: usize = replay
        .rounds
        .iter()
        .map(|d| d.indicator_string_ids.len())
        .sum();

    assert!(spawned > 0, "HQs should have spawned miners");
    assert!(moved > 0, "miners and cows should have moved");
    assert!(strings > 0, "HQs set indicator strings every round");
    assert!(game.ledger().num_blocks() > 0);
}

#[test]
fn test_config_hash_depends_on_config() {
    let base = Match::new(config(), arena(), registry()).unwrap();
    let same = Match::new(config(), arena(), registry()).unwrap();
    let longer = Match::new(
        MatchConfig {
            max_rounds: 26,
            ..Default::default()
        },
        arena(),
        registry(),
    )
    .unwrap();

    assert_eq!(base.config_hash(), same.config_hash());
    assert_ne!(base.config_hash(), longer.config_hash());
}
