//! Event logging for auditing and diagnostics.
//!
//! The round records written for replay only carry what spectators see.
//! The event log captures what the engine did and why: turn faults,
//! robots going inert, ledger admission, provider failures. Events enable:
//! - Debugging (which robot faulted, in which round, with what message)
//! - Auditing (what each block admitted, what the ledger evicted)
//! - Testing (assert on engine decisions without decoding replays)
//!
//! Every logged event is mirrored to `tracing`. Turn faults and inert
//! robots go out at `warn`, provider failures at `error`, everything else
//! at `debug`.
//!
//! # Example
//!
//! ```rust
//! use arena_simulator_core_rs::models::event::{Event, EventLog};
//! use arena_simulator_core_rs::{RobotId, RobotKind};
//!
//! let mut log = EventLog::new();
//! log.log(Event::TurnFaulted {
//!     round: 3,
//!     robot: RobotId(12),
//!     kind: RobotKind::Miner,
//!     reason: "index out of bounds".to_string(),
//! });
//!
//! assert_eq!(log.events_at_round(3).len(), 1);
//! assert_eq!(log.events_for_robot(RobotId(12)).len(), 1);
//! ```

use crate::models::location::MapLocation;
use crate::models::robot::{InertReason, RobotId, RobotKind, Team};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// How a robot left the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    /// Health reached zero
    Destroyed,
    /// The robot removed itself
    SelfDestruct,
}

/// Why a match stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEndReason {
    /// Every playable round was run
    RoundLimit,
    /// At most one competing team still has robots
    Elimination,
    /// The operator requested an abort between rounds
    Aborted,
    /// A provider lifecycle hook failed
    ProviderFailure,
}

/// Engine event capturing a decision or state change.
///
/// Round 0 is the match setup (before the first playable round).
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    MatchStarted {
        seed: u64,
        num_robots: usize,
    },

    RobotSpawned {
        round: u32,
        robot: RobotId,
        kind: RobotKind,
        team: Team,
        location: MapLocation,
    },

    RobotDied {
        round: u32,
        robot: RobotId,
        kind: RobotKind,
        team: Team,
        cause: DeathCause,
    },

    /// The robot's own logic failed; the turn was discarded
    TurnFaulted {
        round: u32,
        robot: RobotId,
        kind: RobotKind,
        reason: String,
    },

    /// The robot will receive no further turns
    RobotInert {
        round: u32,
        robot: RobotId,
        reason: InertReason,
    },

    TransactionSubmitted {
        round: u32,
        robot: RobotId,
        team: Team,
        cost: u32,
    },

    BlockAdmitted {
        round: u32,
        admitted: usize,
        total_cost: u64,
        still_pending: usize,
    },

    TransactionsEvicted {
        round: u32,
        count: usize,
    },

    /// A lifecycle hook failed; the match cannot continue
    ProviderFailed {
        round: u32,
        kind: RobotKind,
        hook: &'static str,
        message: String,
    },

    MatchEnded {
        round: u32,
        winner: Option<Team>,
        reason: MatchEndReason,
    },
}

impl Event {
    /// Round the event belongs to (0 for match setup)
    pub fn round(&self) -> u32 {
        match self {
            Event::MatchStarted { .. } => 0,
            Event::RobotSpawned { round, .. }
            | Event::RobotDied { round, .. }
            | Event::TurnFaulted { round, .. }
            | Event::RobotInert { round, .. }
            | Event::TransactionSubmitted { round, .. }
            | Event::BlockAdmitted { round, .. }
            | Event::TransactionsEvicted { round, .. }
            | Event::ProviderFailed { round, .. }
            | Event::MatchEnded { round, .. } => *round,
        }
    }

    /// Short name of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::MatchStarted { .. } => "MatchStarted",
            Event::RobotSpawned { .. } => "RobotSpawned",
            Event::RobotDied { .. } => "RobotDied",
            Event::TurnFaulted { .. } => "TurnFaulted",
            Event::RobotInert { .. } => "RobotInert",
            Event::TransactionSubmitted { .. } => "TransactionSubmitted",
            Event::BlockAdmitted { .. } => "BlockAdmitted",
            Event::TransactionsEvicted { .. } => "TransactionsEvicted",
            Event::ProviderFailed { .. } => "ProviderFailed",
            Event::MatchEnded { .. } => "MatchEnded",
        }
    }

    /// Robot the event is about, if any
    pub fn robot(&self) -> Option<RobotId> {
        match self {
            Event::RobotSpawned { robot, .. }
            | Event::RobotDied { robot, .. }
            | Event::TurnFaulted { robot, .. }
            | Event::RobotInert { robot, .. }
            | Event::TransactionSubmitted { robot, .. } => Some(*robot),
            _ => None,
        }
    }

    fn emit(&self) {
        match self {
            Event::TurnFaulted {
                round,
                robot,
                kind,
                reason,
            } => warn!(round, robot = robot.raw(), %kind, %reason, "robot turn faulted"),
            Event::RobotInert {
                round,
                robot,
                reason,
            } => warn!(round, robot = robot.raw(), ?reason, "robot is now inert"),
            Event::ProviderFailed {
                round,
                kind,
                hook,
                message,
            } => error!(round, %kind, hook, %message, "control provider lifecycle hook failed"),
            other => debug!(round = other.round(), event = ?other, "{}", other.event_type()),
        }
    }
}

/// Ordered record of every event in a match
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Append an event and mirror it to `tracing`
    pub fn log(&mut self, event: Event) {
        event.emit();
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_at_round(&self, round: u32) -> Vec<&Event> {
        self.events.iter().filter(|e| e.round() == round).collect()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn events_for_robot(&self, robot: RobotId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.robot() == Some(robot))
            .collect()
    }
}
