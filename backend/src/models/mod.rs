//! Domain models for the arena simulator

pub mod event;
pub mod indicator;
pub mod location;
pub mod map;
pub mod projectile;
pub mod robot;
pub mod state;
pub mod transaction;

// Re-exports
pub use event::{DeathCause, Event, EventLog, MatchEndReason};
pub use indicator::{IndicatorDot, IndicatorLine, IndicatorString, Rgb};
pub use location::{Direction, MapLocation};
pub use map::{BodySpec, GameMap, MapError};
pub use projectile::Projectile;
pub use robot::{InertReason, Robot, RobotId, RobotKind, Team};
pub use state::{TeamInfo, WorldError, WorldState};
pub use transaction::Transaction;
