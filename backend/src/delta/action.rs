//! Robot actions recorded for replay

use crate::models::indicator::{IndicatorDot, IndicatorLine, IndicatorString};
use crate::models::robot::RobotId;
use serde::{Deserialize, Serialize};

/// Target value written when an action has no target
pub const NO_TARGET: i32 = -1;

/// Visible action kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ActionKind {
    /// Target: the spawned robot
    SpawnUnit = 0,
    /// Target: the robot hit
    Attack = 1,
    /// Target: the new projectile
    FireProjectile = 2,
    /// No target
    Broadcast = 3,
    /// No target
    SelfDestruct = 4,
}

impl ActionKind {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<ActionKind> {
        match id {
            0 => Some(ActionKind::SpawnUnit),
            1 => Some(ActionKind::Attack),
            2 => Some(ActionKind::FireProjectile),
            3 => Some(ActionKind::Broadcast),
            4 => Some(ActionKind::SelfDestruct),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotAction {
    pub robot: RobotId,
    pub kind: ActionKind,
    pub target: Option<RobotId>,
}

impl RobotAction {
    pub fn new(robot: RobotId, kind: ActionKind, target: Option<RobotId>) -> Self {
        Self {
            robot,
            kind,
            target,
        }
    }

    /// Target as written to the wire
    pub fn target_id(&self) -> i32 {
        self.target.map(RobotId::raw).unwrap_or(NO_TARGET)
    }
}

/// What happened in a round beyond the world diff: actions and overlays
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundLog {
    pub actions: Vec<RobotAction>,
    pub indicator_strings: Vec<IndicatorString>,
    pub indicator_dots: Vec<IndicatorDot>,
    pub indicator_lines: Vec<IndicatorLine>,
}

impl RoundLog {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
            && self.indicator_strings.is_empty()
            && self.indicator_dots.is_empty()
            && self.indicator_lines.is_empty()
    }
}
