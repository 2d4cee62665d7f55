//! Debug overlays emitted by robots during their turns
//!
//! Indicators are spectator-only annotations. They never affect the world
//! and only live for the round in which they were set.

use crate::models::location::MapLocation;
use crate::models::robot::RobotId;
use serde::{Deserialize, Serialize};

/// Number of indicator string slots per robot
pub const NUM_INDICATOR_STRINGS: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorString {
    pub robot: RobotId,
    pub index: i32,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorDot {
    pub robot: RobotId,
    pub location: MapLocation,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorLine {
    pub robot: RobotId,
    pub start: MapLocation,
    pub end: MapLocation,
    pub color: Rgb,
}
