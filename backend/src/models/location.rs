//! Map coordinates and compass directions

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell on the map
///
/// # Example
/// ```
/// use arena_simulator_core_rs::{Direction, MapLocation};
///
/// let loc = MapLocation::new(3, 4);
/// assert_eq!(loc.add(Direction::NorthEast), MapLocation::new(4, 5));
/// assert_eq!(loc.distance_squared(MapLocation::new(0, 0)), 25);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MapLocation {
    pub x: i32,
    pub y: i32,
}

impl MapLocation {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell in `dir`
    pub fn add(self, dir: Direction) -> Self {
        Self {
            x: self.x + dir.dx(),
            y: self.y + dir.dy(),
        }
    }

    pub fn distance_squared(self, other: MapLocation) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// True if `other` is one of the eight surrounding cells
    pub fn is_adjacent_to(self, other: MapLocation) -> bool {
        self != other && (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }

    /// Direction of the first step from `self` towards `other`
    pub fn direction_to(self, other: MapLocation) -> Option<Direction> {
        Direction::from_delta((other.x - self.x).signum(), (other.y - self.y).signum())
    }
}

impl fmt::Display for MapLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The eight compass directions, in clockwise order from north
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub fn dx(self) -> i32 {
        match self {
            Direction::NorthEast | Direction::East | Direction::SouthEast => 1,
            Direction::NorthWest | Direction::West | Direction::SouthWest => -1,
            Direction::North | Direction::South => 0,
        }
    }

    /// North is +y
    pub fn dy(self) -> i32 {
        match self {
            Direction::NorthWest | Direction::North | Direction::NorthEast => 1,
            Direction::SouthWest | Direction::South | Direction::SouthEast => -1,
            Direction::East | Direction::West => 0,
        }
    }

    pub fn from_delta(dx: i32, dy: i32) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .find(|d| d.dx() == dx && d.dy() == dy)
    }

    pub fn from_index(index: u8) -> Option<Direction> {
        Direction::ALL.get(index as usize).copied()
    }

    pub fn opposite(self) -> Direction {
        Direction::ALL[(self as usize + 4) % 8]
    }
}
