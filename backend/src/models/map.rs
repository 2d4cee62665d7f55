//! Game map
//!
//! Maps are inputs to a match: their generation is not this crate's job.
//! A map fixes the board size, the seed every provider-side random source is
//! derived from, per-cell elevation, the water level, and the bodies that
//! exist at round 0.

use crate::models::location::MapLocation;
use crate::models::robot::{RobotKind, Team};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MapError {
    #[error("Map dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("Elevation grid has {actual} cells, expected {expected}")]
    ElevationSizeMismatch { expected: usize, actual: usize },

    #[error("Initial body {index} at {location} is off the map")]
    BodyOffMap { index: usize, location: MapLocation },

    #[error("Initial bodies {first} and {second} share location {location}")]
    BodiesOverlap {
        first: usize,
        second: usize,
        location: MapLocation,
    },
}

/// A body present at round 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySpec {
    pub kind: RobotKind,
    pub team: Team,
    pub location: MapLocation,
}

/// Board description
///
/// # Example
/// ```
/// use arena_simulator_core_rs::{BodySpec, GameMap, MapLocation, RobotKind, Team};
///
/// let map = GameMap::flat(8, 8, 42).with_body(BodySpec {
///     kind: RobotKind::Hq,
///     team: Team::A,
///     location: MapLocation::new(1, 1),
/// });
/// assert!(map.validate().is_ok());
/// assert!(map.on_map(MapLocation::new(7, 7)));
/// assert!(!map.on_map(MapLocation::new(8, 0)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMap {
    pub width: i32,
    pub height: i32,
    pub seed: u64,

    /// Row-major elevation, `width * height` cells
    pub elevation: Vec<i32>,

    /// Cells with elevation strictly below this level are flooded
    pub water_level: i32,

    pub bodies: Vec<BodySpec>,
}

impl GameMap {
    /// A map with every cell at elevation 0 and the water level below it
    pub fn flat(width: i32, height: i32, seed: u64) -> Self {
        let cells = (width.max(0) as usize) * (height.max(0) as usize);
        Self {
            width,
            height,
            seed,
            elevation: vec![0; cells],
            water_level: -1,
            bodies: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: BodySpec) -> Self {
        self.bodies.push(body);
        self
    }

    pub fn with_elevation(mut self, location: MapLocation, elevation: i32) -> Self {
        if let Some(cell) = self
            .index_of(location)
            .and_then(|index| self.elevation.get_mut(index))
        {
            *cell = elevation;
        }
        self
    }

    pub fn with_water_level(mut self, water_level: i32) -> Self {
        self.water_level = water_level;
        self
    }

    pub fn validate(&self) -> Result<(), MapError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(MapError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .filter(|cells| i32::try_from(*cells).is_ok())
            .ok_or(MapError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        if self.elevation.len() != expected {
            return Err(MapError::ElevationSizeMismatch {
                expected,
                actual: self.elevation.len(),
            });
        }

        let mut seen = HashSet::new();
        for (index, body) in self.bodies.iter().enumerate() {
            if !self.on_map(body.location) {
                return Err(MapError::BodyOffMap {
                    index,
                    location: body.location,
                });
            }
            if !seen.insert(body.location) {
                let first = self
                    .bodies
                    .iter()
                    .position(|b| b.location == body.location)
                    .unwrap_or(index);
                return Err(MapError::BodiesOverlap {
                    first,
                    second: index,
                    location: body.location,
                });
            }
        }

        Ok(())
    }

    pub fn on_map(&self, location: MapLocation) -> bool {
        location.x >= 0 && location.y >= 0 && location.x < self.width && location.y < self.height
    }

    pub fn elevation_at(&self, location: MapLocation) -> Option<i32> {
        self.index_of(location)
            .and_then(|i| self.elevation.get(i))
            .copied()
    }

    pub fn is_flooded(&self, location: MapLocation) -> bool {
        self.elevation_at(location)
            .map(|e| e < self.water_level)
            .unwrap_or(false)
    }

    fn index_of(&self, location: MapLocation) -> Option<usize> {
        if self.on_map(location) {
            Some(location.y as usize * self.width as usize + location.x as usize)
        } else {
            None
        }
    }
}
