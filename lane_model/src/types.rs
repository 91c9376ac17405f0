use std::fmt;

use serde::{Deserialize, Serialize};

/// A direction of travel along a way, relative to the order of its points.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Fwd,
    Back,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Fwd => Direction::Back,
            Direction::Back => Direction::Fwd,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Direction::Fwd => write!(f, "forwards"),
            Direction::Back => write!(f, "backwards"),
        }
    }
}

/// Which lateral partition of a cross-section a piece belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PieceDirection {
    Fwd,
    Back,
    /// The shared center lane of a road tagged with both_ways lanes.
    Both,
}

impl PieceDirection {
    /// +1 forwards, -1 backwards, 0 for both ways.
    pub fn sign(self) -> i64 {
        match self {
            PieceDirection::Fwd => 1,
            PieceDirection::Back => -1,
            PieceDirection::Both => 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum DrivingSide {
    Right,
    Left,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapConfig {
    /// If true, driving happens on the right side of the road (USA). If false,
    /// on the left (Australia).
    pub driving_side: DrivingSide,
}

impl MapConfig {
    pub fn default_for_side(driving_side: DrivingSide) -> Self {
        Self { driving_side }
    }
}
