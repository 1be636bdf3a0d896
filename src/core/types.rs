//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Unique identifier for packages, issued by the coordinator on arrival.
///
/// Ids are never reused; a delivered package keeps its id forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageId(pub u32);

/// Unique identifier for vehicles (index into the fixed fleet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub u32);

impl VehicleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Turn counter (simulation time unit, starts from 1)
pub type Turn = u32;

/// A grid cell. The y axis grows downward, matching the coordinator's
/// convention that `d` moves toward larger y.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another cell
    pub fn manhattan(self, other: Cell) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// One movement step on the grid, or standing still.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "char", try_from = "char")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Stay,
}

impl Direction {
    pub fn is_stay(self) -> bool {
        self == Direction::Stay
    }

    /// Apply this step to a cell
    pub fn step(self, from: Cell) -> Cell {
        match self {
            Direction::Up => Cell::new(from.x, from.y - 1),
            Direction::Down => Cell::new(from.x, from.y + 1),
            Direction::Left => Cell::new(from.x - 1, from.y),
            Direction::Right => Cell::new(from.x + 1, from.y),
            Direction::Stay => from,
        }
    }
}

impl From<Direction> for char {
    fn from(d: Direction) -> char {
        match d {
            Direction::Up => 'u',
            Direction::Down => 'd',
            Direction::Left => 'l',
            Direction::Right => 'r',
            Direction::Stay => 's',
        }
    }
}

impl TryFrom<char> for Direction {
    type Error = String;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'u' => Ok(Direction::Up),
            'd' => Ok(Direction::Down),
            'l' => Ok(Direction::Left),
            'r' => Ok(Direction::Right),
            's' => Ok(Direction::Stay),
            other => Err(format!("unknown direction char: {other:?}")),
        }
    }
}
