use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// Travel direction of a vehicle. Every vehicle is bound to one for its whole life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    ToA,
    ToB,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::ToA, Direction::ToB];

    pub fn opposite(self) -> Self {
        match self {
            Direction::ToA => Direction::ToB,
            Direction::ToB => Direction::ToA,
        }
    }

    /// Token form used at the protocol boundary (`to_A`, `to_B`).
    pub fn token(self) -> &'static str {
        match self {
            Direction::ToA => "to_A",
            Direction::ToB => "to_B",
        }
    }

    /// The side of the bridge this direction is heading to.
    pub fn side(self) -> &'static str {
        match self {
            Direction::ToA => "A",
            Direction::ToB => "B",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Direction {
    type Err = BridgeError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "to_A" => Ok(Direction::ToA),
            "to_B" => Ok(Direction::ToB),
            other => Err(BridgeError::InvalidDirection(other.to_string())),
        }
    }
}

/// One value per direction, indexable by [`Direction`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerDirection<T> {
    pub to_a: T,
    pub to_b: T,
}

impl<T> PerDirection<T> {
    pub fn new(to_a: T, to_b: T) -> Self {
        Self { to_a, to_b }
    }
}

impl<T> Index<Direction> for PerDirection<T> {
    type Output = T;

    fn index(&self, direction: Direction) -> &T {
        match direction {
            Direction::ToA => &self.to_a,
            Direction::ToB => &self.to_b,
        }
    }
}

impl<T> IndexMut<Direction> for PerDirection<T> {
    fn index_mut(&mut self, direction: Direction) -> &mut T {
        match direction {
            Direction::ToA => &mut self.to_a,
            Direction::ToB => &mut self.to_b,
        }
    }
}
