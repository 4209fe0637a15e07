use crate::error::Result;
use crate::models::direction::Direction;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u64,
    pub direction: Direction,
    /// Time spent on the bridge, outside the monitor lock.
    pub crossing_time: Duration,
}

impl Vehicle {
    pub fn new(id: u64, direction: Direction, crossing_time: Duration) -> Self {
        Self {
            id,
            direction,
            crossing_time,
        }
    }

    /// Builds a vehicle from a direction token such as `to_A`.
    pub fn from_token(id: u64, token: &str, crossing_time: Duration) -> Result<Self> {
        Ok(Self::new(id, token.parse()?, crossing_time))
    }
}

impl std::fmt::Display for Vehicle {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Vehicle {} ({})", self.id, self.direction)
    }
}
