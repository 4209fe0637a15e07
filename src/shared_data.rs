// src/shared_data.rs

use crate::communication::messages::InvariantViolation;
use crate::config::SimulationConfig;
use crate::models::direction::{Direction, PerDirection};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// The light as seen by drivers heading in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightState {
    Green,
    /// Not green, but committed vehicles are still allowed to finish.
    Yellow,
    Red,
}

/// Every counter and flag of the bridge at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeSnapshot {
    pub max_capacity: usize,
    pub total_requested: PerDirection<usize>,
    pub finished: PerDirection<usize>,
    pub on_bridge: PerDirection<usize>,
    pub queued: PerDirection<usize>,
    pub waiting_for_green: PerDirection<usize>,
    pub green_light: PerDirection<bool>,
}

impl BridgeSnapshot {
    pub fn light_state(&self, direction: Direction) -> LightState {
        if self.green_light[direction] {
            LightState::Green
        } else if self.on_bridge[direction] > 0 || self.queued[direction] > 0 {
            LightState::Yellow
        } else {
            LightState::Red
        }
    }

    /// Vehicles in `direction` that have not finished crossing yet.
    pub fn remaining(&self, direction: Direction) -> usize {
        self.total_requested[direction].saturating_sub(self.finished[direction])
    }

    pub fn is_complete(&self) -> bool {
        Direction::ALL.iter().all(|&d| self.remaining(d) == 0)
    }
}

/// Occupancy as printed for every vehicle that starts crossing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossingSnapshot {
    pub direction: Direction,
    /// Vehicles heading in each direction that are not on the bridge and not finished.
    pub waiting: PerDirection<usize>,
    pub on_bridge: usize,
}

/// Summary of a complete run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub config: SimulationConfig,
    pub seed: u64,
    pub started_at: u64,
    pub elapsed_ms: u64,
    pub final_state: BridgeSnapshot,
    pub initial_green: Option<Direction>,
    pub final_lights: PerDirection<LightState>,
    /// Number of times the green light moved to the other side.
    pub light_changes: usize,
    pub crossings: usize,
    pub violations: Vec<InvariantViolation>,
}

pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
