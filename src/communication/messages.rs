use crate::models::direction::Direction;
use crate::shared_data::CrossingSnapshot;
use serde::{Deserialize, Serialize};

/// A broken safety property, detected under the bridge lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvariantViolation {
    BothLightsGreen,
    BothDirectionsOnBridge {
        to_a: usize,
        to_b: usize,
    },
    OverCapacity {
        direction: Direction,
        on_bridge: usize,
        max_capacity: usize,
    },
    TooManyFinished {
        direction: Direction,
        finished: usize,
        total_requested: usize,
    },
    /// A departure with no vehicle of that direction on the bridge.
    DepartWithoutArrival {
        direction: Direction,
    },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InvariantViolation::BothLightsGreen => write!(f, "both lights are green"),
            InvariantViolation::BothDirectionsOnBridge { to_a, to_b } => {
                write!(f, "Illegal travel. To A: {} | To B: {}", to_a, to_b)
            }
            InvariantViolation::OverCapacity {
                direction,
                on_bridge,
                max_capacity,
            } => write!(
                f,
                "{} vehicles on the bridge {} (capacity {})",
                on_bridge, direction, max_capacity
            ),
            InvariantViolation::TooManyFinished {
                direction,
                finished,
                total_requested,
            } => write!(
                f,
                "{} vehicles finished {} but only {} were requested",
                finished, direction, total_requested
            ),
            InvariantViolation::DepartWithoutArrival { direction } => {
                write!(f, "vehicle left the bridge {} without arriving", direction)
            }
        }
    }
}

/// Everything the bridge reports while a simulation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// The light chosen before any vehicle starts.
    Initialized { green: Direction },
    Yellow { direction: Direction },
    Red { direction: Direction },
    Green { direction: Direction },
    Crossing(CrossingSnapshot),
    Violation { violation: InvariantViolation },
}
