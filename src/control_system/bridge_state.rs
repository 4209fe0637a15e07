use crate::communication::messages::InvariantViolation;
use crate::models::direction::{Direction, PerDirection};
use crate::shared_data::{BridgeSnapshot, CrossingSnapshot};

/// Counters and light flags shared by every vehicle. Only ever touched with
/// the monitor lock held.
#[derive(Debug, Clone)]
pub struct BridgeState {
    pub max_capacity: usize,
    pub total_requested: PerDirection<usize>,
    pub finished: PerDirection<usize>,
    pub on_bridge: PerDirection<usize>,
    /// Vehicles that passed the green light and are waiting for a free slot.
    pub queued: PerDirection<usize>,
    /// Vehicles blocked on a light that is not green.
    pub waiting_for_green: PerDirection<usize>,
    pub green_light: PerDirection<bool>,
}

impl BridgeState {
    pub fn new(
        total_requested: PerDirection<usize>,
        max_capacity: usize,
        initial_green: Direction,
    ) -> Self {
        let mut green_light = PerDirection::default();
        green_light[initial_green] = true;

        Self {
            max_capacity,
            total_requested,
            finished: PerDirection::default(),
            on_bridge: PerDirection::default(),
            queued: PerDirection::default(),
            waiting_for_green: PerDirection::default(),
            green_light,
        }
    }

    /// Vehicles in `direction` that have not finished, including those on the bridge.
    pub fn remaining(&self, direction: Direction) -> usize {
        self.total_requested[direction].saturating_sub(self.finished[direction])
    }

    /// Vehicles in `direction` that are neither on the bridge nor finished.
    pub fn waiting(&self, direction: Direction) -> usize {
        self.remaining(direction)
            .saturating_sub(self.on_bridge[direction])
    }

    pub fn is_full(&self, direction: Direction) -> bool {
        self.on_bridge[direction] >= self.max_capacity
    }

    pub fn is_complete(&self) -> bool {
        Direction::ALL.iter().all(|&d| self.remaining(d) == 0)
    }

    pub fn snapshot(&self) -> BridgeSnapshot {
        BridgeSnapshot {
            max_capacity: self.max_capacity,
            total_requested: self.total_requested,
            finished: self.finished,
            on_bridge: self.on_bridge,
            queued: self.queued,
            waiting_for_green: self.waiting_for_green,
            green_light: self.green_light,
        }
    }

    pub fn crossing_snapshot(&self, direction: Direction) -> CrossingSnapshot {
        CrossingSnapshot {
            direction,
            waiting: PerDirection::new(self.waiting(Direction::ToA), self.waiting(Direction::ToB)),
            on_bridge: self.on_bridge[direction],
        }
    }

    /// Every safety property that does not hold right now.
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        if self.green_light.to_a && self.green_light.to_b {
            violations.push(InvariantViolation::BothLightsGreen);
        }
        if self.on_bridge.to_a > 0 && self.on_bridge.to_b > 0 {
            violations.push(InvariantViolation::BothDirectionsOnBridge {
                to_a: self.on_bridge.to_a,
                to_b: self.on_bridge.to_b,
            });
        }
        for direction in Direction::ALL {
            if self.on_bridge[direction] > self.max_capacity {
                violations.push(InvariantViolation::OverCapacity {
                    direction,
                    on_bridge: self.on_bridge[direction],
                    max_capacity: self.max_capacity,
                });
            }
            if self.finished[direction] > self.total_requested[direction] {
                violations.push(InvariantViolation::TooManyFinished {
                    direction,
                    finished: self.finished[direction],
                    total_requested: self.total_requested[direction],
                });
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_has_single_green() {
        let state = BridgeState::new(PerDirection::new(3, 2), 2, Direction::ToB);
        assert!(!state.green_light.to_a);
        assert!(state.green_light.to_b);
        assert!(state.check_invariants().is_empty());
        assert_eq!(state.remaining(Direction::ToA), 3);
        assert!(!state.is_complete());
    }

    #[test]
    fn test_waiting_excludes_vehicles_on_bridge() {
        let mut state = BridgeState::new(PerDirection::new(5, 1), 3, Direction::ToA);
        state.on_bridge.to_a = 2;
        state.finished.to_a = 1;

        let crossing = state.crossing_snapshot(Direction::ToA);
        assert_eq!(crossing.waiting, PerDirection::new(2, 1));
        assert_eq!(crossing.on_bridge, 2);
    }

    #[test]
    fn test_is_full_at_capacity() {
        let mut state = BridgeState::new(PerDirection::new(5, 0), 2, Direction::ToA);
        state.on_bridge.to_a = 1;
        assert!(!state.is_full(Direction::ToA));
        state.on_bridge.to_a = 2;
        assert!(state.is_full(Direction::ToA));
    }

    #[test]
    fn test_check_invariants_reports_every_violation() {
        let mut state = BridgeState::new(PerDirection::new(2, 2), 1, Direction::ToA);
        state.green_light.to_b = true;
        state.on_bridge = PerDirection::new(2, 1);
        state.finished.to_b = 3;

        let violations = state.check_invariants();
        assert!(violations.contains(&InvariantViolation::BothLightsGreen));
        assert!(violations.contains(&InvariantViolation::BothDirectionsOnBridge { to_a: 2, to_b: 1 }));
        assert!(violations.contains(&InvariantViolation::OverCapacity {
            direction: Direction::ToA,
            on_bridge: 2,
            max_capacity: 1,
        }));
        assert!(violations.contains(&InvariantViolation::TooManyFinished {
            direction: Direction::ToB,
            finished: 3,
            total_requested: 2,
        }));
        assert_eq!(violations.len(), 4);
    }
}
