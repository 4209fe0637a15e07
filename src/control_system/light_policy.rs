use crate::control_system::bridge_state::BridgeState;
use crate::global_variables::{ARRIVAL_YELLOW_FACTOR, BACKPRESSURE_YELLOW_FACTOR};
use crate::models::direction::{Direction, PerDirection};
use rand::rngs::SmallRng;
use rand::Rng;
use std::collections::VecDeque;

/// Source of the random draws behind light changes.
pub trait LightDraw: Send {
    /// Returns true with probability `1 / odds`.
    fn one_in(&mut self, odds: u32) -> bool;
}

impl LightDraw for SmallRng {
    fn one_in(&mut self, odds: u32) -> bool {
        self.random_ratio(1, odds.max(1))
    }
}

/// Replays a fixed sequence of draws, then answers `false` forever.
#[derive(Debug, Default, Clone)]
pub struct ScriptedDraw {
    draws: VecDeque<bool>,
}

impl ScriptedDraw {
    pub fn new(draws: impl IntoIterator<Item = bool>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
        }
    }

    /// A draw that never switches the light early.
    pub fn never() -> Self {
        Self::default()
    }
}

impl LightDraw for ScriptedDraw {
    fn one_in(&mut self, _odds: u32) -> bool {
        self.draws.pop_front().unwrap_or(false)
    }
}

/// What the monitor has to do after a policy step, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Yellow(Direction),
    Red(Direction),
    Green(Direction),
    /// Wake one vehicle waiting for this direction's green light.
    WakeArrival(Direction),
    /// Wake a batch of up to `max_capacity` vehicles waiting for this direction's green light.
    WakeArrivals(Direction),
    /// Wake one vehicle waiting for a free slot on the bridge.
    WakeCapacity,
}

/// Decides when the right-of-way moves to the other side.
///
/// A direction is green, yellow (not green, committed vehicles still
/// crossing) or red. The light only leaves a direction when the opposite side
/// has vehicles left, and the other side only turns green once the current
/// one has nobody queued and nobody on the bridge.
pub struct LightPolicy {
    draw: Box<dyn LightDraw>,
    arrival_odds: u32,
    backpressure_odds: u32,
}

impl LightPolicy {
    pub fn new(draw: Box<dyn LightDraw>, max_capacity: usize) -> Self {
        let capacity = u32::try_from(max_capacity).unwrap_or(u32::MAX);
        Self {
            draw,
            arrival_odds: ARRIVAL_YELLOW_FACTOR.saturating_mul(capacity),
            backpressure_odds: BACKPRESSURE_YELLOW_FACTOR.saturating_mul(capacity),
        }
    }

    /// Coin flip, unless only one side has vehicles at all.
    pub fn initial_green(&mut self, total_requested: PerDirection<usize>) -> Direction {
        match (total_requested.to_a, total_requested.to_b) {
            (0, b) if b > 0 => Direction::ToB,
            (a, 0) if a > 0 => Direction::ToA,
            _ => {
                if self.draw.one_in(2) {
                    Direction::ToA
                } else {
                    Direction::ToB
                }
            }
        }
    }

    /// A vehicle saw the green light and registered in the queue.
    pub fn on_green_granted(&mut self, state: &mut BridgeState, direction: Direction) -> Vec<Effect> {
        let mut effects = Vec::new();
        if state.remaining(direction.opposite()) > 0 && self.draw.one_in(self.arrival_odds) {
            turn_yellow(state, direction, &mut effects);
        }
        effects
    }

    /// A queued vehicle found the bridge full. Traffic is backed up, so the
    /// switch is more likely than on arrival.
    pub fn on_full(&mut self, state: &mut BridgeState, direction: Direction) -> Vec<Effect> {
        let mut effects = Vec::new();
        if state.green_light[direction]
            && state.remaining(direction.opposite()) > 0
            && self.draw.one_in(self.backpressure_odds)
        {
            turn_yellow(state, direction, &mut effects);
        }
        effects
    }

    /// A vehicle left the bridge; its counters are already updated.
    pub fn on_departure(&mut self, state: &mut BridgeState, direction: Direction) -> Vec<Effect> {
        let other = direction.opposite();
        let mut effects = Vec::new();

        if !state.green_light[direction] {
            // Yellow: let the committed vehicles finish, then hand over.
            if state.queued[direction] > 0 {
                effects.push(Effect::WakeCapacity);
            } else {
                settle(state, direction, &mut effects);
            }
            return effects;
        }

        if state.queued[direction] > 0 {
            effects.push(Effect::WakeCapacity);
        } else if state.remaining(direction) == 0 {
            if state.remaining(other) > 0 {
                turn_yellow(state, direction, &mut effects);
            }
        } else {
            effects.push(Effect::WakeArrival(direction));
        }

        if state.green_light[direction]
            && state.remaining(other) > 0
            && self.draw.one_in(self.backpressure_odds)
        {
            turn_yellow(state, direction, &mut effects);
        }
        effects
    }
}

fn turn_yellow(state: &mut BridgeState, direction: Direction, effects: &mut Vec<Effect>) {
    state.green_light[direction] = false;
    effects.push(Effect::Yellow(direction));
    settle(state, direction, effects);
}

/// Completes the hand-over once a yellow direction has drained.
fn settle(state: &mut BridgeState, direction: Direction, effects: &mut Vec<Effect>) {
    let other = direction.opposite();
    if state.green_light[direction]
        || state.green_light[other]
        || state.queued[direction] > 0
        || state.on_bridge[direction] > 0
    {
        return;
    }
    effects.push(Effect::Red(direction));
    state.green_light[other] = true;
    effects.push(Effect::Green(other));
    effects.push(Effect::WakeArrivals(other));
}
