use crate::communication::messages::{BridgeEvent, InvariantViolation};
use crate::models::direction::Direction;
use std::sync::{Mutex, PoisonError};

/// Receives every event the bridge emits. Called while the bridge lock is
/// held, so implementations must not call back into the monitor.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &BridgeEvent);
}

/// Prints the human-readable transcript to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleTranscript;

impl ConsoleTranscript {
    pub fn render(event: &BridgeEvent) -> String {
        match event {
            BridgeEvent::Initialized { green } => {
                format!("+++ To {} light starts green +++", green.side())
            }
            BridgeEvent::Yellow { direction } => {
                format!("||| To {} light turning yellow |||", direction.side())
            }
            BridgeEvent::Red { direction } => {
                format!("XXX To {} light turning red XXX", direction.side())
            }
            BridgeEvent::Green { direction } => {
                format!("+++ To {} light turning green +++", direction.side())
            }
            BridgeEvent::Crossing(snapshot) => format!(
                "Waiting for A: {} ==== On bridge: {} | Direction: {} ==== Waiting for B: {}",
                snapshot.waiting[Direction::ToA],
                snapshot.on_bridge,
                snapshot.direction,
                snapshot.waiting[Direction::ToB]
            ),
            BridgeEvent::Violation { violation } => format!("!!! {} !!!", violation),
        }
    }
}

impl EventSink for ConsoleTranscript {
    fn record(&self, event: &BridgeEvent) {
        println!("{}", Self::render(event));
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<BridgeEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BridgeEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn initial_green(&self) -> Option<Direction> {
        self.events().iter().find_map(|e| match e {
            BridgeEvent::Initialized { green } => Some(*green),
            _ => None,
        })
    }

    /// Sides that received the green light after the initial choice, in order.
    pub fn handovers(&self) -> Vec<Direction> {
        self.events()
            .iter()
            .filter_map(|e| match e {
                BridgeEvent::Green { direction } => Some(*direction),
                _ => None,
            })
            .collect()
    }

    pub fn crossings(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, BridgeEvent::Crossing(_)))
            .count()
    }

    pub fn violations(&self) -> Vec<InvariantViolation> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BridgeEvent::Violation { violation } => Some(violation),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for EventLog {
    fn record(&self, event: &BridgeEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
