use crate::error::{BridgeError, Result};
use crate::global_variables::{
    CROSSING_MAX_MS, CROSSING_MIN_MS, ENV_CROSSING_MAX_MS, ENV_CROSSING_MIN_MS,
    ENV_MAX_CAPACITY, ENV_SEED, MAX_CAPACITY,
};
use crate::models::direction::PerDirection;
use log::warn;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Everything needed to run one simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub vehicles: PerDirection<usize>,
    pub max_capacity: usize,
    /// Seed for light changes and crossing times. Drawn at start when absent.
    pub seed: Option<u64>,
    pub crossing_min_ms: u64,
    pub crossing_max_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            vehicles: PerDirection::default(),
            max_capacity: MAX_CAPACITY,
            seed: None,
            crossing_min_ms: CROSSING_MIN_MS,
            crossing_max_ms: CROSSING_MAX_MS,
        }
    }
}

impl SimulationConfig {
    pub fn new(to_a: usize, to_b: usize) -> Self {
        Self {
            vehicles: PerDirection::new(to_a, to_b),
            ..Self::default()
        }
    }

    /// Parses the positional arguments (program name already stripped):
    /// vehicles heading to A, then vehicles heading to B.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<S> = args.into_iter().collect();
        match args.as_slice() {
            [to_a, to_b] => Ok(Self::new(
                parse_count(to_a.as_ref()),
                parse_count(to_b.as_ref()),
            )),
            _ => Err(BridgeError::Usage { got: args.len() }),
        }
    }

    /// Applies the `BRIDGE_*` overrides found through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_MAX_CAPACITY) {
            self.max_capacity = parse_setting(ENV_MAX_CAPACITY, value)?;
        }
        if let Some(value) = lookup(ENV_SEED) {
            self.seed = Some(parse_setting(ENV_SEED, value)?);
        }
        if let Some(value) = lookup(ENV_CROSSING_MIN_MS) {
            self.crossing_min_ms = parse_setting(ENV_CROSSING_MIN_MS, value)?;
        }
        if let Some(value) = lookup(ENV_CROSSING_MAX_MS) {
            self.crossing_max_ms = parse_setting(ENV_CROSSING_MAX_MS, value)?;
        }
        Ok(self)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn with_crossing_time(mut self, min: Duration, max: Duration) -> Self {
        self.crossing_min_ms = u64::try_from(min.as_millis()).unwrap_or(u64::MAX);
        self.crossing_max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_capacity == 0 {
            return Err(BridgeError::InvalidCapacity(self.max_capacity));
        }
        if self.crossing_min_ms > self.crossing_max_ms {
            return Err(BridgeError::InvalidCrossingTime {
                min_ms: self.crossing_min_ms,
                max_ms: self.crossing_max_ms,
            });
        }
        Ok(())
    }

    pub fn total_vehicles(&self) -> usize {
        self.vehicles.to_a.saturating_add(self.vehicles.to_b)
    }
}

/// Reads a vehicle count the way C's `atoi` would: leading whitespace, an
/// optional sign, then the leading run of digits. Anything unparseable,
/// negative or too large counts as zero.
pub fn parse_count(token: &str) -> usize {
    let trimmed = token.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];

    if negative || digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or_else(|_| {
        warn!("Vehicle count {:?} is out of range, using 0", token);
        0
    })
}

fn parse_setting<T: FromStr>(name: &'static str, value: String) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| BridgeError::InvalidSetting { name, value })
}
