// Bridge limits
pub const MAX_CAPACITY: usize = 5;

// A vehicle that just got a green light turns it yellow with probability 1 / (ARRIVAL_YELLOW_FACTOR * capacity).
pub const ARRIVAL_YELLOW_FACTOR: u32 = 3;
// Same draw when the bridge is full or a vehicle departs: more aggressive under backpressure.
pub const BACKPRESSURE_YELLOW_FACTOR: u32 = 2;

// Crossing time (milliseconds), drawn uniformly per vehicle.
pub const CROSSING_MIN_MS: u64 = 1000;
pub const CROSSING_MAX_MS: u64 = 3000;

// Environment overrides
pub const ENV_MAX_CAPACITY: &str = "BRIDGE_MAX_CAPACITY";
pub const ENV_SEED: &str = "BRIDGE_SEED";
pub const ENV_CROSSING_MIN_MS: &str = "BRIDGE_CROSSING_MIN_MS";
pub const ENV_CROSSING_MAX_MS: &str = "BRIDGE_CROSSING_MAX_MS";

// Exit status for a wrong argument count
pub const USAGE_EXIT_CODE: i32 = -1;
