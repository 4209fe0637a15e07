//! Error types for the bridge simulation

use thiserror::Error;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// Wrong number of command-line arguments
    #[error("expected 2 arguments (vehicles to A, vehicles to B), got {got}")]
    Usage { got: usize },

    /// A vehicle was handed a direction token the bridge does not know
    #[error("invalid direction received: {0:?}")]
    InvalidDirection(String),

    /// A bridge must hold at least one vehicle
    #[error("bridge capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),

    /// An environment override could not be parsed
    #[error("invalid value {value:?} for {name}")]
    InvalidSetting { name: &'static str, value: String },

    #[error("crossing time range is inverted: {min_ms}ms > {max_ms}ms")]
    InvalidCrossingTime { min_ms: u64, max_ms: u64 },

    /// The runtime hosting the vehicle tasks could not be built
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    /// A vehicle task panicked or was cancelled
    #[error("vehicle task failed: {0}")]
    VehicleTask(String),

    #[error("report serialization error: {0}")]
    Report(#[from] serde_json::Error),
}

impl From<tokio::task::JoinError> for BridgeError {
    fn from(err: tokio::task::JoinError) -> Self {
        BridgeError::VehicleTask(err.to_string())
    }
}
