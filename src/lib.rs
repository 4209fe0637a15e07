//! Vehicles crossing a single-lane bridge in both directions, coordinated
//! by a monitor with a randomized traffic-light policy.

pub mod communication;
pub mod config;
pub mod control_system;
pub mod error;
pub mod global_variables;
pub mod models;
pub mod shared_data;
pub mod simulation_engine;
