use crate::control_system::bridge_monitor::BridgeMonitor;
use crate::error::Result;
use crate::models::vehicle::Vehicle;
use log::{debug, error};
use std::thread;
use std::time::Duration;

/// Drives one vehicle across the bridge: arrive, cross, depart.
/// The crossing time is spent without holding the bridge lock.
pub fn simulate_vehicle_journey(vehicle: &Vehicle, monitor: &BridgeMonitor) {
    debug!("{} arriving at the bridge", vehicle);
    monitor.arrive(vehicle.direction);

    monitor.cross(vehicle.direction);
    if !vehicle.crossing_time.is_zero() {
        thread::sleep(vehicle.crossing_time);
    }

    monitor.depart(vehicle.direction);
    debug!("{} left the bridge", vehicle);
}

/// Same journey for a vehicle described by a direction token. An unknown
/// token is reported and the vehicle never touches the bridge.
pub fn simulate_vehicle_from_token(
    id: u64,
    token: &str,
    crossing_time: Duration,
    monitor: &BridgeMonitor,
) -> Result<()> {
    let vehicle = Vehicle::from_token(id, token, crossing_time).inspect_err(|e| {
        error!("Vehicle {} not started: {}", id, e);
    })?;
    simulate_vehicle_journey(&vehicle, monitor);
    Ok(())
}
