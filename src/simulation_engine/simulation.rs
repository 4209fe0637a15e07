// simulation.rs
use crate::communication::transcript::{EventLog, EventSink};
use crate::config::SimulationConfig;
use crate::control_system::bridge_monitor::BridgeMonitor;
use crate::error::{BridgeError, Result};
use crate::models::direction::{Direction, PerDirection};
use crate::models::vehicle::Vehicle;
use crate::shared_data::{current_timestamp, SimulationReport};
use crate::simulation_engine::vehicles::simulate_vehicle_journey;

use log::{info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Builder;
use tokio::task;

// Keeps the crossing-time stream independent of the light draws.
const CROSSING_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Builds every vehicle of the run: all vehicles heading to A first, then
/// those heading to B, each with its own crossing time.
pub fn plan_vehicles(config: &SimulationConfig, seed: u64) -> Vec<Vehicle> {
    let mut rng = SmallRng::seed_from_u64(seed ^ CROSSING_STREAM);
    let directions = Direction::ALL
        .iter()
        .flat_map(|&d| std::iter::repeat(d).take(config.vehicles[d]));

    directions
        .zip(1u64..)
        .map(|(direction, id)| {
            let millis = rng.random_range(config.crossing_min_ms..=config.crossing_max_ms);
            Vehicle::new(id, direction, Duration::from_millis(millis))
        })
        .collect()
}

/// Runs the whole simulation: one blocking task per vehicle, all of them
/// joined before the report is built.
pub fn run_simulation(
    config: &SimulationConfig,
    sinks: Vec<Arc<dyn EventSink>>,
) -> Result<SimulationReport> {
    config.validate()?;

    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    info!(
        "Starting simulation: {} vehicles ({} to A, {} to B), capacity {}, seed {}",
        config.total_vehicles(),
        config.vehicles.to_a,
        config.vehicles.to_b,
        config.max_capacity,
        seed
    );

    let log = Arc::new(EventLog::new());
    let mut sinks = sinks;
    sinks.push(log.clone());
    let monitor = Arc::new(BridgeMonitor::with_sinks(
        config.vehicles,
        config.max_capacity,
        Box::new(SmallRng::seed_from_u64(seed)),
        sinks,
    )?);

    let vehicles = plan_vehicles(config, seed);
    // Every vehicle blocks a thread for its whole journey; a smaller pool
    // could park all threads on a light that only an unscheduled vehicle
    // would change.
    let runtime = Builder::new_multi_thread()
        .worker_threads(1)
        .max_blocking_threads(config.total_vehicles().max(1))
        .thread_name("bridge-vehicle")
        .enable_all()
        .build()?;

    let started_at = current_timestamp();
    let started = Instant::now();
    runtime.block_on(async {
        let handles: Vec<_> = vehicles
            .into_iter()
            .map(|vehicle| {
                let monitor = Arc::clone(&monitor);
                task::spawn_blocking(move || simulate_vehicle_journey(&vehicle, &monitor))
            })
            .collect();

        let mut failure = None;
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Vehicle task failed: {}", e);
                failure.get_or_insert(BridgeError::from(e));
            }
        }
        failure.map_or(Ok(()), Err)
    })?;
    let elapsed = started.elapsed();

    let final_state = monitor.snapshot();
    if !final_state.is_complete() {
        warn!("Simulation ended with vehicles unfinished: {:?}", final_state);
    }
    let violations = log.violations();
    if !violations.is_empty() {
        warn!("{} invariant violations during the run", violations.len());
    }

    let final_lights = PerDirection::new(
        final_state.light_state(Direction::ToA),
        final_state.light_state(Direction::ToB),
    );
    let report = SimulationReport {
        config: config.clone(),
        seed,
        started_at,
        elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        final_state,
        final_lights,
        initial_green: log.initial_green(),
        light_changes: log.handovers().len(),
        crossings: log.crossings(),
        violations,
    };
    info!(
        "Simulation finished in {} ms: {} crossings, {} light changes",
        report.elapsed_ms, report.crossings, report.light_changes
    );
    Ok(report)
}
