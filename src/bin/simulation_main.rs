// simulation_main.rs
use bridge_crossing::communication::transcript::{ConsoleTranscript, EventSink};
use bridge_crossing::config::SimulationConfig;
use bridge_crossing::error::BridgeError;
use bridge_crossing::global_variables::USAGE_EXIT_CODE;
use bridge_crossing::simulation_engine::simulation::run_simulation;
use std::process;
use std::sync::Arc;

fn main() {
    env_logger::init();

    let config = SimulationConfig::from_args(std::env::args().skip(1))
        .and_then(|config| config.with_overrides(|name| std::env::var(name).ok()));
    let config = match config {
        Ok(config) => config,
        Err(e @ BridgeError::Usage { .. }) => {
            eprintln!("{}", e);
            eprintln!(
                "Please enter two integers as parameters: vehicles to A, vehicles to B. Non integers will be treated as 0"
            );
            process::exit(USAGE_EXIT_CODE);
        }
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };

    let transcript: Arc<dyn EventSink> = Arc::new(ConsoleTranscript);
    match run_simulation(&config, vec![transcript]) {
        Ok(report) => match serde_json::to_string(&report) {
            Ok(json) => log::info!("Report: {}", json),
            Err(e) => log::warn!("Could not serialize report: {}", BridgeError::from(e)),
        },
        Err(e) => {
            eprintln!("Simulation error: {}", e);
            process::exit(1);
        }
    }
}
