pub mod bridge_monitor;
pub mod bridge_state;
pub mod light_policy;
