#![cfg_attr(not(feature = "std"), no_std)]

//! # HVAC Core
//!
//! Thermostat control logic for a single-board target.
//! Samples the mode buttons and the temperature channel, arbitrates the
//! fan/heat/cool outputs against a setpoint and keeps a liveness heartbeat
//! whose period follows a potentiometer.

pub mod types;
pub mod hal;
pub mod state;
pub mod inputs;
pub mod setpoint;
pub mod outputs;
pub mod heartbeat;
pub mod report;
pub mod controller;
pub mod adc;
pub mod ticks;

#[cfg(feature = "test-utils")]
pub mod test_utils;


pub use types::*;
pub use hal::{*, Instant, Duration};
pub use state::SharedState;
pub use inputs::InputEngine;
pub use setpoint::handle_setpoint_edge;
pub use outputs::{decide, OutputEngine};
pub use heartbeat::{heartbeat_period, Heartbeat, HeartbeatError, MAX_HEARTBEAT_PERIOD_US};
pub use report::{StatusReporter, StatusSnapshot};
pub use controller::{Controller, CycleOutcome};
pub use adc::{AdcMirror, PotChannel, TemperatureChannel, STALE_POT_READS};
pub use ticks::TickClock;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration matching the reference board
pub fn default_config() -> HvacConfig {
    HvacConfig {
        normal_state: NORMAL_STATE_EXTRA_BUTTONS,
        initial_mode: Mode::auto(SystemState::Off),
        initial_setpoint: 25.0,
        initial_temperature: 20.0,
        input_period: Duration::from_micros(4_000),
        output_period: Duration::from_micros(4_000),
        report_interval: Duration::from_millis(1_000),
    }
}
