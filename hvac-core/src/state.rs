//! Shared state between the setpoint interrupt and the periodic tasks

use portable_atomic::{AtomicBool, AtomicF32, AtomicU8, Ordering};
use crate::report::StatusSnapshot;
use crate::types::{HvacConfig, Mode};

/// Atomic register file shared by every execution context.
/// Safe for use in interrupt contexts: no operation blocks.
///
/// Writers per field:
/// - mode, temperature: input task
/// - setpoint: setpoint interrupt
/// - edge event: input task and setpoint interrupt raise it, reporter clears it
/// - fan output: output task
pub struct SharedState {
    mode: AtomicU8,
    setpoint: AtomicF32,
    temperature: AtomicF32,
    edge_event: AtomicBool,
    fan_output: AtomicBool,
}

impl SharedState {
    /// Create new shared state
    pub const fn new(mode: Mode, setpoint: f32, temperature: f32) -> Self {
        Self {
            mode: AtomicU8::new(mode.to_bits()),
            setpoint: AtomicF32::new(setpoint),
            temperature: AtomicF32::new(temperature),
            edge_event: AtomicBool::new(false),
            fan_output: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &HvacConfig) -> Self {
        Self::new(
            config.initial_mode,
            config.initial_setpoint,
            config.initial_temperature,
        )
    }

    /// Current control mode
    pub fn mode(&self) -> Mode {
        // Only packed modes are ever stored
        Mode::from_bits(self.mode.load(Ordering::Acquire)).unwrap_or(Mode::fan_on())
    }

    /// Publish a new mode, returns the previous one
    pub fn publish_mode(&self, mode: Mode) -> Mode {
        let previous = self.mode.swap(mode.to_bits(), Ordering::AcqRel);
        Mode::from_bits(previous).unwrap_or(Mode::fan_on())
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint.load(Ordering::Acquire)
    }

    /// Lock-free setpoint change, returns the new value
    pub fn adjust_setpoint(&self, delta: f32) -> f32 {
        self.setpoint.fetch_add(delta, Ordering::AcqRel) + delta
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.load(Ordering::Acquire)
    }

    pub fn publish_temperature(&self, celsius: f32) {
        self.temperature.store(celsius, Ordering::Release);
    }

    /// Flag that something worth reporting changed
    pub fn raise_edge(&self) {
        self.edge_event.store(true, Ordering::Release);
    }

    /// Check the edge flag without consuming it
    pub fn edge_pending(&self) -> bool {
        self.edge_event.load(Ordering::Acquire)
    }

    /// Consume the edge flag. Several raises between two takes coalesce into one.
    pub fn take_edge(&self) -> bool {
        self.edge_event.swap(false, Ordering::AcqRel)
    }

    pub fn fan_output(&self) -> bool {
        self.fan_output.load(Ordering::Acquire)
    }

    pub fn publish_fan_output(&self, on: bool) {
        self.fan_output.store(on, Ordering::Release);
    }

    /// Read every reportable field
    pub fn snapshot(&self) -> StatusSnapshot {
        let mode = self.mode();
        StatusSnapshot {
            fan: mode.fan(),
            system: mode.system(),
            setpoint: self.setpoint(),
            temperature: self.temperature(),
            fan_output: self.fan_output(),
        }
    }

    /// Reset all fields to the configured startup values (for testing)
    #[cfg(feature = "test-utils")]
    pub fn reset(&self, config: &HvacConfig) {
        self.mode.store(config.initial_mode.to_bits(), Ordering::Release);
        self.setpoint.store(config.initial_setpoint, Ordering::Release);
        self.temperature.store(config.initial_temperature, Ordering::Release);
        self.edge_event.store(false, Ordering::Release);
        self.fan_output.store(false, Ordering::Release);
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::from_config(&crate::default_config())
    }
}
