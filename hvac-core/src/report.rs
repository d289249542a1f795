//! Status report trigger and snapshot

use crate::state::SharedState;
use crate::types::{FanState, SystemState};

/// Everything the status reporter needs, read in one pass
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusSnapshot {
    pub fan: FanState,
    pub system: SystemState,
    pub setpoint: f32,
    pub temperature: f32,
    pub fan_output: bool,
}

impl StatusSnapshot {
    pub fn temperature_fahrenheit(&self) -> f32 {
        self.temperature * 9.0 / 5.0 + 32.0
    }
}

/// Decides when a status report is due: every `every_ticks` cycles, or
/// immediately when the edge flag is set. Consuming the edge flag is the
/// reporter's job alone.
pub struct StatusReporter {
    every_ticks: u32,
    remaining: u32,
}

impl StatusReporter {
    /// The first poll always reports
    pub const fn new(every_ticks: u32) -> Self {
        Self {
            every_ticks: if every_ticks == 0 { 1 } else { every_ticks },
            remaining: 0,
        }
    }

    /// Call once per input cycle
    pub fn poll(&mut self, shared: &SharedState) -> Option<StatusSnapshot> {
        self.remaining = self.remaining.saturating_sub(1);
        let edge = shared.take_edge();

        if self.remaining == 0 || edge {
            self.remaining = self.every_ticks;
            Some(shared.snapshot())
        } else {
            None
        }
    }
}
