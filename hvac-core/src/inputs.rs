//! Input sampling, mode decoding and edge detection

use crate::hal::{ButtonBank, HalError, TemperatureSensor};
use crate::state::SharedState;
use crate::types::{Facet, InputSnapshot, Mode, NormalState, SystemState, FACET_COUNT};

/// Outcome of decoding one button snapshot
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Decoded {
    /// FAN-ON asserted
    FanOn,
    /// FAN-AUTO asserted with the winning system line, if any
    Auto(Option<Facet>),
    /// Neither fan line asserted: keep the previous mode
    Unchanged,
}

impl Decoded {
    /// Mode implied by this decode, if it changes the mode at all
    pub const fn mode(&self) -> Option<Mode> {
        match self {
            Decoded::FanOn => Some(Mode::fan_on()),
            Decoded::Auto(Some(Facet::Cool)) => Some(Mode::auto(SystemState::Cool)),
            Decoded::Auto(Some(Facet::Heat)) => Some(Mode::auto(SystemState::Heat)),
            // Explicit OFF and "nothing pressed" both mean Off
            Decoded::Auto(_) => Some(Mode::auto(SystemState::Off)),
            Decoded::Unchanged => None,
        }
    }
}

/// Priority-ordered decode of the mode buttons.
///
/// FAN-ON beats FAN-AUTO; under FAN-AUTO, COOL beats OFF beats HEAT.
pub fn decode(snapshot: &InputSnapshot, normal: NormalState) -> Decoded {
    if normal.is_asserted(snapshot.fan_on) {
        Decoded::FanOn
    } else if normal.is_asserted(snapshot.fan_auto) {
        let system = if normal.is_asserted(snapshot.system_cool) {
            Some(Facet::Cool)
        } else if normal.is_asserted(snapshot.system_off) {
            Some(Facet::Off)
        } else if normal.is_asserted(snapshot.system_heat) {
            Some(Facet::Heat)
        } else {
            None
        };
        Decoded::Auto(system)
    } else {
        Decoded::Unchanged
    }
}

/// Input debounce/edge engine.
///
/// Owns the debounce memory: the previous value of each tracked facet.
/// An edge is raised only on a false -> true facet transition, so a
/// button held down across many cycles reports once.
pub struct InputEngine {
    normal_state: NormalState,
    memory: [bool; FACET_COUNT],
}

impl InputEngine {
    /// Create new engine for the given button polarity
    pub const fn new(normal_state: NormalState) -> Self {
        Self {
            normal_state,
            memory: [false; FACET_COUNT],
        }
    }

    /// Facet values recorded by the last update
    pub fn memory(&self) -> &[bool; FACET_COUNT] {
        &self.memory
    }

    pub fn normal_state(&self) -> NormalState {
        self.normal_state
    }

    /// Sample inputs, publish mode and temperature, detect edges.
    ///
    /// Both devices are read before anything is published, so a read
    /// failure leaves shared state untouched.
    /// Returns true if an edge was raised during this cycle.
    pub fn update<B, T>(
        &mut self,
        shared: &SharedState,
        buttons: &mut B,
        sensor: &mut T,
    ) -> Result<bool, HalError>
    where
        B: ButtonBank,
        T: TemperatureSensor,
    {
        let snapshot = buttons.read_snapshot()?;
        let celsius = sensor.read_celsius()?;

        let decoded = decode(&snapshot, self.normal_state);
        if let Some(mode) = decoded.mode() {
            let previous = shared.publish_mode(mode);
            #[cfg(feature = "defmt")]
            if previous != mode {
                defmt::debug!("Mode: {:?} -> {:?}", previous, mode);
            }
            #[cfg(not(feature = "defmt"))]
            let _ = previous;
        }

        shared.publish_temperature(celsius);

        let next = self.next_memory(decoded);
        let edge = self.memory.iter().zip(next.iter()).any(|(&was, &now)| !was && now);
        self.memory = next;

        if edge {
            shared.raise_edge();
            #[cfg(feature = "defmt")]
            defmt::trace!("Input edge, facets: {:?}", self.memory);
        }

        Ok(edge)
    }

    /// Facet values after applying `decoded`.
    /// System facets are left alone while the fan is forced on.
    fn next_memory(&self, decoded: Decoded) -> [bool; FACET_COUNT] {
        let mut next = self.memory;
        match decoded {
            Decoded::FanOn => {
                next[Facet::FanOn as usize] = true;
                next[Facet::FanAuto as usize] = false;
            }
            Decoded::Auto(system) => {
                next[Facet::FanOn as usize] = false;
                next[Facet::FanAuto as usize] = true;
                for facet in [Facet::Cool, Facet::Off, Facet::Heat] {
                    next[facet as usize] = system == Some(facet);
                }
            }
            Decoded::Unchanged => {}
        }
        next
    }
}
