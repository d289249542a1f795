//! Conversion results published by the ADC interrupt and read by tasks
//!
//! The interrupt handler converts and stores; the input and heartbeat tasks
//! only read. A potentiometer channel that stops delivering conversions is
//! reported as failed once the heartbeat has read the same sample
//! [`STALE_POT_READS`] times in a row.

use portable_atomic::{AtomicBool, AtomicF32, AtomicU16, AtomicU8, Ordering};

use crate::hal::{HalError, ModulationChannel, TemperatureSensor};

/// Reads of one sample before the pot channel fails
pub const STALE_POT_READS: u8 = 3;

/// Latest temperature and potentiometer conversions
pub struct AdcMirror {
    temperature: AtomicF32,
    temperature_valid: AtomicBool,
    pot_raw: AtomicU16,
    pot_running: AtomicBool,
    pot_stale_reads: AtomicU8,
}

impl AdcMirror {
    pub const fn new() -> Self {
        Self {
            temperature: AtomicF32::new(0.0),
            temperature_valid: AtomicBool::new(false),
            pot_raw: AtomicU16::new(0),
            pot_running: AtomicBool::new(false),
            pot_stale_reads: AtomicU8::new(0),
        }
    }

    /// Store a converted temperature sample
    pub fn on_temperature_conversion(&self, celsius: f32) {
        self.temperature.store(celsius, Ordering::Release);
        self.temperature_valid.store(true, Ordering::Release);
    }

    /// Store a raw potentiometer sample. Ignored until the channel starts.
    pub fn on_pot_conversion(&self, raw: u16) {
        if self.pot_running.load(Ordering::Acquire) {
            self.pot_raw.store(raw, Ordering::Release);
            self.pot_stale_reads.store(0, Ordering::Release);
        }
    }

    pub fn is_pot_running(&self) -> bool {
        self.pot_running.load(Ordering::Acquire)
    }
}

impl Default for AdcMirror {
    fn default() -> Self {
        Self::new()
    }
}

/// Temperature channel view of an [`AdcMirror`]
pub struct TemperatureChannel<'a>(pub &'a AdcMirror);

impl TemperatureSensor for TemperatureChannel<'_> {
    fn read_celsius(&mut self) -> Result<f32, HalError> {
        if !self.0.temperature_valid.load(Ordering::Acquire) {
            return Err(HalError::NotInitialized);
        }
        Ok(self.0.temperature.load(Ordering::Acquire))
    }
}

/// Potentiometer channel view of an [`AdcMirror`]
pub struct PotChannel<'a>(pub &'a AdcMirror);

impl ModulationChannel for PotChannel<'_> {
    fn start(&mut self) -> Result<(), HalError> {
        self.0.pot_stale_reads.store(0, Ordering::Release);
        self.0.pot_running.store(true, Ordering::Release);
        #[cfg(feature = "defmt")]
        defmt::info!("Heartbeat channel running");
        Ok(())
    }

    fn read_raw(&mut self) -> Result<u16, HalError> {
        if !self.0.pot_running.load(Ordering::Acquire) {
            return Err(HalError::ChannelNotStarted);
        }
        let stale = self.0.pot_stale_reads.fetch_add(1, Ordering::AcqRel);
        if stale >= STALE_POT_READS {
            // Saturate so a dead channel keeps failing
            self.0.pot_stale_reads.store(STALE_POT_READS, Ordering::Release);
            return Err(HalError::AdcError);
        }
        Ok(self.0.pot_raw.load(Ordering::Acquire))
    }
}
