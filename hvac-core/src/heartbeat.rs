//! Liveness heartbeat with potentiometer-modulated period

use crate::hal::{Duration, HalError, IndicatorOutput, ModulationChannel};

/// Base heartbeat half-period in microseconds
pub const BASE_HEARTBEAT_PERIOD_US: u32 = 15_000;

/// Longest sleep the platform handles reliably
pub const MAX_HEARTBEAT_PERIOD_US: u32 = 1_000_000;

/// Half-period for a raw modulation sample: `15000 + 100 * sample / 4` us,
/// clamped to [`MAX_HEARTBEAT_PERIOD_US`].
pub fn heartbeat_period(sample: u16) -> Duration {
    let us = BASE_HEARTBEAT_PERIOD_US + (100 * sample as u32) / 4;
    Duration::from_micros(us.min(MAX_HEARTBEAT_PERIOD_US) as u64)
}

/// Heartbeat failure. Losing the modulation channel is unrecoverable:
/// a silent heartbeat would falsely signal a healthy system.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeartbeatError {
    /// Channel could not be started
    StartFailed(HalError),
    /// Sample read did not succeed
    SampleUnavailable(HalError),
}

#[cfg(feature = "std")]
impl core::fmt::Display for HeartbeatError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HeartbeatError::StartFailed(e) => write!(f, "heartbeat channel start failed: {}", e),
            HeartbeatError::SampleUnavailable(e) => write!(f, "heartbeat sample unavailable: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HeartbeatError {}

/// Heartbeat modulator state
pub struct Heartbeat {
    started: bool,
    level: bool,
}

impl Heartbeat {
    pub const fn new() -> Self {
        Self {
            started: false,
            level: false,
        }
    }

    /// Returns true once the modulation channel is running
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Level written by the last step
    pub fn level(&self) -> bool {
        self.level
    }

    /// One heartbeat cycle: read the sample, toggle the LED, return how long to sleep.
    ///
    /// The first call starts the modulation channel. A failed sample read is
    /// returned before the LED is touched.
    pub fn step<C, L>(&mut self, channel: &mut C, led: &mut L) -> Result<Duration, HeartbeatError>
    where
        C: ModulationChannel,
        L: IndicatorOutput,
    {
        if !self.started {
            channel.start().map_err(HeartbeatError::StartFailed)?;
            self.started = true;
        }

        let sample = channel.read_raw().map_err(HeartbeatError::SampleUnavailable)?;
        let period = heartbeat_period(sample);

        // LED write failures are transient; the next cycle writes again
        let _ = led.set_state(self.level);
        self.level = !self.level;

        Ok(period)
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}
