//! Hardware Abstraction Layer for the thermostat controller

// Re-export time types based on feature
#[cfg(feature = "embassy-time")]
pub use embassy_time::{Duration, Instant};

#[cfg(not(feature = "embassy-time"))]
pub use self::mock_time::{Duration, Instant};

#[cfg(not(feature = "embassy-time"))]
mod mock_time {
    /// Mock instant type for compilation without embassy-time
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Instant(u64);

    impl Instant {
        pub fn now() -> Self {
            Self(0) // Placeholder implementation
        }

        pub const fn from_micros(us: u64) -> Self {
            Self(us)
        }

        pub fn duration_since(&self, other: Instant) -> Duration {
            Duration::from_micros(self.0.saturating_sub(other.0))
        }

        pub const fn as_micros(&self) -> u64 {
            self.0
        }
    }

    /// Mock duration type, microsecond resolution
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Duration(u64);

    impl Duration {
        pub const fn from_micros(us: u64) -> Self {
            Self(us)
        }

        pub const fn from_millis(ms: u64) -> Self {
            Self(ms * 1_000)
        }

        pub const fn as_micros(&self) -> u64 {
            self.0
        }

        pub const fn as_millis(&self) -> u64 {
            self.0 / 1_000
        }
    }

    impl core::ops::Div<u32> for Duration {
        type Output = Duration;

        fn div(self, rhs: u32) -> Duration {
            Duration(self.0 / rhs as u64)
        }
    }

    impl core::ops::Mul<u32> for Duration {
        type Output = Duration;

        fn mul(self, rhs: u32) -> Duration {
            Duration(self.0 * rhs as u64)
        }
    }
}

use embedded_hal::digital::{InputPin, OutputPin};
use crate::types::{Indicator, InputSnapshot, TaskId, TaskPriority};

/// Error types for HAL operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// GPIO operation failed
    GpioError,
    /// ADC conversion or read failed
    AdcError,
    /// Sampling requested before the channel was started
    ChannelNotStarted,
    /// Hardware not initialized
    NotInitialized,
    /// Invalid configuration
    InvalidConfig,
}

#[cfg(feature = "std")]
impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HalError::GpioError => write!(f, "GPIO operation failed"),
            HalError::AdcError => write!(f, "ADC read failed"),
            HalError::ChannelNotStarted => write!(f, "ADC channel not started"),
            HalError::NotInitialized => write!(f, "Hardware not initialized"),
            HalError::InvalidConfig => write!(f, "Invalid configuration"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// Polled bank of discrete button lines
pub trait ButtonBank {
    /// Read every line in one pass
    fn read_snapshot(&mut self) -> Result<InputSnapshot, HalError>;
}

/// Continuously sampled temperature channel
pub trait TemperatureSensor {
    /// Last calibrated sample in degrees Celsius
    fn read_celsius(&mut self) -> Result<f32, HalError>;
}

/// Free-running channel that modulates the heartbeat period
pub trait ModulationChannel {
    /// Start continuous conversion
    fn start(&mut self) -> Result<(), HalError>;

    /// Latest raw conversion result
    fn read_raw(&mut self) -> Result<u16, HalError>;
}

/// Single discrete output line
pub trait IndicatorOutput {
    /// Set output state (true = lit)
    fn set_state(&mut self, state: bool) -> Result<(), HalError>;

    /// Get last commanded output state
    fn get_state(&self) -> Result<bool, HalError>;

    /// Toggle output state
    fn toggle(&mut self) -> Result<(), HalError> {
        let current = self.get_state()?;
        self.set_state(!current)
    }
}

/// Named control indicators
pub trait IndicatorBank {
    fn set(&mut self, indicator: Indicator, on: bool) -> Result<(), HalError>;
}

/// Scheduler collaborator used to park tasks that have nothing to do
pub trait Scheduler {
    fn set_priority(&self, task: TaskId, priority: TaskPriority);
}

/// Fan, heat and cool outputs grouped as one bank
pub struct IndicatorSet<F, H, C> {
    pub fan: F,
    pub heat: H,
    pub cool: C,
}

impl<F, H, C> IndicatorSet<F, H, C> {
    pub fn new(fan: F, heat: H, cool: C) -> Self {
        Self { fan, heat, cool }
    }
}

impl<F, H, C> IndicatorBank for IndicatorSet<F, H, C>
where
    F: IndicatorOutput,
    H: IndicatorOutput,
    C: IndicatorOutput,
{
    fn set(&mut self, indicator: Indicator, on: bool) -> Result<(), HalError> {
        match indicator {
            Indicator::Fan => self.fan.set_state(on),
            Indicator::Heat => self.heat.set_state(on),
            Indicator::Cool => self.cool.set_state(on),
        }
    }
}

/// Button lines in snapshot order
pub const BUTTON_COUNT: usize = 7;

/// Generic implementation for embedded-hal compatible input pins.
///
/// Pin order: temp plus, temp minus, fan on, fan auto, cool, off, heat.
pub struct EmbeddedHalButtons<P> {
    pins: [P; BUTTON_COUNT],
}

impl<P> EmbeddedHalButtons<P>
where
    P: InputPin,
{
    pub fn new(pins: [P; BUTTON_COUNT]) -> Self {
        Self { pins }
    }

    /// Give the pins back
    pub fn release(self) -> [P; BUTTON_COUNT] {
        self.pins
    }
}

impl<P> ButtonBank for EmbeddedHalButtons<P>
where
    P: InputPin,
{
    fn read_snapshot(&mut self) -> Result<InputSnapshot, HalError> {
        let mut levels = [false; BUTTON_COUNT];
        for (level, pin) in levels.iter_mut().zip(self.pins.iter_mut()) {
            *level = pin.is_high().map_err(|_| HalError::GpioError)?;
        }

        Ok(InputSnapshot {
            temp_plus: levels[0],
            temp_minus: levels[1],
            fan_on: levels[2],
            fan_auto: levels[3],
            system_cool: levels[4],
            system_off: levels[5],
            system_heat: levels[6],
        })
    }
}

/// Generic implementation for embedded-hal compatible output pins
pub struct EmbeddedHalIndicator<P> {
    pin: P,
    inverted: bool,
    state: bool,
}

impl<P> EmbeddedHalIndicator<P>
where
    P: OutputPin,
{
    pub fn new(pin: P, inverted: bool) -> Self {
        Self {
            pin,
            inverted,
            state: false,
        }
    }

    /// Give the pin back
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P> IndicatorOutput for EmbeddedHalIndicator<P>
where
    P: OutputPin,
{
    fn set_state(&mut self, state: bool) -> Result<(), HalError> {
        let output_state = if self.inverted { !state } else { state };
        if output_state {
            self.pin.set_high().map_err(|_| HalError::GpioError)?;
        } else {
            self.pin.set_low().map_err(|_| HalError::GpioError)?;
        }
        self.state = state;
        Ok(())
    }

    fn get_state(&self) -> Result<bool, HalError> {
        // embedded-hal has no readback on plain output pins
        Ok(self.state)
    }
}

/// Scheduler that ignores every request, for builds without task control
pub struct NoOpScheduler;

impl Scheduler for NoOpScheduler {
    fn set_priority(&self, _task: TaskId, _priority: TaskPriority) {}
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock implementations for testing

    use super::*;
    use core::cell::{Cell, RefCell};
    use heapless::Vec;

    /// Scriptable button bank
    #[derive(Default)]
    pub struct MockButtons {
        snapshot: Cell<InputSnapshot>,
        failing: Cell<bool>,
    }

    impl MockButtons {
        pub fn new(snapshot: InputSnapshot) -> Self {
            Self {
                snapshot: Cell::new(snapshot),
                failing: Cell::new(false),
            }
        }

        pub fn set_snapshot(&self, snapshot: InputSnapshot) {
            self.snapshot.set(snapshot);
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.set(failing);
        }
    }

    impl ButtonBank for MockButtons {
        fn read_snapshot(&mut self) -> Result<InputSnapshot, HalError> {
            if self.failing.get() {
                return Err(HalError::GpioError);
            }
            Ok(self.snapshot.get())
        }
    }

    /// Temperature source returning a fixed reading
    pub struct MockThermometer {
        celsius: Cell<f32>,
        failing: Cell<bool>,
    }

    impl MockThermometer {
        pub fn new(celsius: f32) -> Self {
            Self {
                celsius: Cell::new(celsius),
                failing: Cell::new(false),
            }
        }

        pub fn set_celsius(&self, celsius: f32) {
            self.celsius.set(celsius);
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.set(failing);
        }
    }

    impl TemperatureSensor for MockThermometer {
        fn read_celsius(&mut self) -> Result<f32, HalError> {
            if self.failing.get() {
                return Err(HalError::AdcError);
            }
            Ok(self.celsius.get())
        }
    }

    /// Heartbeat modulation channel with start tracking
    #[derive(Default)]
    pub struct MockModulation {
        sample: Cell<u16>,
        start_calls: Cell<u32>,
        failing: Cell<bool>,
    }

    impl MockModulation {
        pub fn new(sample: u16) -> Self {
            Self {
                sample: Cell::new(sample),
                ..Self::default()
            }
        }

        pub fn set_sample(&self, sample: u16) {
            self.sample.set(sample);
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.set(failing);
        }

        /// How many times the channel was started
        pub fn start_calls(&self) -> u32 {
            self.start_calls.get()
        }
    }

    impl ModulationChannel for MockModulation {
        fn start(&mut self) -> Result<(), HalError> {
            self.start_calls.set(self.start_calls.get() + 1);
            Ok(())
        }

        fn read_raw(&mut self) -> Result<u16, HalError> {
            if self.start_calls.get() == 0 {
                return Err(HalError::ChannelNotStarted);
            }
            if self.failing.get() {
                return Err(HalError::AdcError);
            }
            Ok(self.sample.get())
        }
    }

    /// Output line that remembers its state
    #[derive(Default)]
    pub struct MockIndicator {
        state: RefCell<bool>,
        writes: Cell<u32>,
    }

    impl MockIndicator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn is_active(&self) -> bool {
            *self.state.borrow()
        }

        /// Number of writes seen so far
        pub fn writes(&self) -> u32 {
            self.writes.get()
        }
    }

    impl IndicatorOutput for MockIndicator {
        fn set_state(&mut self, state: bool) -> Result<(), HalError> {
            *self.state.borrow_mut() = state;
            self.writes.set(self.writes.get() + 1);
            Ok(())
        }

        fn get_state(&self) -> Result<bool, HalError> {
            Ok(*self.state.borrow())
        }
    }

    /// Fan, heat and cool mocks
    pub type MockIndicators = IndicatorSet<MockIndicator, MockIndicator, MockIndicator>;

    impl MockIndicators {
        pub fn mock() -> Self {
            IndicatorSet::new(MockIndicator::new(), MockIndicator::new(), MockIndicator::new())
        }

        /// Current (fan, heat, cool) levels
        pub fn levels(&self) -> (bool, bool, bool) {
            (self.fan.is_active(), self.heat.is_active(), self.cool.is_active())
        }
    }

    /// Scheduler that records every command it receives
    #[derive(Default)]
    pub struct RecordingScheduler {
        commands: RefCell<Vec<(TaskId, TaskPriority), 32>>,
    }

    impl RecordingScheduler {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn commands(&self) -> Vec<(TaskId, TaskPriority), 32> {
            self.commands.borrow().clone()
        }

        pub fn clear(&self) {
            self.commands.borrow_mut().clear();
        }
    }

    impl Scheduler for RecordingScheduler {
        fn set_priority(&self, task: TaskId, priority: TaskPriority) {
            self.commands.borrow_mut().push((task, priority)).ok();
        }
    }
}
