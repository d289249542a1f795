//! Core data types for the thermostat controller

use crate::hal::{Duration, HalError};

/// Fan selector position
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FanState {
    /// Fan runs continuously, no thermostatic decision
    On,
    /// Fan follows the system selector and the setpoint
    Auto,
}

/// System selector position
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemState {
    Cool,
    Off,
    Heat,
    /// Only reachable through `FanState::On`
    FanOnly,
}

impl SystemState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SystemState::Cool => "Cool",
            SystemState::Off => "Off",
            SystemState::Heat => "Heat",
            SystemState::FanOnly => "Only Fan",
        }
    }
}

/// Control mode: the fan/system selector pair.
///
/// Fields are private so that `FanState::On` always comes with
/// `SystemState::FanOnly`, and `FanOnly` never appears under `Auto`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mode {
    fan: FanState,
    system: SystemState,
}

impl Mode {
    /// Fan forced on
    pub const fn fan_on() -> Self {
        Self {
            fan: FanState::On,
            system: SystemState::FanOnly,
        }
    }

    /// Automatic fan under the given system state.
    /// `FanOnly` is normalised to [`Mode::fan_on`].
    pub const fn auto(system: SystemState) -> Self {
        match system {
            SystemState::FanOnly => Self::fan_on(),
            _ => Self {
                fan: FanState::Auto,
                system,
            },
        }
    }

    /// Build a mode from its two fields, rejecting combinations that break the invariant
    pub const fn new(fan: FanState, system: SystemState) -> Option<Self> {
        match (fan, system) {
            (FanState::On, SystemState::FanOnly) => Some(Self::fan_on()),
            (FanState::On, _) | (FanState::Auto, SystemState::FanOnly) => None,
            (FanState::Auto, system) => Some(Self::auto(system)),
        }
    }

    pub const fn fan(&self) -> FanState {
        self.fan
    }

    pub const fn system(&self) -> SystemState {
        self.system
    }

    /// Returns true when no control action is needed (`Auto` + `Off`)
    pub const fn is_idle(&self) -> bool {
        matches!(
            (self.fan, self.system),
            (FanState::Auto, SystemState::Off)
        )
    }

    /// Pack into one byte so the pair can be published with a single atomic store
    pub const fn to_bits(self) -> u8 {
        let fan = match self.fan {
            FanState::On => 0,
            FanState::Auto => 1,
        };
        let system = match self.system {
            SystemState::Cool => 0,
            SystemState::Off => 1,
            SystemState::Heat => 2,
            SystemState::FanOnly => 3,
        };
        (fan << 4) | system
    }

    /// Inverse of [`Mode::to_bits`]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        let fan = match bits >> 4 {
            0 => FanState::On,
            1 => FanState::Auto,
            _ => return None,
        };
        let system = match bits & 0x0f {
            0 => SystemState::Cool,
            1 => SystemState::Off,
            2 => SystemState::Heat,
            3 => SystemState::FanOnly,
            _ => return None,
        };
        Self::new(fan, system)
    }
}

/// Idle (unpressed) level of the extra mode buttons
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NormalState {
    /// Buttons read low when released
    Gnd,
    /// Buttons read high when released
    Vcc,
}

impl NormalState {
    /// Returns true if `level` (true = high) differs from the idle level
    pub const fn is_asserted(&self, level: bool) -> bool {
        match self {
            NormalState::Gnd => level,
            NormalState::Vcc => !level,
        }
    }

    /// Pin level of a released button
    pub const fn idle_level(&self) -> bool {
        matches!(self, NormalState::Vcc)
    }
}

/// Build-time polarity of the extra buttons
#[cfg(not(feature = "vcc-idle"))]
pub const NORMAL_STATE_EXTRA_BUTTONS: NormalState = NormalState::Gnd;

/// Build-time polarity of the extra buttons
#[cfg(feature = "vcc-idle")]
pub const NORMAL_STATE_EXTRA_BUTTONS: NormalState = NormalState::Vcc;

/// One read of every button line, as raw pin levels (true = high)
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputSnapshot {
    /// Setpoint up, on-board, active-low
    pub temp_plus: bool,
    /// Setpoint down, on-board, active-low
    pub temp_minus: bool,
    pub fan_on: bool,
    pub fan_auto: bool,
    pub system_cool: bool,
    pub system_off: bool,
    pub system_heat: bool,
}

impl InputSnapshot {
    /// Snapshot with every button released
    pub const fn all_idle(normal: NormalState) -> Self {
        let idle = normal.idle_level();
        Self {
            temp_plus: true,
            temp_minus: true,
            fan_on: idle,
            fan_auto: idle,
            system_cool: idle,
            system_off: idle,
            system_heat: idle,
        }
    }
}

/// Tracked boolean facets, in debounce memory order
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Facet {
    FanOn = 0,
    FanAuto = 1,
    Cool = 2,
    Off = 3,
    Heat = 4,
}

/// Number of facets held in debounce memory
pub const FACET_COUNT: usize = 5;

/// Control indicators driven by the output task
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indicator {
    Fan,
    Heat,
    Cool,
}

/// Result of one output decision
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputDecision {
    pub fan: bool,
    pub heat: bool,
    pub cool: bool,
    /// Output and heartbeat tasks may be deprioritised
    pub idle: bool,
}

/// Periodic tasks known to the scheduler collaborator
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskId {
    Input,
    Output,
    Heartbeat,
}

/// Scheduling level requested for a task
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskPriority {
    Normal,
    /// Parked until the mode leaves `Auto`/`Off`
    Suspended,
}

/// Setpoint button that fired
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdjustDirection {
    Increase,
    Decrease,
}

impl AdjustDirection {
    /// Setpoint change per button press
    pub const STEP: f32 = 0.5;

    /// Pick the asserted adjust line, increase first.
    /// Both lines are on-board buttons that read low when pressed.
    pub const fn from_snapshot(snapshot: &InputSnapshot) -> Option<Self> {
        if !snapshot.temp_plus {
            Some(AdjustDirection::Increase)
        } else if !snapshot.temp_minus {
            Some(AdjustDirection::Decrease)
        } else {
            None
        }
    }

    pub const fn delta(&self) -> f32 {
        match self {
            AdjustDirection::Increase => Self::STEP,
            AdjustDirection::Decrease => -Self::STEP,
        }
    }
}

/// Controller configuration parameters
#[derive(Copy, Clone, Debug)]
pub struct HvacConfig {
    /// Idle polarity of the mode buttons
    pub normal_state: NormalState,
    /// Mode before the first input cycle
    pub initial_mode: Mode,
    /// Setpoint at startup
    pub initial_setpoint: f32,
    /// Temperature reported before the first sample
    pub initial_temperature: f32,
    /// Input sampling period
    pub input_period: Duration,
    /// Output decision period
    pub output_period: Duration,
    /// Maximum time between two status reports
    pub report_interval: Duration,
}

impl Default for HvacConfig {
    fn default() -> Self {
        crate::default_config()
    }
}

impl HvacConfig {
    /// Create a new configuration with validation
    pub fn new(
        normal_state: NormalState,
        initial_mode: Mode,
        initial_setpoint: f32,
        input_period: Duration,
        output_period: Duration,
        report_interval: Duration,
    ) -> Result<Self, HalError> {
        let config = Self {
            normal_state,
            initial_mode,
            initial_setpoint,
            initial_temperature: crate::default_config().initial_temperature,
            input_period,
            output_period,
            report_interval,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the task periods and the setpoint
    pub fn validate(&self) -> Result<(), HalError> {
        let periods_ok = self.input_period.as_micros() != 0
            && self.output_period.as_micros() != 0
            // Output decisions must never run ahead of the input sampling
            && self.output_period >= self.input_period
            && self.report_interval >= self.input_period;

        if !periods_ok || !self.initial_setpoint.is_finite() || !self.initial_temperature.is_finite() {
            return Err(HalError::InvalidConfig);
        }
        Ok(())
    }

    /// Number of input cycles between periodic status reports
    pub fn report_every_ticks(&self) -> u32 {
        let ticks = self.report_interval.as_micros() / self.input_period.as_micros().max(1);
        u32::try_from(ticks).unwrap_or(u32::MAX).max(1)
    }
}
