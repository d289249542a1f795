//! Output decision engine: fan, heat and cool arbitration

use crate::hal::{HalError, IndicatorBank, Scheduler};
use crate::state::SharedState;
use crate::types::{FanState, Indicator, Mode, OutputDecision, SystemState, TaskId, TaskPriority};

/// Decide indicator levels for a mode and temperature/setpoint pair.
///
/// Comparisons are strict with no hysteresis band: at exact equality the
/// fan is off in both Heat and Cool, and near equality it can chatter.
pub fn decide(mode: Mode, temperature: f32, setpoint: f32) -> OutputDecision {
    match (mode.fan(), mode.system()) {
        (FanState::On, _) => OutputDecision {
            fan: true,
            heat: false,
            cool: false,
            idle: false,
        },
        (FanState::Auto, SystemState::Off) => OutputDecision {
            fan: false,
            heat: false,
            cool: false,
            idle: true,
        },
        (FanState::Auto, SystemState::Heat) => OutputDecision {
            fan: temperature < setpoint,
            heat: true,
            cool: false,
            idle: false,
        },
        (FanState::Auto, SystemState::Cool) => OutputDecision {
            fan: temperature > setpoint,
            heat: false,
            cool: true,
            idle: false,
        },
        // Not constructible: Mode::auto normalises FanOnly to fan_on
        (FanState::Auto, SystemState::FanOnly) => decide(Mode::fan_on(), temperature, setpoint),
    }
}

/// Output decision engine.
///
/// Tracks whether it has parked the output and heartbeat tasks so the
/// scheduler sees one command per transition rather than one per cycle.
pub struct OutputEngine {
    suspended: bool,
}

impl OutputEngine {
    pub const fn new() -> Self {
        Self { suspended: false }
    }

    /// Returns true while the output and heartbeat tasks are parked
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Decide from shared state, drive the indicators and publish the fan state
    pub fn update<I, S>(
        &mut self,
        shared: &SharedState,
        indicators: &mut I,
        scheduler: &S,
    ) -> Result<OutputDecision, HalError>
    where
        I: IndicatorBank,
        S: Scheduler + ?Sized,
    {
        let decision = decide(shared.mode(), shared.temperature(), shared.setpoint());

        shared.publish_fan_output(decision.fan);
        indicators.set(Indicator::Fan, decision.fan)?;
        indicators.set(Indicator::Heat, decision.heat)?;
        indicators.set(Indicator::Cool, decision.cool)?;

        self.apply_schedule(decision.idle, scheduler);

        Ok(decision)
    }

    fn apply_schedule<S: Scheduler + ?Sized>(&mut self, idle: bool, scheduler: &S) {
        if idle == self.suspended {
            return;
        }

        let priority = if idle {
            TaskPriority::Suspended
        } else {
            TaskPriority::Normal
        };
        scheduler.set_priority(TaskId::Output, priority);
        scheduler.set_priority(TaskId::Heartbeat, priority);
        self.suspended = idle;

        #[cfg(feature = "defmt")]
        defmt::info!("Output and heartbeat tasks: {:?}", priority);
    }
}

impl Default for OutputEngine {
    fn default() -> Self {
        Self::new()
    }
}
