//! Test utilities for the thermostat core

use crate::types::{AdjustDirection, InputSnapshot, Mode, NormalState, SystemState, FanState};

/// Button snapshot that decodes to `mode` under the given polarity
pub fn snapshot_for(mode: Mode, normal: NormalState) -> InputSnapshot {
    let pressed = !normal.idle_level();
    let mut snapshot = InputSnapshot::all_idle(normal);

    match (mode.fan(), mode.system()) {
        (FanState::On, _) => snapshot.fan_on = pressed,
        (FanState::Auto, system) => {
            snapshot.fan_auto = pressed;
            match system {
                SystemState::Cool => snapshot.system_cool = pressed,
                SystemState::Off => snapshot.system_off = pressed,
                SystemState::Heat => snapshot.system_heat = pressed,
                SystemState::FanOnly => {}
            }
        }
    }
    snapshot
}

/// Snapshot with one setpoint button held (on-board buttons read low when pressed)
pub fn setpoint_press(direction: AdjustDirection, normal: NormalState) -> InputSnapshot {
    let mut snapshot = InputSnapshot::all_idle(normal);
    match direction {
        AdjustDirection::Increase => snapshot.temp_plus = false,
        AdjustDirection::Decrease => snapshot.temp_minus = false,
    }
    snapshot
}

pub mod input_script {
    //! Scripted button sequences for driving a controller

    use super::snapshot_for;
    use crate::controller::{Controller, CycleOutcome};
    use crate::hal::mock::{MockButtons, MockIndicators, MockThermometer, RecordingScheduler};
    use crate::hal::HalError;
    use crate::state::SharedState;
    use crate::types::{InputSnapshot, Mode, NormalState};
    use heapless::Vec;

    /// Snapshot held for a number of cycles
    #[derive(Debug, Clone, Copy)]
    pub struct ScriptStep {
        pub snapshot: InputSnapshot,
        pub cycles: u32,
        pub temperature: f32,
    }

    /// Summary of a script run
    #[derive(Debug, Default)]
    pub struct ScriptRun {
        /// Cycles that raised an input edge
        pub edges: u32,
        /// Reports emitted
        pub reports: u32,
        /// Modes observed after each cycle
        pub modes: std::vec::Vec<Mode>,
        pub last: Option<CycleOutcome>,
    }

    /// Ordered list of script steps
    #[derive(Debug, Clone)]
    pub struct InputScript {
        normal: NormalState,
        steps: Vec<ScriptStep, 64>,
    }

    impl InputScript {
        pub fn new(normal: NormalState) -> Self {
            Self {
                normal,
                steps: Vec::new(),
            }
        }

        /// Hold the buttons for `mode` for `cycles` cycles
        pub fn hold(mut self, mode: Mode, cycles: u32, temperature: f32) -> Self {
            let snapshot = snapshot_for(mode, self.normal);
            self.steps
                .push(ScriptStep { snapshot, cycles, temperature })
                .expect("input script holds at most 64 steps");
            self
        }

        /// Hold a raw snapshot for `cycles` cycles
        pub fn raw(mut self, snapshot: InputSnapshot, cycles: u32, temperature: f32) -> Self {
            self.steps
                .push(ScriptStep { snapshot, cycles, temperature })
                .expect("input script holds at most 64 steps");
            self
        }

        pub fn steps(&self) -> &[ScriptStep] {
            &self.steps
        }

        /// Drive `controller` through every step with mock hardware
        pub fn run(
            &self,
            controller: &mut Controller,
            shared: &SharedState,
            leds: &mut MockIndicators,
            scheduler: &RecordingScheduler,
        ) -> Result<ScriptRun, HalError> {
            let mut buttons = MockButtons::new(InputSnapshot::all_idle(self.normal));
            let mut sensor = MockThermometer::new(shared.temperature());
            let mut run = ScriptRun::default();

            for step in &self.steps {
                buttons.set_snapshot(step.snapshot);
                sensor.set_celsius(step.temperature);
                for _ in 0..step.cycles {
                    let outcome = controller.cycle(shared, &mut buttons, &mut sensor, leds, scheduler)?;
                    if outcome.edge {
                        run.edges += 1;
                    }
                    if outcome.report.is_some() {
                        run.reports += 1;
                    }
                    run.modes.push(shared.mode());
                    run.last = Some(outcome);
                }
            }

            Ok(run)
        }
    }
}
