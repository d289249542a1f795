//! One control cycle in direct succession: inputs, outputs, report

use crate::hal::{ButtonBank, HalError, IndicatorBank, Scheduler, TemperatureSensor};
use crate::inputs::InputEngine;
use crate::outputs::OutputEngine;
use crate::report::{StatusReporter, StatusSnapshot};
use crate::state::SharedState;
use crate::types::{HvacConfig, OutputDecision};

/// Result of one [`Controller::cycle`]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CycleOutcome {
    /// An input edge was raised this cycle
    pub edge: bool,
    pub decision: OutputDecision,
    /// Report due this cycle
    pub report: Option<StatusSnapshot>,
}

/// Input, output and report engines run back to back, so each output
/// decision always sees the inputs sampled in the same cycle.
pub struct Controller {
    inputs: InputEngine,
    outputs: OutputEngine,
    reporter: StatusReporter,
}

impl Controller {
    pub fn new(config: &HvacConfig) -> Self {
        Self {
            inputs: InputEngine::new(config.normal_state),
            outputs: OutputEngine::new(),
            reporter: StatusReporter::new(config.report_every_ticks()),
        }
    }

    pub fn inputs(&self) -> &InputEngine {
        &self.inputs
    }

    pub fn outputs(&self) -> &OutputEngine {
        &self.outputs
    }

    /// Run one full cycle
    pub fn cycle<B, T, I, S>(
        &mut self,
        shared: &SharedState,
        buttons: &mut B,
        sensor: &mut T,
        indicators: &mut I,
        scheduler: &S,
    ) -> Result<CycleOutcome, HalError>
    where
        B: ButtonBank,
        T: TemperatureSensor,
        I: IndicatorBank,
        S: Scheduler + ?Sized,
    {
        let edge = self.inputs.update(shared, buttons, sensor)?;
        let decision = self.outputs.update(shared, indicators, scheduler)?;
        let report = self.reporter.poll(shared);

        Ok(CycleOutcome {
            edge,
            decision,
            report,
        })
    }
}
