#![no_std]

//! Thermostat firmware: shared state, task gating and the embassy tasks

pub use embassy_executor::Spawner;
pub use embassy_time::Duration;

pub use hvac_core::*;

pub use crate::board::*;
pub use crate::scheduler::GateScheduler;
pub use crate::tasks::*;

/// Registers shared by the tasks and the setpoint interrupt
pub static SHARED: SharedState = SharedState::new(
    Mode::auto(SystemState::Off),
    INITIAL_SETPOINT,
    INITIAL_TEMPERATURE,
);

/// Task gates driven by the output engine
pub static GATES: GateScheduler = GateScheduler::new();

/// Button port read by the input task and the EXTI handler
pub static BUTTONS: ButtonPort = ButtonPort::new(idle_levels(NORMAL_STATE_EXTRA_BUTTONS));

/// ADC results mirrored from the conversion interrupt
pub static ADC: AdcMirror = AdcMirror::new();

pub const INITIAL_SETPOINT: f32 = 25.0;
pub const INITIAL_TEMPERATURE: f32 = 20.0;

/// Port levels with nothing pressed. Setpoint buttons idle high.
pub const fn idle_levels(normal: NormalState) -> u8 {
    let adjust = (1 << pins::TEMP_PLUS) | (1 << pins::TEMP_MINUS);
    match normal {
        NormalState::Gnd => adjust,
        NormalState::Vcc => pins::BUTTON_MASK,
    }
}

pub mod scheduler {
    //! Task gating for the output and heartbeat tasks

    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_sync::signal::Signal;
    use portable_atomic::{AtomicBool, Ordering};

    use hvac_core::{Scheduler, TaskId, TaskPriority};

    /// Parks tasks the output engine has suspended.
    ///
    /// A suspended output task sleeps until the next input edge. A suspended
    /// heartbeat sleeps until it is set back to `Normal`.
    pub struct GateScheduler {
        output_suspended: AtomicBool,
        heartbeat_suspended: AtomicBool,
        output_wake: Signal<CriticalSectionRawMutex, ()>,
        heartbeat_resume: Signal<CriticalSectionRawMutex, ()>,
    }

    impl GateScheduler {
        pub const fn new() -> Self {
            Self {
                output_suspended: AtomicBool::new(false),
                heartbeat_suspended: AtomicBool::new(false),
                output_wake: Signal::new(),
                heartbeat_resume: Signal::new(),
            }
        }

        pub fn is_suspended(&self, task: TaskId) -> bool {
            match task {
                TaskId::Input => false,
                TaskId::Output => self.output_suspended.load(Ordering::Acquire),
                TaskId::Heartbeat => self.heartbeat_suspended.load(Ordering::Acquire),
            }
        }

        /// Input task saw an edge; the output task gets one cycle.
        /// Signalled even while running, so an edge that lands before the
        /// suspend is stored is not lost.
        pub fn notify_input_edge(&self) {
            self.output_wake.signal(());
        }

        /// Returns immediately unless the output task is suspended
        pub async fn output_gate(&self) {
            if self.output_suspended.load(Ordering::Acquire) {
                self.output_wake.wait().await;
            }
        }

        /// Returns once the heartbeat is allowed to run
        pub async fn heartbeat_gate(&self) {
            while self.heartbeat_suspended.load(Ordering::Acquire) {
                self.heartbeat_resume.wait().await;
            }
        }
    }

    impl Default for GateScheduler {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Scheduler for GateScheduler {
        fn set_priority(&self, task: TaskId, priority: TaskPriority) {
            let suspended = priority == TaskPriority::Suspended;
            match task {
                // Input sampling never stops
                TaskId::Input => {}
                TaskId::Output => {
                    self.output_suspended.store(suspended, Ordering::Release);
                    if !suspended {
                        self.output_wake.signal(());
                    }
                }
                TaskId::Heartbeat => {
                    self.heartbeat_suspended.store(suspended, Ordering::Release);
                    if !suspended {
                        self.heartbeat_resume.signal(());
                    }
                }
            }
        }
    }
}

pub mod tasks {
    //! Embassy tasks

    use embassy_time::{Duration, Ticker, Timer};

    use crate::board::{start_conversion, ButtonPort, ControlLeds, LedPin};
    use crate::{GATES, SHARED};
    use hvac_core::{
        Heartbeat, InputEngine, NormalState, OutputEngine, PotChannel, StatusReporter,
        TemperatureChannel,
    };

    /// Samples the buttons and temperature every `period`
    #[embassy_executor::task]
    pub async fn input_task(
        mut buttons: &'static ButtonPort,
        mut sensor: TemperatureChannel<'static>,
        normal: NormalState,
        period: Duration,
    ) {
        #[cfg(feature = "defmt")]
        defmt::info!("🎛️ Input task started");

        let mut engine = InputEngine::new(normal);
        let mut ticker = Ticker::every(period);

        loop {
            match engine.update(&SHARED, &mut buttons, &mut sensor) {
                Ok(true) => GATES.notify_input_edge(),
                Ok(false) => {}
                Err(_e) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Input sample skipped: {}", _e);
                }
            }
            // Results land in the mirror before the next sample
            start_conversion();
            ticker.next().await;
        }
    }

    /// Drives the fan, heat and cool LEDs
    #[embassy_executor::task]
    pub async fn output_task(mut leds: ControlLeds, period: Duration) {
        #[cfg(feature = "defmt")]
        defmt::info!("🌡️ Output task started");

        let mut engine = OutputEngine::new();

        loop {
            GATES.output_gate().await;

            if let Err(_e) = engine.update(&SHARED, &mut leds, &GATES) {
                #[cfg(feature = "defmt")]
                defmt::warn!("Output write failed: {}", _e);
            }

            if !engine.is_suspended() {
                Timer::after(period).await;
            }
        }
    }

    /// Blinks the heartbeat LED. Terminates the firmware if the
    /// modulation channel fails.
    #[embassy_executor::task]
    pub async fn heartbeat_task(mut channel: PotChannel<'static>, mut led: LedPin) {
        #[cfg(feature = "defmt")]
        defmt::info!("💓 Heartbeat task started");

        let mut heartbeat = Heartbeat::new();

        loop {
            GATES.heartbeat_gate().await;

            match heartbeat.step(&mut channel, &mut led) {
                Ok(period) => Timer::after(period).await,
                Err(e) => {
                    #[cfg(feature = "defmt")]
                    defmt::error!("❌ Heartbeat failed: {}", e);
                    panic!("heartbeat: {:?}", e);
                }
            }
        }
    }

    /// Emits the periodic and edge-triggered status report
    #[embassy_executor::task]
    pub async fn report_task(every_ticks: u32, period: Duration) {
        let mut reporter = StatusReporter::new(every_ticks);
        let mut ticker = Ticker::every(period);

        loop {
            if let Some(_status) = reporter.poll(&SHARED) {
                #[cfg(feature = "defmt")]
                defmt::info!(
                    "📊 Fan: {} System: {} Setpoint: {}C Temp: {}C ({}F) Fan output: {}",
                    _status.fan,
                    _status.system.as_str(),
                    _status.setpoint,
                    _status.temperature,
                    _status.temperature_fahrenheit(),
                    _status.fan_output
                );
            }
            ticker.next().await;
        }
    }
}

pub mod board;

// Time driver for embassy
mod time_driver;

pub use time_driver::on_systick;
