#![no_std]
#![no_main]

#[cfg(feature = "defmt")]
use defmt_rtt as _;

// RISC-V runtime
use riscv_rt as _;

// Panic handler
#[cfg(not(feature = "defmt"))]
use panic_halt as _;
#[cfg(feature = "defmt")]
use panic_probe as _;

use embassy_executor::Spawner;
use embassy_time::Duration;

use hvac_firmware::*;

/// Main firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    #[cfg(feature = "defmt")]
    defmt::info!("🔧 HVAC Controller v{} starting...", VERSION);

    let config = default_config();
    #[cfg(feature = "defmt")]
    defmt::info!(
        "⚙️ Input {}us, output {}us, report every {} ticks, polarity {}",
        config.input_period.as_micros(),
        config.output_period.as_micros(),
        config.report_every_ticks(),
        config.normal_state
    );

    // No task runs on a board that failed to come up
    if let Err(e) = board::init(&config) {
        #[cfg(feature = "defmt")]
        defmt::error!("❌ Board init failed: {}", e);
        panic!("board init: {:?}", e);
    }

    spawner.must_spawn(input_task(
        &BUTTONS,
        TemperatureChannel(&ADC),
        config.normal_state,
        config.input_period,
    ));
    spawner.must_spawn(output_task(control_leds(), config.output_period));
    spawner.must_spawn(heartbeat_task(PotChannel(&ADC), heartbeat_led()));
    spawner.must_spawn(report_task(config.report_every_ticks(), config.input_period));

    #[cfg(feature = "defmt")]
    defmt::info!("✨ Thermostat ready!");

    // Main supervision loop
    loop {
        embassy_time::Timer::after(Duration::from_secs(1)).await;
        #[cfg(feature = "defmt")]
        defmt::trace!("Gates: output {}, heartbeat {}",
            GATES.is_suspended(TaskId::Output),
            GATES.is_suspended(TaskId::Heartbeat));
    }
}

// Interrupt vector entries

#[no_mangle]
extern "C" fn SysTick() {
    on_systick();
}

#[no_mangle]
extern "C" fn ADC1_2() {
    on_adc_interrupt(&ADC);
}

/// Setpoint up button
#[no_mangle]
extern "C" fn EXTI0() {
    on_setpoint_interrupt(&SHARED, &BUTTONS);
}

/// Setpoint down button
#[no_mangle]
extern "C" fn EXTI1() {
    on_setpoint_interrupt(&SHARED, &BUTTONS);
}
