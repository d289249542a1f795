//! Setpoint interrupts racing the periodic cycle, and the tick clock
//! shared between the timer interrupt and thread mode

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use hvac_core::hal::mock::{MockButtons, MockIndicators, MockThermometer, RecordingScheduler};
use hvac_core::test_utils::{setpoint_press, snapshot_for};
use hvac_core::{
    default_config, handle_setpoint_edge, AdjustDirection, Controller, Mode, NormalState,
    SharedState, SystemState, TickClock,
};

#[test]
fn test_no_lost_setpoint_updates() {
    println!("⚡ Hammering the setpoint while the controller runs");

    let config = default_config();
    let shared = Arc::new(SharedState::from_config(&config));
    let running = Arc::new(AtomicBool::new(true));

    let mut interrupts = Vec::new();
    for i in 0..6 {
        let shared = shared.clone();
        let (direction, presses) = if i < 4 {
            (AdjustDirection::Increase, 500)
        } else {
            (AdjustDirection::Decrease, 300)
        };
        interrupts.push(thread::spawn(move || {
            let press = setpoint_press(direction, NormalState::Gnd);
            for _ in 0..presses {
                assert_eq!(handle_setpoint_edge(&shared, &press), Some(direction));
            }
        }));
    }

    let cycler = {
        let shared = shared.clone();
        let running = running.clone();
        thread::spawn(move || {
            let mut controller = Controller::new(&config);
            let mut buttons = MockButtons::new(snapshot_for(Mode::auto(SystemState::Heat), NormalState::Gnd));
            let mut sensor = MockThermometer::new(21.0);
            let mut leds = MockIndicators::mock();
            let scheduler = RecordingScheduler::new();
            let mut cycles = 0u32;

            while running.load(Ordering::Relaxed) || cycles == 0 {
                controller
                    .cycle(&shared, &mut buttons, &mut sensor, &mut leds, &scheduler)
                    .unwrap();
                cycles += 1;
            }
            cycles
        })
    };

    for handle in interrupts {
        handle.join().unwrap();
    }
    running.store(false, Ordering::Relaxed);
    let cycles = cycler.join().unwrap();

    // 25.0 + 4 * 500 * 0.5 - 2 * 300 * 0.5
    assert_eq!(shared.setpoint(), 725.0);
    assert_eq!(shared.mode(), Mode::auto(SystemState::Heat));
    println!("  ✅ {} cycles, final setpoint {}", cycles, shared.setpoint());
}

#[test]
fn test_edge_raises_coalesce() {
    let shared = Arc::new(SharedState::default());
    let press = setpoint_press(AdjustDirection::Decrease, NormalState::Gnd);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    handle_setpoint_edge(&shared, &press);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // 800 raises, one consumer sees one event
    assert!(shared.take_edge());
    assert!(!shared.take_edge());
    assert_eq!(shared.setpoint(), 25.0 - 400.0);
}

#[test]
fn test_mode_reads_never_torn() {
    let shared = Arc::new(SharedState::default());
    let modes = [
        Mode::fan_on(),
        Mode::auto(SystemState::Cool),
        Mode::auto(SystemState::Off),
        Mode::auto(SystemState::Heat),
    ];

    let writer = {
        let shared = shared.clone();
        thread::spawn(move || {
            for i in 0..10_000 {
                shared.publish_mode(modes[i % modes.len()]);
            }
        })
    };

    for _ in 0..10_000 {
        let mode = shared.mode();
        assert!(modes.contains(&mode));
    }
    writer.join().unwrap();
}

#[test]
fn test_tick_clock_never_loses_ticks() {
    // Start just below the 32-bit carry so readers see it happen
    let start = u32::MAX as u64 - 20_000;
    let clock = Arc::new(TickClock::starting_at(start));
    let fired = Arc::new(std::sync::atomic::AtomicU32::new(0));

    let tickers: Vec<_> = (0..4)
        .map(|_| {
            let clock = clock.clone();
            let fired = fired.clone();
            thread::spawn(move || {
                for _ in 0..10_000 {
                    if clock.advance() {
                        fired.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        })
        .collect();

    let mut last = clock.now();
    let mut armed = 0u32;
    while tickers.iter().any(|t| !t.is_finished()) {
        let now = clock.now();
        assert!(now >= last, "clock went backwards: {} -> {}", last, now);
        last = now;
        if !clock.is_armed() && clock.arm(now + 50) {
            armed += 1;
        }
    }
    for handle in tickers {
        handle.join().unwrap();
    }

    assert_eq!(clock.now(), start + 40_000);
    // Every deadline fired at most once; a pending one may remain armed
    let fired = fired.load(Ordering::Relaxed);
    assert!(fired <= armed);
    assert!(armed - fired <= 1);
}
