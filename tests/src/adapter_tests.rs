//! embedded-hal adapters against scripted pins, and heartbeat timing on the
//! embassy mock clock

use embedded_hal_mock::eh1::pin::{Mock as PinMock, State, Transaction as PinTransaction};
use hvac_core::hal::mock::{MockIndicator, MockModulation};
use hvac_core::{
    AdcMirror, ButtonBank, EmbeddedHalButtons, EmbeddedHalIndicator, HalError, Heartbeat,
    HeartbeatError, IndicatorOutput, Instant, NormalState, PotChannel, STALE_POT_READS,
};
use hvac_core::inputs::{decode, Decoded};

fn pin(level: State) -> PinMock {
    PinMock::new(&[PinTransaction::get(level)])
}

#[test]
fn test_buttons_read_every_line_once() {
    // temp+, temp-, fan on, fan auto, cool, off, heat
    let pins = [
        pin(State::High),
        pin(State::High),
        pin(State::Low),
        pin(State::High),
        pin(State::Low),
        pin(State::Low),
        pin(State::High),
    ];
    let mut buttons = EmbeddedHalButtons::new(pins);

    let snapshot = buttons.read_snapshot().unwrap();
    assert_eq!(
        decode(&snapshot, NormalState::Gnd),
        Decoded::Auto(Some(hvac_core::Facet::Heat))
    );
    assert!(snapshot.temp_plus && snapshot.temp_minus);

    for mut pin in buttons.release() {
        pin.done();
    }
}

#[test]
fn test_inverted_indicator_drives_low_when_lit() {
    let expectations = [
        PinTransaction::set(State::Low),
        PinTransaction::set(State::High),
        PinTransaction::set(State::Low),
    ];
    let mut led = EmbeddedHalIndicator::new(PinMock::new(&expectations), true);

    led.set_state(true).unwrap();
    led.set_state(false).unwrap();
    led.toggle().unwrap();
    assert!(led.get_state().unwrap());

    led.release().done();
}

#[test]
fn test_heartbeat_schedule_on_mock_clock() {
    let driver = embassy_time::MockDriver::get();
    let start = Instant::now();

    let mut channel = MockModulation::new(0);
    let mut led = EmbeddedHalIndicator::new(
        PinMock::new(&[
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ]),
        false,
    );
    let mut heartbeat = Heartbeat::new();

    // Two fast half-periods, then two slow ones
    for sample in [0u16, 0, 400, 400] {
        channel.set_sample(sample);
        let period = heartbeat.step(&mut channel, &mut led).unwrap();
        driver.advance(period);
    }

    // 2 * 15000 + 2 * 25000
    assert_eq!(Instant::now().duration_since(start).as_micros(), 80_000);
    assert_eq!(channel.start_calls(), 1);
    led.release().done();
}

#[test]
fn test_heartbeat_stops_when_adc_goes_silent() {
    println!("💔 ADC stops converting under the heartbeat");
    let adc = AdcMirror::new();
    let mut channel = PotChannel(&adc);
    let mut led = MockIndicator::new();
    let mut heartbeat = Heartbeat::new();

    // Boot: no conversion yet, sample reads as 0
    assert_eq!(heartbeat.step(&mut channel, &mut led).unwrap().as_micros(), 15_000);

    // One conversion per input period keeps the heartbeat alive
    for _ in 0..10 {
        adc.on_pot_conversion(400);
        assert_eq!(heartbeat.step(&mut channel, &mut led).unwrap().as_micros(), 25_000);
    }

    for _ in 1..STALE_POT_READS {
        assert!(heartbeat.step(&mut channel, &mut led).is_ok());
    }
    assert_eq!(
        heartbeat.step(&mut channel, &mut led),
        Err(HeartbeatError::SampleUnavailable(HalError::AdcError))
    );
}
