//! Output decision table and mode decoding

use hvac_core::inputs::{decode, Decoded};
use hvac_core::test_utils::snapshot_for;
use hvac_core::{decide, Facet, InputSnapshot, Mode, NormalState, OutputDecision, SystemState};
use rstest::rstest;

const fn out(fan: bool, heat: bool, cool: bool, idle: bool) -> OutputDecision {
    OutputDecision { fan, heat, cool, idle }
}

#[rstest]
#[case::fan_on_cold(Mode::fan_on(), 10.0, 25.0, out(true, false, false, false))]
#[case::fan_on_hot(Mode::fan_on(), 40.0, 25.0, out(true, false, false, false))]
#[case::off_cold(Mode::auto(SystemState::Off), 10.0, 25.0, out(false, false, false, true))]
#[case::off_hot(Mode::auto(SystemState::Off), 40.0, 25.0, out(false, false, false, true))]
#[case::heat_below(Mode::auto(SystemState::Heat), 18.0, 25.0, out(true, true, false, false))]
#[case::heat_equal(Mode::auto(SystemState::Heat), 25.0, 25.0, out(false, true, false, false))]
#[case::heat_above(Mode::auto(SystemState::Heat), 26.0, 25.0, out(false, true, false, false))]
#[case::cool_above(Mode::auto(SystemState::Cool), 26.0, 25.0, out(true, false, true, false))]
#[case::cool_equal(Mode::auto(SystemState::Cool), 25.0, 25.0, out(false, false, true, false))]
#[case::cool_below(Mode::auto(SystemState::Cool), 18.0, 25.0, out(false, false, true, false))]
fn test_decision_table(
    #[case] mode: Mode,
    #[case] temperature: f32,
    #[case] setpoint: f32,
    #[case] expected: OutputDecision,
) {
    assert_eq!(decide(mode, temperature, setpoint), expected);
}

#[rstest]
fn test_heat_and_cool_never_both(
    #[values(Mode::fan_on(), Mode::auto(SystemState::Cool), Mode::auto(SystemState::Off), Mode::auto(SystemState::Heat))]
    mode: Mode,
    #[values(-10.0, 24.5, 25.0, 25.5, 60.0)] temperature: f32,
) {
    let decision = decide(mode, temperature, 25.0);
    assert!(!(decision.heat && decision.cool));
    assert_eq!(decision.idle, mode == Mode::auto(SystemState::Off));
}

#[rstest]
#[case::gnd(NormalState::Gnd)]
#[case::vcc(NormalState::Vcc)]
fn test_snapshot_for_decodes_back(#[case] normal: NormalState) {
    for mode in [
        Mode::fan_on(),
        Mode::auto(SystemState::Cool),
        Mode::auto(SystemState::Off),
        Mode::auto(SystemState::Heat),
    ] {
        let snapshot = snapshot_for(mode, normal);
        assert_eq!(decode(&snapshot, normal).mode(), Some(mode));
    }
}

#[rstest]
#[case::nothing(false, false, false, false, false, Decoded::Unchanged)]
#[case::fan_on_beats_auto(true, true, false, false, true, Decoded::FanOn)]
#[case::cool_beats_off(false, true, true, true, false, Decoded::Auto(Some(Facet::Cool)))]
#[case::off_beats_heat(false, true, false, true, true, Decoded::Auto(Some(Facet::Off)))]
#[case::heat_alone(false, true, false, false, true, Decoded::Auto(Some(Facet::Heat)))]
#[case::auto_without_system(false, true, false, false, false, Decoded::Auto(None))]
#[case::system_without_fan(false, false, true, false, true, Decoded::Unchanged)]
fn test_decode_priority_gnd(
    #[case] fan_on: bool,
    #[case] fan_auto: bool,
    #[case] cool: bool,
    #[case] off: bool,
    #[case] heat: bool,
    #[case] expected: Decoded,
) {
    // Idle-low wiring: pressed reads high
    let snapshot = InputSnapshot {
        temp_plus: true,
        temp_minus: true,
        fan_on,
        fan_auto,
        system_cool: cool,
        system_off: off,
        system_heat: heat,
    };
    assert_eq!(decode(&snapshot, NormalState::Gnd), expected);
}

#[test]
fn test_auto_without_system_means_off() {
    assert_eq!(Decoded::Auto(None).mode(), Some(Mode::auto(SystemState::Off)));
    assert_eq!(Decoded::Unchanged.mode(), None);
}
