//! Tests for the attocube ANC300 driver.

use std::time::Duration;

use rstest::*;

use benchrs::{InstrumentError, LoopbackInterface};
use measurements::{Frequency, Voltage};

use attocube_anc300::*;

type Anc300Lbk = Anc300<LoopbackInterface>;

fn crt_inst(host2inst: Vec<&str>, inst2host: Vec<&str>) -> Anc300Lbk {
    let term = "\r\n";
    let h2i: Vec<String> = host2inst.iter().map(|s| s.to_string()).collect();
    let i2h: Vec<String> = inst2host.iter().map(|s| s.to_string()).collect();
    let interface = LoopbackInterface::new(h2i, i2h, term);
    Anc300::try_new(interface).unwrap()
}

#[fixture]
fn emp_inst() -> Anc300Lbk {
    crt_inst(vec![], vec![])
}

#[rstest]
fn test_initialization(_emp_inst: Anc300Lbk) {}

#[rstest]
fn test_authenticate() {
    let mut inst = crt_inst(
        vec!["123456", "echo off"],
        vec![
            "Authorization code: ",
            "Authorization success",
            "echo off",
            "OK",
        ],
    );
    inst.authenticate("123456").unwrap();
}

#[rstest]
fn test_authenticate_failed() {
    let mut inst = crt_inst(vec!["wrong"], vec!["Authorization failed"]);
    assert!(matches!(
        inst.authenticate("wrong"),
        Err(InstrumentError::InstrumentStatus(_))
    ));
}

#[rstest]
fn test_get_name() {
    let mut inst = crt_inst(
        vec!["ver"],
        vec!["attocube ANC300 controller version 1.1.0-1304", "OK"],
    );
    assert_eq!(
        inst.get_name().unwrap(),
        "attocube ANC300 controller version 1.1.0-1304"
    );
}

#[rstest]
fn test_axis_out_of_range(mut emp_inst: Anc300Lbk) {
    assert!(matches!(
        emp_inst.get_axis(7),
        Err(InstrumentError::ChannelIndexOutOfRange {
            idx: 7,
            nof_channels: 7
        })
    ));
}

#[rstest]
#[case(Mode::Ground, "gnd")]
#[case(Mode::Step, "stp")]
#[case(Mode::Offset, "off")]
#[case(Mode::StepOffset, "stp+")]
#[case(Mode::Capacitance, "cap")]
fn test_mode(#[case] mode: Mode, #[case] name: &str) {
    let setm = format!("setm 2 {name}");
    let resp = format!("mode = {name}");
    let mut inst = crt_inst(vec![&setm, "getm 2"], vec!["OK", &resp, "OK"]);
    let mut ax = inst.get_axis(1).unwrap();
    ax.set_mode(mode).unwrap();
    assert_eq!(ax.get_mode().unwrap(), mode);
}

#[rstest]
fn test_error_reply() {
    let mut inst = crt_inst(
        vec!["setm 3 stp"],
        vec!["Axis in wrong mode", "ERROR"],
    );
    let mut ax = inst.get_axis(2).unwrap();
    match ax.set_mode(Mode::Step) {
        Err(InstrumentError::InstrumentStatus(msg)) => assert_eq!(msg, "Axis in wrong mode"),
        other => panic!("Unexpected result: {other:?}"),
    }
}

#[rstest]
fn test_frequency() {
    let mut inst = crt_inst(
        vec!["setf 1 200", "getf 1"],
        vec!["OK", "frequency = 200 Hz", "OK"],
    );
    let mut ax = inst.get_axis(0).unwrap();
    ax.set_frequency(Frequency::from_hertz(200.0)).unwrap();
    assert_eq!(ax.get_frequency().unwrap().as_hertz(), 200.0);
}

#[rstest]
fn test_frequency_out_of_range(mut emp_inst: Anc300Lbk) {
    let mut ax = emp_inst.get_axis(0).unwrap();
    assert!(ax.set_frequency(Frequency::from_hertz(20_000.0)).is_err());
}

#[rstest]
fn test_voltage() {
    let mut inst = crt_inst(
        vec!["setv 1 30", "getv 1", "seta 1 12.5", "geta 1"],
        vec![
            "OK",
            "voltage = 30.000000 V",
            "OK",
            "OK",
            "voltage = 12.500000 V",
            "OK",
        ],
    );
    let mut ax = inst.get_axis(0).unwrap();
    ax.set_voltage(Voltage::from_volts(30.0)).unwrap();
    assert_eq!(ax.get_voltage().unwrap().as_volts(), 30.0);
    ax.set_offset_voltage(Voltage::from_volts(12.5)).unwrap();
    assert_eq!(ax.get_offset_voltage().unwrap().as_volts(), 12.5);
}

#[rstest]
fn test_voltage_out_of_range(mut emp_inst: Anc300Lbk) {
    let mut ax = emp_inst.get_axis(0).unwrap();
    assert!(ax.set_voltage(Voltage::from_volts(151.0)).is_err());
    assert!(ax.set_offset_voltage(Voltage::from_volts(-1.0)).is_err());
}

#[rstest]
fn test_step_wait_stop() {
    let mut inst = crt_inst(
        vec!["stepu 1 100", "stepd 1 5", "stepw 1", "stop 1"],
        vec!["OK", "OK", "OK", "OK"],
    );
    let mut ax = inst.get_axis(0).unwrap();
    ax.step(Direction::Up, 100).unwrap();
    ax.step(Direction::Down, 5).unwrap();
    ax.wait_steps(Duration::from_secs(1)).unwrap();
    ax.stop().unwrap();
}

#[rstest]
fn test_step_zero(mut emp_inst: Anc300Lbk) {
    let mut ax = emp_inst.get_axis(0).unwrap();
    assert!(ax.step(Direction::Up, 0).is_err());
}

#[rstest]
fn test_capacitance() {
    let mut inst = crt_inst(
        vec!["setm 1 cap", "capw 1", "getc 1"],
        vec!["OK", "OK", "capacitance = 1071.6 nF", "OK"],
    );
    let mut ax = inst.get_axis(0).unwrap();
    let cap = ax.get_capacitance().unwrap();
    assert!((cap - 1071.6e-9).abs() < 1e-15);
}

#[rstest]
fn test_echo_is_skipped() {
    let mut inst = crt_inst(vec!["getf 4"], vec!["getf 4", "frequency = 1000 Hz", "OK"]);
    let mut ax = inst.get_axis(3).unwrap();
    assert_eq!(ax.get_frequency().unwrap().as_hertz(), 1000.0);
}
