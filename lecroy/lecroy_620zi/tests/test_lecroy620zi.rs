//! Tests for the LeCroy 620Zi driver.

use std::time::Duration;

use rstest::*;

use benchrs::{InstrumentError, LoopbackInterface};
use measurements::Voltage;

use lecroy_620zi::*;

type Lecroy620ZiLbk = Lecroy620Zi<LoopbackInterface>;

/// Create a scope. The header command sent on creation is prepended to `host2inst`.
fn crt_inst(host2inst: Vec<&str>, inst2host: Vec<&str>) -> Lecroy620ZiLbk {
    let term = "\n";
    let mut h2i: Vec<String> = vec!["COMM_HEADER OFF".to_string()];
    h2i.extend(host2inst.iter().map(|s| s.to_string()));
    let i2h: Vec<String> = inst2host.iter().map(|s| s.to_string()).collect();
    let interface = LoopbackInterface::new(h2i, i2h, term);
    Lecroy620Zi::try_new(interface).unwrap()
}

#[fixture]
fn emp_inst() -> Lecroy620ZiLbk {
    crt_inst(vec![], vec![])
}

#[rstest]
fn test_initialization(_emp_inst: Lecroy620ZiLbk) {}

#[rstest]
fn test_get_name() {
    let mut inst = crt_inst(vec!["*IDN?"], vec!["LECROY,WR620ZI,LCRY1234N56789,7.9.0"]);
    assert_eq!(
        inst.get_name().unwrap(),
        "LECROY,WR620ZI,LCRY1234N56789,7.9.0"
    );
}

#[rstest]
fn test_channel_out_of_range(mut emp_inst: Lecroy620ZiLbk) {
    assert!(matches!(
        emp_inst.get_channel(4),
        Err(InstrumentError::ChannelIndexOutOfRange {
            idx: 4,
            nof_channels: 4
        })
    ));
}

#[rstest]
#[case(0, "C1")]
#[case(3, "C4")]
fn test_vertical_scale(#[case] idx: usize, #[case] name: &str) {
    let mut inst = crt_inst(
        vec![&format!("{name}:VOLT_DIV 0.05"), &format!("{name}:VOLT_DIV?")],
        vec!["5.00E-02"],
    );
    let mut ch = inst.get_channel(idx).unwrap();
    assert_eq!(ch.name(), name);
    ch.set_vertical_scale(Voltage::from_volts(0.05)).unwrap();
    assert_eq!(ch.get_vertical_scale().unwrap().as_volts(), 0.05);
}

#[rstest]
fn test_vertical_scale_out_of_range(mut emp_inst: Lecroy620ZiLbk) {
    let mut ch = emp_inst.get_channel(0).unwrap();
    assert!(ch.set_vertical_scale(Voltage::from_volts(20.0)).is_err());
}

#[rstest]
fn test_vertical_offset() {
    let mut inst = crt_inst(vec!["C2:OFFSET -0.1", "C2:OFFSET?"], vec!["-1.00E-01"]);
    let mut ch = inst.get_channel(1).unwrap();
    ch.set_vertical_offset(Voltage::from_volts(-0.1)).unwrap();
    assert_eq!(ch.get_vertical_offset().unwrap().as_volts(), -0.1);
}

#[rstest]
fn test_get_waveform() {
    let mut inst = crt_inst(
        vec![
            "C1:INSPECT? HORIZ_INTERVAL",
            "C1:INSPECT? HORIZ_OFFSET",
            "C1:INSPECT? SIMPLE",
        ],
        vec![
            "\"HORIZ_INTERVAL     : 5.0000e-01          \"",
            "\"HORIZ_OFFSET       : -1.0000e+00         \"",
            "\"  1.0e-01  2.0e-01",
            "  3.0e-01",
            "\"",
        ],
    );
    let mut ch = inst.get_channel(0).unwrap();
    let wf = ch.get_waveform().unwrap();
    assert_eq!(wf.voltage, vec![0.1, 0.2, 0.3]);
    assert_eq!(wf.time, vec![-1.0, -0.5, 0.0]);
}

#[rstest]
fn test_horizontal_scale() {
    let mut inst = crt_inst(vec!["TIME_DIV 1e-6", "TIME_DIV?"], vec!["1.00E-06"]);
    inst.set_horizontal_scale(1e-6).unwrap();
    assert_eq!(inst.get_horizontal_scale().unwrap(), 1e-6);
}

#[rstest]
#[case(TriggerMode::Auto, "AUTO")]
#[case(TriggerMode::Normal, "NORM")]
#[case(TriggerMode::Single, "SINGLE")]
#[case(TriggerMode::Stop, "STOP")]
fn test_trigger_mode(#[case] mode: TriggerMode, #[case] cmd: &str) {
    let mut inst = crt_inst(vec![&format!("TRIG_MODE {cmd}"), "TRIG_MODE?"], vec![cmd]);
    inst.set_trigger_mode(mode).unwrap();
    assert_eq!(inst.get_trigger_mode().unwrap(), mode);
}

#[rstest]
fn test_trigger_source_and_level() {
    let mut inst = crt_inst(vec!["TRIG_SELECT EDGE,SR,C2", "C2:TRIG_LEVEL 0.15"], vec![]);
    inst.set_trigger_source(1).unwrap();
    inst.set_trigger_level(1, Voltage::from_volts(0.15)).unwrap();
    assert!(inst.set_trigger_level(4, Voltage::from_volts(0.1)).is_err());
}

#[rstest]
fn test_clear_sweeps() {
    let mut inst = crt_inst(vec!["CLEAR_SWEEPS"], vec![]);
    inst.clear_sweeps().unwrap();
}

#[rstest]
fn test_parameter_value_and_mean() {
    let mut inst = crt_inst(
        vec![
            "VBS? 'return=app.Measure.P1.Out.Result.Value'",
            "VBS? 'return=app.Measure.P1.Mean.Result.Value'",
        ],
        vec!["0.123", "0.120"],
    );
    assert_eq!(inst.get_parameter_value(1).unwrap(), 0.123);
    assert_eq!(inst.get_parameter_mean(1).unwrap(), 0.120);
}

#[rstest]
#[case(0)]
#[case(9)]
fn test_parameter_out_of_range(mut emp_inst: Lecroy620ZiLbk, #[case] p: u8) {
    assert!(matches!(
        emp_inst.get_parameter_value(p),
        Err(InstrumentError::IntValueOutOfRange { .. })
    ));
}

#[rstest]
fn test_parameter_no_data() {
    let mut inst = crt_inst(
        vec!["VBS? 'return=app.Measure.P3.Out.Result.Value'"],
        vec!["No Data Available"],
    );
    assert!(matches!(
        inst.get_parameter_value(3),
        Err(InstrumentError::ResponseParseError(_))
    ));
}

#[rstest]
fn test_wait_for_sweeps() {
    let num = "VBS? 'return=app.Measure.P2.Num.Result.Value'";
    let mut inst = crt_inst(vec![num, num, num], vec!["10", "60", "120"]);
    let sweeps = inst
        .wait_for_sweeps(2, 100, Duration::from_millis(1), Duration::from_secs(5))
        .unwrap();
    assert_eq!(sweeps, 120);
}

#[rstest]
fn test_wait_for_sweeps_timeout() {
    let num = "VBS? 'return=app.Measure.P2.Num.Result.Value'";
    let mut inst = crt_inst(vec![num], vec!["10"]);
    assert!(matches!(
        inst.wait_for_sweeps(2, 100, Duration::from_millis(1), Duration::ZERO),
        Err(InstrumentError::Timeout(_))
    ));
}

#[rstest]
fn test_get_parameter_values() {
    let value = "VBS? 'return=app.Measure.P1.Out.Result.Value'";
    let mut inst = crt_inst(
        vec![
            "ARM", "WAIT 2", "*OPC?", value, "ARM", "WAIT 2", "*OPC?", value,
        ],
        vec!["1", "0.51", "1", "0.49"],
    );
    let values = inst
        .get_parameter_values(1, 2, Duration::from_secs(2))
        .unwrap();
    assert_eq!(values, vec![0.51, 0.49]);
}

#[rstest]
fn test_cloning(mut emp_inst: Lecroy620ZiLbk) {
    let _ = emp_inst.clone();
    let _ = emp_inst.get_channel(0).unwrap().clone();
}
