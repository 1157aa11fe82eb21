//! Tests for the Lakeshore 336 driver.

use rstest::*;

use benchrs::{InstrumentError, LoopbackInterface};
use measurements::Temperature;

use lakeshore_336::*;

// Type alias for the loopback interface with the Lakeshore336 driver.
type Lakeshore336Lbk = Lakeshore336<LoopbackInterface>;

/// Function that creates a new Lakeshore336 instance with the given input
/// and output commands.
fn crt_inst(host2inst: Vec<&str>, inst2host: Vec<&str>) -> Lakeshore336Lbk {
    let term = "\r\n";
    let h2i: Vec<String> = host2inst.iter().map(|s| s.to_string()).collect();
    let i2h: Vec<String> = inst2host.iter().map(|s| s.to_string()).collect();
    let interface = LoopbackInterface::new(h2i, i2h, term);
    Lakeshore336::try_new(interface).unwrap()
}

#[fixture]
fn emp_inst() -> Lakeshore336Lbk {
    crt_inst(vec![], vec![])
}

/// Empty initialization should always pass.
#[rstest]
fn test_initialization(_emp_inst: Lakeshore336Lbk) {}

/// Get the name from the instrument.
#[rstest]
fn test_get_name() {
    let mut inst = crt_inst(vec!["*IDN?"], vec!["LSCI,MODEL336,12345678/12345678,2.9"]);
    let name = inst.get_name().unwrap();
    assert_eq!(name, "LSCI,MODEL336,12345678/12345678,2.9");
}

#[rstest]
fn test_all_heaters_off() {
    let mut inst = crt_inst(vec!["ALLOFF"], vec![]);
    inst.all_heaters_off().unwrap();
}

/// Get temperature for the four channels.
#[rstest]
#[case(0, "A")]
#[case(1, "B")]
#[case(2, "C")]
#[case(3, "D")]
fn test_channel_get_temperature(#[case] ch_num: usize, #[case] ch_id: &str) {
    let mut inst = crt_inst(vec![&format!("KRDG? {ch_id}")], vec!["+273.150"]);
    let mut ch = inst.get_channel(ch_num).unwrap();
    let temp = ch.get_temperature().unwrap();
    assert_eq!(temp.as_kelvin(), 273.15);
}

/// Return a sensor error if the reading is zero kelvin.
#[rstest]
fn test_channel_get_temperature_sensor_error() {
    let mut inst = crt_inst(vec!["KRDG? A"], vec!["+0.000"]);
    let mut ch = inst.get_channel(0).unwrap();
    assert!(matches!(
        ch.get_temperature(),
        Err(InstrumentError::SensorError(_))
    ));
}

#[rstest]
fn test_channel_get_temperature_garbage() {
    let mut inst = crt_inst(vec!["KRDG? B"], vec!["OVER"]);
    let mut ch = inst.get_channel(1).unwrap();
    assert!(matches!(
        ch.get_temperature(),
        Err(InstrumentError::ResponseParseError(_))
    ));
}

#[rstest]
fn test_channel_get_sensor_reading() {
    let mut inst = crt_inst(vec!["SRDG? D"], vec!["+1234.56"]);
    let mut ch = inst.get_channel(3).unwrap();
    assert_eq!(ch.name(), 'D');
    assert_eq!(ch.get_sensor_reading().unwrap(), 1234.56);
}

#[rstest]
fn test_channel_out_of_range(mut emp_inst: Lakeshore336Lbk) {
    assert!(matches!(
        emp_inst.get_channel(4),
        Err(InstrumentError::ChannelIndexOutOfRange {
            idx: 4,
            nof_channels: 4
        })
    ));
    assert!(emp_inst.get_loop(2).is_err());
}

#[rstest]
#[case(0, "1")]
#[case(1, "2")]
fn test_loop_setpoint(#[case] idx: usize, #[case] out: &str) {
    let mut inst = crt_inst(
        vec![&format!("SETP {out},4.2000"), &format!("SETP? {out}")],
        vec!["+4.2000"],
    );
    let mut lp = inst.get_loop(idx).unwrap();
    lp.set_setpoint(Temperature::from_kelvin(4.2)).unwrap();
    assert_eq!(lp.get_setpoint().unwrap().as_kelvin(), 4.2);
}

#[rstest]
fn test_loop_setpoint_out_of_range(mut emp_inst: Lakeshore336Lbk) {
    let mut lp = emp_inst.get_loop(0).unwrap();
    assert!(lp.set_setpoint(Temperature::from_kelvin(1600.0)).is_err());
}

#[rstest]
#[case(HeaterRange::Off, "0")]
#[case(HeaterRange::Low, "1")]
#[case(HeaterRange::Medium, "2")]
#[case(HeaterRange::High, "3")]
fn test_loop_heater_range(#[case] range: HeaterRange, #[case] val: &str) {
    let mut inst = crt_inst(vec![&format!("RANGE 2,{val}"), "RANGE? 2"], vec![val]);
    let mut lp = inst.get_loop(1).unwrap();
    lp.set_heater_range(range).unwrap();
    assert_eq!(lp.get_heater_range().unwrap(), range);
}

#[rstest]
fn test_loop_heater_output() {
    let mut inst = crt_inst(vec!["HTR? 1"], vec!["+056.3"]);
    let mut lp = inst.get_loop(0).unwrap();
    assert_eq!(lp.get_heater_output().unwrap(), 56.3);
}

#[rstest]
fn test_loop_ramp() {
    let mut inst = crt_inst(vec!["RAMP 1,1,0.500", "RAMP? 1"], vec!["1,+0.500"]);
    let mut lp = inst.get_loop(0).unwrap();
    lp.set_ramp(Ramp {
        enabled: true,
        rate_k_per_min: 0.5,
    })
    .unwrap();
    let ramp = lp.get_ramp().unwrap();
    assert!(ramp.enabled);
    assert_eq!(ramp.rate_k_per_min, 0.5);
}

#[rstest]
fn test_loop_ramp_rate_out_of_range(mut emp_inst: Lakeshore336Lbk) {
    let mut lp = emp_inst.get_loop(0).unwrap();
    let ramp = Ramp {
        enabled: true,
        rate_k_per_min: 101.0,
    };
    assert!(lp.set_ramp(ramp).is_err());
}

#[rstest]
#[case("0", false)]
#[case("1", true)]
fn test_loop_is_ramping(#[case] resp: &str, #[case] exp: bool) {
    let mut inst = crt_inst(vec!["RAMPST? 2"], vec![resp]);
    let mut lp = inst.get_loop(1).unwrap();
    assert_eq!(lp.is_ramping().unwrap(), exp);
}

/// Ensure cloning an instrument, a channel, and a loop works correctly.
#[rstest]
fn test_cloning(mut emp_inst: Lakeshore336Lbk) {
    let _ = emp_inst.clone();
    let ch_c = emp_inst.get_channel(2).unwrap();
    let _ = ch_c.clone();
    let lp = emp_inst.get_loop(1).unwrap();
    let _ = lp.clone();
}
