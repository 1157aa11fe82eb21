//! Tests for the network analyzer routines.

mod common;

use rstest::*;

use keysight_e5071c::{Format, SParameter};
use snspd_bench::{thermal::StabilizeSettings, vna::*};

use common::*;

#[fixture]
fn vna_settings() -> VnaSettings {
    VnaSettings {
        points: 11,
        sweep_timeout_s: 1.0,
        ..VnaSettings::default()
    }
}

#[rstest]
fn test_vna_spectroscopy(vna_settings: VnaSettings) {
    let log = event_log();
    let mut vna = FakeVna {
        log: log.clone(),
        points: 0,
        level: -3.0,
    };

    let trace = vna_spectroscopy(&mut vna, &vna_settings).unwrap();
    let table = trace_table(&trace).unwrap();

    assert_eq!(table.len(), 11);
    assert_eq!(table.column("primary").unwrap()[5], -3.0);
    assert_eq!(*log.borrow(), vec!["configure 11", "measure"]);
}

#[rstest]
fn test_vna_vs_temperature(vna_settings: VnaSettings) {
    let log = event_log();
    let mut vna = FakeVna {
        log: log.clone(),
        points: 0,
        level: -10.0,
    };
    let mut ctrl = FollowingController {
        log: log.clone(),
        setpoint: 0.0,
    };
    let stabilize = StabilizeSettings {
        tolerance_k: 0.01,
        settle_s: 0.0,
        poll_s: 0.0,
        timeout_s: 1.0,
    };

    let traces =
        vna_vs_temperature(&mut vna, &mut ctrl, &[4.0, 8.0], &vna_settings, &stabilize).unwrap();

    assert_eq!(traces.len(), 2);
    assert_eq!(traces[1].temperature, 8.0);
    assert_eq!(
        *log.borrow(),
        vec![
            "configure 11",
            "setpoint 4",
            "heating on",
            "measure",
            "setpoint 8",
            "heating on",
            "measure",
            "heating off"
        ]
    );

    let table = temperature_trace_table(&traces).unwrap();
    assert_eq!(table.len(), 22);
    assert_eq!(table.rows()[11][..2], [8.0, 8.0]);
}

#[rstest]
#[case(VnaParameter::S11, SParameter::S11)]
#[case(VnaParameter::S21, SParameter::S21)]
fn test_parameter_mapping(#[case] param: VnaParameter, #[case] exp: SParameter) {
    assert_eq!(SParameter::from(param), exp);
}

#[rstest]
fn test_format_mapping() {
    assert_eq!(Format::from(VnaFormat::UnwrappedPhase), Format::UnwrappedPhase);
    assert_eq!(Format::from(VnaFormat::Smith), Format::Smith);
}
