//! Tests for temperature stabilization and scans.

mod common;

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use measurements::Temperature;
use rstest::*;

use snspd_bench::{BenchError, thermal::*};

use common::*;

fn settings(settle_s: f64, timeout_s: f64) -> StabilizeSettings {
    StabilizeSettings {
        tolerance_k: 0.05,
        settle_s,
        poll_s: 0.0,
        timeout_s,
    }
}

fn controller(readings: Vec<f64>) -> (FakeController, EventLog) {
    let log = event_log();
    let ctrl = FakeController {
        log: log.clone(),
        readings: VecDeque::from(readings),
    };
    (ctrl, log)
}

#[rstest]
fn test_wait_for_temperature_approaches() {
    let (mut ctrl, log) = controller(vec![5.0, 4.5, 4.02, 4.01]);

    let t = wait_for_temperature(&mut ctrl, Temperature::from_kelvin(4.0), &settings(0.0, 10.0))
        .unwrap();

    assert_eq!(t, 4.02);
    assert_eq!(*log.borrow(), vec!["read 5", "read 4.5", "read 4.02"]);
}

#[rstest]
fn test_wait_for_temperature_settles() {
    let (mut ctrl, _log) = controller(vec![4.0]);

    let tic = Instant::now();
    wait_for_temperature(&mut ctrl, Temperature::from_kelvin(4.0), &settings(0.05, 10.0))
        .unwrap();
    assert!(tic.elapsed() >= Duration::from_millis(50));
}

#[rstest]
fn test_wait_for_temperature_timeout() {
    let (mut ctrl, _log) = controller(vec![5.0]);

    let err = wait_for_temperature(&mut ctrl, Temperature::from_kelvin(4.0), &settings(0.0, 0.0))
        .unwrap_err();

    match err {
        BenchError::TemperatureNotReached { target, last, .. } => {
            assert_eq!(target, 4.0);
            assert_eq!(last, 5.0);
        }
        e => panic!("Unexpected error: {e}"),
    }
}

#[rstest]
fn test_ramp_to_sets_setpoint_first() {
    let (mut ctrl, log) = controller(vec![10.0]);

    ramp_to(&mut ctrl, Temperature::from_kelvin(10.0), &settings(0.0, 1.0)).unwrap();
    assert_eq!(*log.borrow(), vec!["setpoint 10", "heating on", "read 10"]);
}

#[rstest]
fn test_temperature_scan() {
    let log = event_log();
    let mut ctrl = FollowingController {
        log: log.clone(),
        setpoint: 0.0,
    };

    let points = temperature_scan(&mut ctrl, &[4.0, 6.0], &settings(0.0, 1.0), |t| {
        Ok(vec![t * 2.0])
    })
    .unwrap();

    assert_eq!(points.len(), 2);
    assert_eq!(points[1].setpoint, 6.0);
    assert_eq!(points[1].temperature, 6.0);
    assert_eq!(points[1].values, vec![12.0]);
    assert_eq!(
        *log.borrow(),
        vec![
            "setpoint 4",
            "heating on",
            "setpoint 6",
            "heating on",
            "heating off"
        ]
    );
}

#[rstest]
fn test_temperature_scan_stops_on_measurement_error() {
    let log = event_log();
    let mut ctrl = FollowingController {
        log: log.clone(),
        setpoint: 0.0,
    };

    let res = temperature_scan(&mut ctrl, &[4.0, 6.0, 8.0], &settings(0.0, 1.0), |t| {
        if t > 5.0 {
            Err(BenchError::InvalidSweep("too warm".to_string()))
        } else {
            Ok(vec![])
        }
    });

    assert!(res.is_err());
    // The heater is switched off even though the scan failed.
    assert_eq!(
        *log.borrow(),
        vec![
            "setpoint 4",
            "heating on",
            "setpoint 6",
            "heating on",
            "heating off"
        ]
    );
}

#[rstest]
fn test_heating_off_after_timeout() {
    let (mut ctrl, log) = controller(vec![5.0]);

    let res = heating_off_after(&mut ctrl, |ctrl| {
        ramp_to(ctrl, Temperature::from_kelvin(4.0), &settings(0.0, 0.0))
    });

    assert!(matches!(
        res,
        Err(BenchError::TemperatureNotReached { .. })
    ));
    assert_eq!(
        *log.borrow(),
        vec!["setpoint 4", "heating on", "read 5", "heating off"]
    );
}
