//! Tests for the serpentine raster scan.

mod common;

use std::collections::VecDeque;

use rstest::*;

use snspd_bench::raster::*;

use common::*;

fn settings(nx: usize, ny: usize) -> RasterSettings {
    RasterSettings {
        nx,
        ny,
        step_x: 10,
        step_y: 5,
        gate_s: 0.1,
        settle_s: 0.0,
    }
}

#[rstest]
fn test_raster_serpentine() {
    let log = event_log();
    let mut x = FakeAxis::new(&log, "x");
    let mut y = FakeAxis::new(&log, "y");
    let mut counter = FakeCounter {
        log: log.clone(),
        rates: (1..=6).map(f64::from).collect(),
    };

    let grid = raster_scan(&mut x, &mut y, &mut counter, &settings(3, 2)).unwrap();

    assert_eq!(grid.counts, vec![vec![1.0, 2.0, 3.0], vec![6.0, 5.0, 4.0]]);
    let moves: Vec<String> = log
        .borrow()
        .iter()
        .filter(|e| !e.starts_with("count"))
        .cloned()
        .collect();
    // Second row runs backwards and ends above the start, so only y moves back.
    assert_eq!(moves, vec!["x 10", "x 10", "y 5", "x -10", "x -10", "y -5"]);
}

#[rstest]
fn test_raster_returns_to_origin_on_failure() {
    let log = event_log();
    let mut x = FakeAxis::new(&log, "x");
    x.fail_after = Some(1);
    let mut y = FakeAxis::new(&log, "y");
    let mut counter = FakeCounter {
        log: log.clone(),
        rates: VecDeque::new(),
    };

    assert!(raster_scan(&mut x, &mut y, &mut counter, &settings(3, 2)).is_err());
    assert_eq!(log.borrow().last().unwrap(), "x -10");
}

#[rstest]
fn test_raster_table() {
    let log = event_log();
    let mut x = FakeAxis::new(&log, "x");
    let mut y = FakeAxis::new(&log, "y");
    let mut counter = FakeCounter {
        log: log.clone(),
        rates: (1..=4).map(f64::from).collect(),
    };

    let grid = raster_scan(&mut x, &mut y, &mut counter, &settings(2, 2)).unwrap();
    let table = grid.to_table().unwrap();

    assert_eq!(table.len(), 4);
    assert_eq!(table.rows()[3], vec![1.0, 1.0, 10.0, 5.0, 3.0]);
}

#[rstest]
#[case(0, 3)]
#[case(3, 0)]
fn test_raster_empty_grid(#[case] nx: usize, #[case] ny: usize) {
    let log = event_log();
    let mut x = FakeAxis::new(&log, "x");
    let mut y = FakeAxis::new(&log, "y");
    let mut counter = FakeCounter {
        log: log.clone(),
        rates: VecDeque::new(),
    };

    assert!(raster_scan(&mut x, &mut y, &mut counter, &settings(nx, ny)).is_err());
}
