//! Generation of the setpoint lists that routines step through.

use std::time::Duration;

use crate::BenchError;

/// Largest number of points a stepped sweep may have.
pub const MAX_POINTS: usize = 1_000_000;

/// Values from `start` towards `stop` in increments of `step`, `stop` included when reached.
///
/// The step must point from `start` to `stop`. The last value is `stop` if it lies within a small
/// fraction of a step from the end, so that floating point rounding does not drop it. Sweeps of
/// more than [`MAX_POINTS`] values are rejected before anything is allocated.
pub fn steps(start: f64, stop: f64, step: f64) -> Result<Vec<f64>, BenchError> {
    if !(start.is_finite() && stop.is_finite() && step.is_finite()) {
        return Err(BenchError::InvalidSweep(format!(
            "Non finite sweep from {start} to {stop} in steps of {step}"
        )));
    }
    if start == stop {
        return Ok(vec![start]);
    }
    if step == 0.0 || (stop - start).signum() != step.signum() {
        return Err(BenchError::InvalidSweep(format!(
            "Step {step} does not lead from {start} to {stop}"
        )));
    }

    let intervals = ((stop - start) / step + 1e-9).floor();
    if intervals >= MAX_POINTS as f64 {
        return Err(BenchError::InvalidSweep(format!(
            "Sweep from {start} to {stop} in steps of {step} has more than {MAX_POINTS} points"
        )));
    }
    let n = intervals as usize;
    let mut values: Vec<f64> = (0..=n).map(|i| start + i as f64 * step).collect();
    if let Some(last) = values.last_mut() {
        if (*last - stop).abs() < step.abs() * 1e-6 {
            *last = stop;
        }
    }
    Ok(values)
}

/// The given points followed by the same points in reverse, without repeating the last one.
pub fn there_and_back(points: &[f64]) -> Vec<f64> {
    let mut values = points.to_vec();
    values.extend(points.iter().rev().skip(1));
    values
}

/// Convert seconds from a settings file into a `Duration`.
pub fn secs(value: f64) -> Result<Duration, BenchError> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| BenchError::InvalidSweep(format!("{value} is not a valid time in seconds")))
}
