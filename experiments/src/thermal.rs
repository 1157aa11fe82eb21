//! Setting a temperature and waiting until it is stable.

use std::{thread, time::Instant};

use measurements::Temperature;
use serde::{Deserialize, Serialize};

use crate::{BenchError, roles::TemperatureController, sweep::secs};

/// When a temperature counts as reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilizeSettings {
    /// Allowed deviation from the target in K.
    pub tolerance_k: f64,
    /// How long the reading must stay within the tolerance, in s.
    pub settle_s: f64,
    /// Time between two readings in s.
    pub poll_s: f64,
    /// Give up after this many seconds.
    pub timeout_s: f64,
}

impl Default for StabilizeSettings {
    fn default() -> Self {
        Self {
            tolerance_k: 0.05,
            settle_s: 60.0,
            poll_s: 2.0,
            timeout_s: 1800.0,
        }
    }
}

/// Poll the controller until the temperature stays within the tolerance for the settle time.
///
/// Returns the last reading in kelvin.
pub fn wait_for_temperature<C: TemperatureController + ?Sized>(
    ctrl: &mut C,
    target: Temperature,
    settings: &StabilizeSettings,
) -> Result<f64, BenchError> {
    let target_k = target.as_kelvin();
    let settle = secs(settings.settle_s)?;
    let poll = secs(settings.poll_s)?;
    let timeout = secs(settings.timeout_s)?;

    let tic = Instant::now();
    let mut in_band_since: Option<Instant> = None;
    loop {
        let temp = ctrl.get_temperature()?.as_kelvin();
        if (temp - target_k).abs() <= settings.tolerance_k {
            let since = *in_band_since.get_or_insert_with(Instant::now);
            if since.elapsed() >= settle {
                log::info!("Temperature stable at {temp:.3} K");
                return Ok(temp);
            }
        } else {
            in_band_since = None;
        }

        if tic.elapsed() >= timeout {
            return Err(BenchError::TemperatureNotReached {
                target: target_k,
                last: temp,
                timeout,
            });
        }
        log::debug!("Waiting for {target_k:.3} K, now at {temp:.3} K");
        thread::sleep(poll);
    }
}

/// Set the setpoint, start heating and wait until the temperature is stable there.
///
/// The setpoint is written before heating starts, so the controller never regulates towards a
/// setpoint left over from earlier. Heating stays on when this returns.
pub fn ramp_to<C: TemperatureController + ?Sized>(
    ctrl: &mut C,
    target: Temperature,
    settings: &StabilizeSettings,
) -> Result<f64, BenchError> {
    log::info!("Ramping to {:.3} K", target.as_kelvin());
    ctrl.set_setpoint(target)?;
    ctrl.set_heating(true)?;
    wait_for_temperature(ctrl, target, settings)
}

/// Run `scan` with the controller and stop heating afterwards, also when the scan fails.
pub fn heating_off_after<C, R, F>(ctrl: &mut C, scan: F) -> Result<R, BenchError>
where
    C: TemperatureController + ?Sized,
    F: FnOnce(&mut C) -> Result<R, BenchError>,
{
    let scanned = scan(ctrl);
    let off = ctrl.set_heating(false);
    if off.is_ok() {
        log::info!("Heating off");
    }
    let result = scanned?;
    off?;
    Ok(result)
}

/// Result of one step of a temperature scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPoint {
    /// Setpoint in K.
    pub setpoint: f64,
    /// Temperature in K once it was stable.
    pub temperature: f64,
    /// What the measurement returned at this temperature.
    pub values: Vec<f64>,
}

/// Step through the setpoints and run a measurement at each stable temperature.
///
/// The measurement gets the stable temperature in kelvin. Heating is stopped at the end, also
/// when a step fails.
pub fn temperature_scan<C, F>(
    ctrl: &mut C,
    setpoints: &[f64],
    settings: &StabilizeSettings,
    mut measure: F,
) -> Result<Vec<ScanPoint>, BenchError>
where
    C: TemperatureController + ?Sized,
    F: FnMut(f64) -> Result<Vec<f64>, BenchError>,
{
    heating_off_after(ctrl, |ctrl| {
        let mut points = Vec::with_capacity(setpoints.len());
        for (i, &setpoint) in setpoints.iter().enumerate() {
            log::info!("Setpoint {} of {}: {setpoint} K", i + 1, setpoints.len());
            let temperature = ramp_to(ctrl, Temperature::from_kelvin(setpoint), settings)?;
            let values = measure(temperature)?;
            points.push(ScanPoint {
                setpoint,
                temperature,
                values,
            });
        }
        Ok(points)
    })
}
