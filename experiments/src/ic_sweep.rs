//! Switching current measurements.
//!
//! The detector is biased through a series resistor, so the bias current is the applied voltage
//! divided by that resistance. The oscilloscope watches the voltage across the detector.

use std::thread;

use measurements::{Frequency, Voltage};
use serde::{Deserialize, Serialize};

use crate::{
    BenchError,
    data::{DataTable, Histogram},
    roles::{BiasSource, Oscilloscope, RampSource},
    sweep::{secs, steps, there_and_back},
};

/// Settings of a switching current histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchingSettings {
    /// Repetition rate of the bias ramp in Hz.
    pub ramp_frequency_hz: f64,
    /// Start of the ramp in V.
    pub ramp_low_v: f64,
    /// End of the ramp in V.
    pub ramp_high_v: f64,
    /// Bias resistor in ohm.
    pub bias_resistance_ohm: f64,
    /// Scope parameter (1 to 8) that measures the bias voltage at the switching event.
    pub scope_parameter: u8,
    /// Number of switching events to record.
    pub acquisitions: usize,
    pub bins: usize,
    /// Longest wait for one trigger in s.
    pub trigger_timeout_s: f64,
}

impl Default for SwitchingSettings {
    fn default() -> Self {
        Self {
            ramp_frequency_hz: 100.0,
            ramp_low_v: 0.0,
            ramp_high_v: 2.0,
            bias_resistance_ohm: 100e3,
            scope_parameter: 1,
            acquisitions: 1000,
            bins: 50,
            trigger_timeout_s: 1.0,
        }
    }
}

/// Recorded switching currents and their histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchingResult {
    /// Switching current of every event in A.
    pub currents: Vec<f64>,
    pub histogram: Histogram,
}

/// Ramp the bias with the generator and record the switching current of many events.
///
/// The generator output is turned off afterwards, also when the measurement fails.
pub fn switching_current_histogram<A, S>(
    awg: &mut A,
    scope: &mut S,
    settings: &SwitchingSettings,
) -> Result<SwitchingResult, BenchError>
where
    A: RampSource + ?Sized,
    S: Oscilloscope + ?Sized,
{
    if settings.bias_resistance_ohm <= 0.0 {
        return Err(BenchError::InvalidSweep(format!(
            "Bias resistance must be positive, got {} ohm",
            settings.bias_resistance_ohm
        )));
    }
    let trigger_timeout = secs(settings.trigger_timeout_s)?;

    let recorded = (|| -> Result<Vec<f64>, BenchError> {
        awg.configure_ramp(
            Frequency::from_hertz(settings.ramp_frequency_hz),
            Voltage::from_volts(settings.ramp_low_v),
            Voltage::from_volts(settings.ramp_high_v),
        )?;
        awg.set_ramp_output(true)?;
        scope.clear_sweeps()?;
        log::info!("Recording {} switching events", settings.acquisitions);
        Ok(scope.parameter_values(
            settings.scope_parameter,
            settings.acquisitions,
            trigger_timeout,
        )?)
    })();
    let off = awg.set_ramp_output(false);
    let voltages = recorded?;
    off?;

    let currents: Vec<f64> = voltages
        .iter()
        .map(|v| v / settings.bias_resistance_ohm)
        .collect();
    let histogram = Histogram::from_values(&currents, settings.bins)?;
    log::info!(
        "Switching current {:.3e} A +- {:.3e} A",
        histogram.mean,
        histogram.std_dev
    );
    Ok(SwitchingResult {
        currents,
        histogram,
    })
}

/// Settings of a stepped current-voltage sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IvSettings {
    pub start_v: f64,
    pub stop_v: f64,
    pub step_v: f64,
    /// Bias resistor in ohm.
    pub bias_resistance_ohm: f64,
    /// Scope parameter (1 to 8) that measures the device voltage.
    pub scope_parameter: u8,
    /// Sweeps averaged per point.
    pub sweeps_per_point: u64,
    /// Wait after setting the bias, in s.
    pub settle_s: f64,
    pub poll_s: f64,
    /// Longest wait for the sweeps of one point, in s.
    pub timeout_s: f64,
    /// Sweep back down to the start after reaching the stop value.
    pub there_and_back: bool,
}

impl Default for IvSettings {
    fn default() -> Self {
        Self {
            start_v: 0.0,
            stop_v: 2.0,
            step_v: 0.02,
            bias_resistance_ohm: 100e3,
            scope_parameter: 1,
            sweeps_per_point: 20,
            settle_s: 0.1,
            poll_s: 0.1,
            timeout_s: 10.0,
            there_and_back: false,
        }
    }
}

/// Step the bias source and read the averaged device voltage at every point.
///
/// The returned table has the columns `bias_voltage`, `bias_current` and `device_voltage`. The
/// bias is set back to zero and turned off afterwards, also when the sweep fails.
pub fn step_iv_sweep<B, S>(
    source: &mut B,
    scope: &mut S,
    settings: &IvSettings,
) -> Result<DataTable, BenchError>
where
    B: BiasSource + ?Sized,
    S: Oscilloscope + ?Sized,
{
    if settings.bias_resistance_ohm <= 0.0 {
        return Err(BenchError::InvalidSweep(format!(
            "Bias resistance must be positive, got {} ohm",
            settings.bias_resistance_ohm
        )));
    }
    let mut biases = steps(settings.start_v, settings.stop_v, settings.step_v)?;
    if settings.there_and_back {
        biases = there_and_back(&biases);
    }
    let settle = secs(settings.settle_s)?;
    let poll = secs(settings.poll_s)?;
    let timeout = secs(settings.timeout_s)?;

    let mut table = DataTable::new(&["bias_voltage", "bias_current", "device_voltage"]);
    let swept = (|| -> Result<(), BenchError> {
        source.set_bias(Voltage::from_volts(biases[0]))?;
        source.set_bias_output(true)?;
        for (i, &bias) in biases.iter().enumerate() {
            source.set_bias(Voltage::from_volts(bias))?;
            thread::sleep(settle);
            scope.clear_sweeps()?;
            scope.wait_for_sweeps(
                settings.scope_parameter,
                settings.sweeps_per_point,
                poll,
                timeout,
            )?;
            let device = scope.parameter_mean(settings.scope_parameter)?;
            log::info!(
                "Point {} of {}: {bias} V -> {device:.4e} V",
                i + 1,
                biases.len()
            );
            table.push_row(vec![bias, bias / settings.bias_resistance_ohm, device])?;
        }
        Ok(())
    })();
    let reset = zero_bias(source);
    swept?;
    reset?;
    Ok(table)
}

/// Set the bias to zero and turn the output off.
pub(crate) fn zero_bias<B: BiasSource + ?Sized>(source: &mut B) -> Result<(), BenchError> {
    source.set_bias(Voltage::from_volts(0.0))?;
    source.set_bias_output(false)?;
    Ok(())
}
