//! Network analyzer spectroscopy, optionally at a series of temperatures.

use keysight_e5071c::{Format, SParameter, VnaTrace};
use measurements::Temperature;
use serde::{Deserialize, Serialize};

use crate::{
    BenchError,
    data::DataTable,
    roles::{NetworkAnalyzer, TemperatureController},
    sweep::secs,
    thermal::{StabilizeSettings, heating_off_after, ramp_to},
};

/// Measured scattering parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VnaParameter {
    S11,
    S12,
    S21,
    S22,
}

impl From<VnaParameter> for SParameter {
    fn from(p: VnaParameter) -> Self {
        match p {
            VnaParameter::S11 => SParameter::S11,
            VnaParameter::S12 => SParameter::S12,
            VnaParameter::S21 => SParameter::S21,
            VnaParameter::S22 => SParameter::S22,
        }
    }
}

/// Trace format as written in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VnaFormat {
    LogMag,
    LinMag,
    Phase,
    UnwrappedPhase,
    GroupDelay,
    Real,
    Imaginary,
    Polar,
    Smith,
}

impl From<VnaFormat> for Format {
    fn from(f: VnaFormat) -> Self {
        match f {
            VnaFormat::LogMag => Format::LogMag,
            VnaFormat::LinMag => Format::LinMag,
            VnaFormat::Phase => Format::Phase,
            VnaFormat::UnwrappedPhase => Format::UnwrappedPhase,
            VnaFormat::GroupDelay => Format::GroupDelay,
            VnaFormat::Real => Format::Real,
            VnaFormat::Imaginary => Format::Imaginary,
            VnaFormat::Polar => Format::Polar,
            VnaFormat::Smith => Format::Smith,
        }
    }
}

/// Sweep settings of the network analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VnaSettings {
    pub start_hz: f64,
    pub stop_hz: f64,
    pub points: u32,
    pub power_dbm: f64,
    pub if_bandwidth_hz: f64,
    /// Number of averages, 0 turns averaging off.
    pub averages: u32,
    pub parameter: VnaParameter,
    pub format: VnaFormat,
    /// Longest wait for one (averaged) sweep in s.
    pub sweep_timeout_s: f64,
}

impl Default for VnaSettings {
    fn default() -> Self {
        Self {
            start_hz: 1e9,
            stop_hz: 8e9,
            points: 1601,
            power_dbm: -20.0,
            if_bandwidth_hz: 1e3,
            averages: 0,
            parameter: VnaParameter::S21,
            format: VnaFormat::LogMag,
            sweep_timeout_s: 60.0,
        }
    }
}

/// Configure the analyzer, run one sweep and read the trace.
pub fn vna_spectroscopy<V: NetworkAnalyzer + ?Sized>(
    vna: &mut V,
    settings: &VnaSettings,
) -> Result<VnaTrace, BenchError> {
    let max_wait = secs(settings.sweep_timeout_s)?;
    vna.configure(settings)?;
    log::info!(
        "Sweeping {} points from {} Hz to {} Hz",
        settings.points,
        settings.start_hz,
        settings.stop_hz
    );
    Ok(vna.measure(max_wait)?)
}

/// A trace taken at a stable temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureTrace {
    /// Setpoint in K.
    pub setpoint: f64,
    /// Stable temperature in K when the sweep started.
    pub temperature: f64,
    pub trace: VnaTrace,
}

/// Take one trace at every stable temperature.
///
/// The analyzer is configured once before the first setpoint. Heating is stopped at the end,
/// also when a step fails.
pub fn vna_vs_temperature<V, C>(
    vna: &mut V,
    ctrl: &mut C,
    setpoints: &[f64],
    settings: &VnaSettings,
    stabilize: &StabilizeSettings,
) -> Result<Vec<TemperatureTrace>, BenchError>
where
    V: NetworkAnalyzer + ?Sized,
    C: TemperatureController + ?Sized,
{
    let max_wait = secs(settings.sweep_timeout_s)?;
    vna.configure(settings)?;

    heating_off_after(ctrl, |ctrl| {
        let mut traces = Vec::with_capacity(setpoints.len());
        for &setpoint in setpoints {
            let temperature = ramp_to(ctrl, Temperature::from_kelvin(setpoint), stabilize)?;
            let trace = vna.measure(max_wait)?;
            log::info!("Trace at {temperature:.3} K done");
            traces.push(TemperatureTrace {
                setpoint,
                temperature,
                trace,
            });
        }
        Ok(traces)
    })
}

/// A trace as table with the columns `frequency_hz`, `primary` and `secondary`.
pub fn trace_table(trace: &VnaTrace) -> Result<DataTable, BenchError> {
    let mut table = DataTable::new(&["frequency_hz", "primary", "secondary"]);
    for ((f, p), s) in trace
        .frequency
        .iter()
        .zip(&trace.primary)
        .zip(&trace.secondary)
    {
        table.push_row(vec![*f, *p, *s])?;
    }
    Ok(table)
}

/// All traces in one table, each point prefixed with its setpoint and temperature.
pub fn temperature_trace_table(traces: &[TemperatureTrace]) -> Result<DataTable, BenchError> {
    let mut table = DataTable::new(&[
        "setpoint_k",
        "temperature_k",
        "frequency_hz",
        "primary",
        "secondary",
    ]);
    for t in traces {
        for row in trace_table(&t.trace)?.rows() {
            let mut full = vec![t.setpoint, t.temperature];
            full.extend_from_slice(row);
            table.push_row(full)?;
        }
    }
    Ok(table)
}
