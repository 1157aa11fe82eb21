//! Count rate measurements of a biased detector.

use std::{thread, time::Duration};

use measurements::Voltage;
use serde::{Deserialize, Serialize};

use crate::{
    BenchError,
    data::DataTable,
    ic_sweep::zero_bias,
    roles::{Attenuator, BiasSource, PhotonCounter},
    sweep::{secs, steps},
};

/// Settings of a counts versus bias curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountsSettings {
    pub start_v: f64,
    pub stop_v: f64,
    pub step_v: f64,
    /// Counter gate time in s.
    pub gate_s: f64,
    /// Wait after setting the bias, in s.
    pub settle_s: f64,
    /// Attenuation set once before the sweep, if an attenuator is used.
    pub attenuation_db: Option<f64>,
}

impl Default for CountsSettings {
    fn default() -> Self {
        Self {
            start_v: 0.0,
            stop_v: 1.0,
            step_v: 0.01,
            gate_s: 1.0,
            settle_s: 0.1,
            attenuation_db: Some(30.0),
        }
    }
}

/// Measure the count rate at every bias point.
///
/// Without an attenuator the table has the columns `bias_voltage` and `rate`. With an attenuator
/// the beam is opened for `light_rate` and blocked for `dark_rate` at every point. Afterwards the
/// beam is blocked and the bias is set back to zero and turned off, also when a point fails.
pub fn counts_vs_bias<B, C>(
    source: &mut B,
    counter: &mut C,
    mut attenuator: Option<&mut dyn Attenuator>,
    settings: &CountsSettings,
) -> Result<DataTable, BenchError>
where
    B: BiasSource + ?Sized,
    C: PhotonCounter + ?Sized,
{
    let biases = steps(settings.start_v, settings.stop_v, settings.step_v)?;
    let gate = secs(settings.gate_s)?;
    let settle = secs(settings.settle_s)?;

    let mut table = if attenuator.is_some() {
        DataTable::new(&["bias_voltage", "light_rate", "dark_rate"])
    } else {
        DataTable::new(&["bias_voltage", "rate"])
    };

    let swept = (|| -> Result<(), BenchError> {
        if let (Some(att), Some(db)) = (attenuator.as_mut(), settings.attenuation_db) {
            att.set_attenuation(db)?;
        }
        source.set_bias(Voltage::from_volts(biases[0]))?;
        source.set_bias_output(true)?;
        for (i, &bias) in biases.iter().enumerate() {
            source.set_bias(Voltage::from_volts(bias))?;
            thread::sleep(settle);
            let row = match attenuator.as_mut() {
                Some(att) => {
                    att.set_beam_block(false)?;
                    let light = counter.count_rate(gate)?;
                    att.set_beam_block(true)?;
                    let dark = counter.count_rate(gate)?;
                    vec![bias, light, dark]
                }
                None => vec![bias, counter.count_rate(gate)?],
            };
            log::info!("Point {} of {}: {row:?}", i + 1, biases.len());
            table.push_row(row)?;
        }
        Ok(())
    })();
    let block = match attenuator {
        Some(att) => att.set_beam_block(true),
        None => Ok(()),
    };
    let reset = zero_bias(source);
    swept?;
    block?;
    reset?;
    Ok(table)
}

/// Measure the count rate at every attenuation, with the bias left as it is.
///
/// The beam is opened for the sweep and blocked again afterwards, also when a point fails.
pub fn attenuation_sweep<A, C>(
    attenuator: &mut A,
    counter: &mut C,
    attenuations: &[f64],
    gate: Duration,
) -> Result<DataTable, BenchError>
where
    A: Attenuator + ?Sized,
    C: PhotonCounter + ?Sized,
{
    let mut table = DataTable::new(&["attenuation_db", "rate"]);
    let swept = (|| -> Result<(), BenchError> {
        attenuator.set_beam_block(false)?;
        for &db in attenuations {
            attenuator.set_attenuation(db)?;
            let rate = counter.count_rate(gate)?;
            log::info!("{db} dB: {rate} counts/s");
            table.push_row(vec![db, rate])?;
        }
        Ok(())
    })();
    let block = attenuator.set_beam_block(true);
    swept?;
    block?;
    Ok(table)
}
