//! Fake instruments for testing the routines without hardware.
//!
//! All fakes write what they are asked to do into a shared event log, such that tests can check
//! the order of operations across instruments.

#![allow(dead_code)]

use std::{cell::RefCell, collections::VecDeque, rc::Rc, time::Duration};

use benchrs::InstrumentError;
use keysight_e5071c::VnaTrace;
use measurements::{Frequency, Temperature, Voltage};

use snspd_bench::{roles::*, vna::VnaSettings};

pub type EventLog = Rc<RefCell<Vec<String>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

fn push(log: &EventLog, event: String) {
    log.borrow_mut().push(event);
}

fn fail(what: &str) -> InstrumentError {
    InstrumentError::InstrumentStatus(format!("{what} failed"))
}

pub struct FakeBias {
    pub log: EventLog,
    /// Setting this bias voltage fails.
    pub fail_at: Option<f64>,
}

impl BiasSource for FakeBias {
    fn set_bias(&mut self, voltage: Voltage) -> Result<(), InstrumentError> {
        let v = voltage.as_volts();
        if self.fail_at == Some(v) {
            return Err(fail("bias"));
        }
        push(&self.log, format!("bias {v}"));
        Ok(())
    }

    fn set_bias_output(&mut self, on: bool) -> Result<(), InstrumentError> {
        push(&self.log, format!("output {on}"));
        Ok(())
    }
}

/// Returns the queued rates in order, then zero.
pub struct FakeCounter {
    pub log: EventLog,
    pub rates: VecDeque<f64>,
}

impl PhotonCounter for FakeCounter {
    fn count_rate(&mut self, gate: Duration) -> Result<f64, InstrumentError> {
        push(&self.log, format!("count {}", gate.as_secs_f64()));
        Ok(self.rates.pop_front().unwrap_or(0.0))
    }
}

pub struct FakeAttenuator {
    pub log: EventLog,
}

impl Attenuator for FakeAttenuator {
    fn set_attenuation(&mut self, db: f64) -> Result<(), InstrumentError> {
        push(&self.log, format!("att {db}"));
        Ok(())
    }

    fn set_beam_block(&mut self, block: bool) -> Result<(), InstrumentError> {
        push(&self.log, format!("block {block}"));
        Ok(())
    }
}

/// A controller whose temperature readings are queued; the last one repeats.
pub struct FakeController {
    pub log: EventLog,
    pub readings: VecDeque<f64>,
}

impl TemperatureController for FakeController {
    fn set_setpoint(&mut self, setpoint: Temperature) -> Result<(), InstrumentError> {
        push(&self.log, format!("setpoint {}", setpoint.as_kelvin()));
        Ok(())
    }

    fn get_temperature(&mut self) -> Result<Temperature, InstrumentError> {
        let t = if self.readings.len() > 1 {
            self.readings.pop_front()
        } else {
            self.readings.front().copied()
        };
        let t = t.ok_or_else(|| fail("temperature"))?;
        push(&self.log, format!("read {t}"));
        Ok(Temperature::from_kelvin(t))
    }
    fn set_heating(&mut self, on: bool) -> Result<(), InstrumentError> {
        push(&self.log, format!("heating {}", if on { "on" } else { "off" }));
        Ok(())
    }
}

/// A controller that always reads the last setpoint, i.e., settles immediately.
pub struct FollowingController {
    pub log: EventLog,
    pub setpoint: f64,
}

impl TemperatureController for FollowingController {
    fn set_setpoint(&mut self, setpoint: Temperature) -> Result<(), InstrumentError> {
        self.setpoint = setpoint.as_kelvin();
        push(&self.log, format!("setpoint {}", self.setpoint));
        Ok(())
    }

    fn get_temperature(&mut self) -> Result<Temperature, InstrumentError> {
        Ok(Temperature::from_kelvin(self.setpoint))
    }
    fn set_heating(&mut self, on: bool) -> Result<(), InstrumentError> {
        push(&self.log, format!("heating {}", if on { "on" } else { "off" }));
        Ok(())
    }
}

/// A scope that returns the queued parameter values.
pub struct FakeScope {
    pub log: EventLog,
    pub values: VecDeque<f64>,
}

impl Oscilloscope for FakeScope {
    fn clear_sweeps(&mut self) -> Result<(), InstrumentError> {
        push(&self.log, "clear".to_string());
        Ok(())
    }

    fn wait_for_sweeps(
        &mut self,
        p: u8,
        n: u64,
        _poll: Duration,
        _timeout: Duration,
    ) -> Result<u64, InstrumentError> {
        push(&self.log, format!("wait P{p} {n}"));
        Ok(n)
    }

    fn parameter_mean(&mut self, p: u8) -> Result<f64, InstrumentError> {
        push(&self.log, format!("mean P{p}"));
        self.values.pop_front().ok_or_else(|| fail("scope"))
    }

    fn parameter_values(
        &mut self,
        p: u8,
        n: usize,
        _timeout: Duration,
    ) -> Result<Vec<f64>, InstrumentError> {
        push(&self.log, format!("values P{p} {n}"));
        if self.values.len() < n {
            return Err(InstrumentError::Timeout(Duration::from_secs(1)));
        }
        Ok(self.values.drain(..n).collect())
    }
}

pub struct FakeRamp {
    pub log: EventLog,
}

impl RampSource for FakeRamp {
    fn configure_ramp(
        &mut self,
        frequency: Frequency,
        low: Voltage,
        high: Voltage,
    ) -> Result<(), InstrumentError> {
        push(
            &self.log,
            format!(
                "ramp {} {} {}",
                frequency.as_hertz(),
                low.as_volts(),
                high.as_volts()
            ),
        );
        Ok(())
    }

    fn set_ramp_output(&mut self, on: bool) -> Result<(), InstrumentError> {
        push(&self.log, format!("ramp output {on}"));
        Ok(())
    }
}

/// An axis that logs its moves under its name and fails after `fail_after` moves.
pub struct FakeAxis {
    pub log: EventLog,
    pub name: &'static str,
    pub fail_after: Option<usize>,
    pub moves: usize,
}

impl FakeAxis {
    pub fn new(log: &EventLog, name: &'static str) -> Self {
        Self {
            log: log.clone(),
            name,
            fail_after: None,
            moves: 0,
        }
    }
}

impl Positioner for FakeAxis {
    fn move_steps(&mut self, steps: i64) -> Result<(), InstrumentError> {
        if self.fail_after == Some(self.moves) {
            self.fail_after = None;
            return Err(fail("axis"));
        }
        self.moves += 1;
        push(&self.log, format!("{} {steps}", self.name));
        Ok(())
    }
}

/// A network analyzer that returns a flat trace with the configured number of points.
pub struct FakeVna {
    pub log: EventLog,
    pub points: u32,
    pub level: f64,
}

impl NetworkAnalyzer for FakeVna {
    fn configure(&mut self, settings: &VnaSettings) -> Result<(), InstrumentError> {
        self.points = settings.points;
        push(&self.log, format!("configure {}", settings.points));
        Ok(())
    }

    fn measure(&mut self, _max_wait: Duration) -> Result<VnaTrace, InstrumentError> {
        push(&self.log, "measure".to_string());
        let n = self.points as usize;
        Ok(VnaTrace {
            frequency: (0..n).map(|i| 1e9 + i as f64 * 1e6).collect(),
            primary: vec![self.level; n],
            secondary: vec![0.0; n],
        })
    }
}
