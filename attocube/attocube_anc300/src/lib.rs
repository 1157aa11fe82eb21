//! A rust driver for the attocube ANC300 piezo positioner controller.
//!
//! The controller holds up to seven positioner modules (axes). Every command is answered with zero
//! or more lines of data followed by a line `OK`, or by an error message followed by `ERROR`.
//!
//! # Example
//!
//! The ethernet port (7230) asks for a password before accepting commands.
//! ```no_run
//! use attocube_anc300::{Anc300, Direction, Mode};
//! use benchrs::TcpIpInterface;
//! use measurements::{Frequency, Voltage};
//!
//! let tcpip = TcpIpInterface::simple("192.168.1.40:7230").unwrap();
//! let mut anc = Anc300::try_new(tcpip).unwrap();
//! anc.authenticate("123456").unwrap();
//!
//! let mut x = anc.get_axis(0).unwrap();
//! x.set_mode(Mode::Step).unwrap();
//! x.set_frequency(Frequency::from_hertz(200.0)).unwrap();
//! x.set_voltage(Voltage::from_volts(30.0)).unwrap();
//! x.step(Direction::Up, 100).unwrap();
//! ```

#![deny(warnings, missing_docs)]

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use benchrs::{InstrumentError, InstrumentInterface};

use measurements::{Frequency, Voltage};

const NUM_AXES: usize = 7;
const VOLT_MAX: f64 = 150.0;

/// Operating modes of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Output grounded.
    Ground,
    /// Stepping.
    Step,
    /// DC offset voltage only, for fine positioning.
    Offset,
    /// Stepping on top of the offset voltage.
    StepOffset,
    /// Capacitance measurement.
    Capacitance,
}

impl Mode {
    fn as_str(&self) -> &'static str {
        match self {
            Mode::Ground => "gnd",
            Mode::Step => "stp",
            Mode::Offset => "off",
            Mode::StepOffset => "stp+",
            Mode::Capacitance => "cap",
        }
    }

    fn from_cmd_str(value: &str) -> Result<Self, InstrumentError> {
        match value {
            "gnd" => Ok(Mode::Ground),
            "stp" => Ok(Mode::Step),
            "off" => Ok(Mode::Offset),
            "stp+" => Ok(Mode::StepOffset),
            "cap" => Ok(Mode::Capacitance),
            _ => Err(InstrumentError::ResponseParseError(value.to_string())),
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stepping direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Positive direction.
    Up,
    /// Negative direction.
    Down,
}

/// A rust driver for the ANC300.
pub struct Anc300<T: InstrumentInterface> {
    interface: Arc<Mutex<T>>,
    num_axes: usize,
}

impl<T: InstrumentInterface> Anc300<T> {
    /// Create a new Anc300 instance with the given instrument interface.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    pub fn try_new(interface: T) -> Result<Self, InstrumentError> {
        let mut intf = interface;
        intf.set_terminator("\r\n");
        Ok(Anc300 {
            interface: Arc::new(Mutex::new(intf)),
            num_axes: NUM_AXES,
        })
    }

    /// Log in on the ethernet port and turn off the command echo.
    ///
    /// The serial port does not need this. Anything the controller prints before the
    /// authorization result is skipped.
    pub fn authenticate(&mut self, password: &str) -> Result<(), InstrumentError> {
        {
            let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
            intf.sendcmd(password)?;
            loop {
                let line = intf.read_until_terminator()?;
                if line.contains("Authorization success") {
                    break;
                }
                if line.contains("Authorization failed") {
                    return Err(InstrumentError::InstrumentStatus(line));
                }
            }
        }
        command(&self.interface, "echo off", Duration::ZERO)?;
        Ok(())
    }

    /// Get the axis with the given index. Index 0 is axis 1.
    pub fn get_axis(&mut self, idx: usize) -> Result<Axis<T>, InstrumentError> {
        if idx >= self.num_axes {
            return Err(InstrumentError::ChannelIndexOutOfRange {
                idx,
                nof_channels: self.num_axes,
            });
        }
        Ok(Axis::new(idx, Arc::clone(&self.interface)))
    }

    /// Get the version information of the controller.
    pub fn get_name(&mut self) -> Result<String, InstrumentError> {
        let lines = command(&self.interface, "ver", Duration::ZERO)?;
        Ok(lines.join(", "))
    }
}

impl<T: InstrumentInterface> Clone for Anc300<T> {
    fn clone(&self) -> Self {
        Self {
            interface: self.interface.clone(),
            num_axes: self.num_axes,
        }
    }
}

/// One positioner axis of the ANC300.
///
/// **This structure can only be created through the [`Anc300`] struct.**
pub struct Axis<T: InstrumentInterface> {
    idx: usize,
    interface: Arc<Mutex<T>>,
}

impl<T: InstrumentInterface> Axis<T> {
    fn new(idx: usize, interface: Arc<Mutex<T>>) -> Self {
        Axis { idx, interface }
    }

    /// The axis number as used by the controller (1 to 7).
    pub fn number(&self) -> usize {
        self.idx + 1
    }

    /// Set the operating mode.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), InstrumentError> {
        self.command(&format!("setm {} {mode}", self.number()))?;
        Ok(())
    }

    /// Get the operating mode.
    pub fn get_mode(&mut self) -> Result<Mode, InstrumentError> {
        let line = self.value_line(&format!("getm {}", self.number()))?;
        Mode::from_cmd_str(value_of(&line)?)
    }

    /// Set the step frequency, 1 Hz to 10 kHz. The frequency is rounded to whole hertz.
    pub fn set_frequency(&mut self, freq: Frequency) -> Result<(), InstrumentError> {
        let value = freq.as_hertz().round();
        if !(1.0..=10_000.0).contains(&value) {
            return Err(InstrumentError::FloatValueOutOfRange {
                value,
                min: 1.0,
                max: 10_000.0,
            });
        }
        self.command(&format!("setf {} {value}", self.number()))?;
        Ok(())
    }

    /// Get the step frequency.
    pub fn get_frequency(&mut self) -> Result<Frequency, InstrumentError> {
        let line = self.value_line(&format!("getf {}", self.number()))?;
        let (value, _) = number_with_unit(&line)?;
        Ok(Frequency::from_hertz(value))
    }

    /// Set the step amplitude, 0 V to 150 V.
    pub fn set_voltage(&mut self, voltage: Voltage) -> Result<(), InstrumentError> {
        let value = check_voltage(voltage)?;
        self.command(&format!("setv {} {value}", self.number()))?;
        Ok(())
    }

    /// Get the step amplitude.
    pub fn get_voltage(&mut self) -> Result<Voltage, InstrumentError> {
        let line = self.value_line(&format!("getv {}", self.number()))?;
        let (value, _) = number_with_unit(&line)?;
        Ok(Voltage::from_volts(value))
    }

    /// Set the DC offset voltage, 0 V to 150 V. Only applied in the offset modes.
    pub fn set_offset_voltage(&mut self, voltage: Voltage) -> Result<(), InstrumentError> {
        let value = check_voltage(voltage)?;
        self.command(&format!("seta {} {value}", self.number()))?;
        Ok(())
    }

    /// Get the DC offset voltage.
    pub fn get_offset_voltage(&mut self) -> Result<Voltage, InstrumentError> {
        let line = self.value_line(&format!("geta {}", self.number()))?;
        let (value, _) = number_with_unit(&line)?;
        Ok(Voltage::from_volts(value))
    }

    /// Start `steps` steps in the given direction. Returns without waiting for the steps.
    pub fn step(&mut self, direction: Direction, steps: u32) -> Result<(), InstrumentError> {
        if steps == 0 {
            return Err(InstrumentError::IntValueOutOfRange {
                value: 0,
                min: 1,
                max: u32::MAX.into(),
            });
        }
        let cmd = match direction {
            Direction::Up => "stepu",
            Direction::Down => "stepd",
        };
        self.command(&format!("{cmd} {} {steps}", self.number()))?;
        Ok(())
    }

    /// Wait until the running steps of this axis are done, at most `max_wait`.
    pub fn wait_steps(&mut self, max_wait: Duration) -> Result<(), InstrumentError> {
        command(&self.interface, &format!("stepw {}", self.number()), max_wait)?;
        Ok(())
    }

    /// Stop any motion of this axis.
    pub fn stop(&mut self) -> Result<(), InstrumentError> {
        self.command(&format!("stop {}", self.number()))?;
        Ok(())
    }

    /// Measure the capacitance of the piezo in farad.
    ///
    /// This switches the axis into capacitance mode. Set the mode again before stepping.
    pub fn get_capacitance(&mut self) -> Result<f64, InstrumentError> {
        self.set_mode(Mode::Capacitance)?;
        command(
            &self.interface,
            &format!("capw {}", self.number()),
            Duration::from_secs(10),
        )?;
        let line = self.value_line(&format!("getc {}", self.number()))?;
        let (value, unit) = number_with_unit(&line)?;
        let factor = match unit {
            "pF" => 1e-12,
            "nF" => 1e-9,
            "uF" | "µF" => 1e-6,
            "F" => 1.0,
            _ => return Err(InstrumentError::ResponseParseError(line.clone())),
        };
        Ok(value * factor)
    }

    fn command(&mut self, cmd: &str) -> Result<Vec<String>, InstrumentError> {
        command(&self.interface, cmd, Duration::ZERO)
    }

    /// Send a command that answers with exactly one data line and return that line.
    fn value_line(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        let mut lines = self.command(cmd)?;
        match lines.len() {
            1 => Ok(lines.remove(0)),
            _ => Err(InstrumentError::ResponseParseError(lines.join("\n"))),
        }
    }
}

impl<T: InstrumentInterface> Clone for Axis<T> {
    fn clone(&self) -> Self {
        Self {
            idx: self.idx,
            interface: self.interface.clone(),
        }
    }
}

/// Send a command and collect the reply lines until `OK`.
///
/// A reply ending in `ERROR` becomes an [`InstrumentError::InstrumentStatus`] with the controller's
/// message. Read timeouts are retried until `max_wait` has passed, a zero `max_wait` fails on the
/// first timeout.
fn command<T: InstrumentInterface>(
    interface: &Arc<Mutex<T>>,
    cmd: &str,
    max_wait: Duration,
) -> Result<Vec<String>, InstrumentError> {
    let mut intf = interface.lock().expect("Mutex should not be poisoned");
    intf.sendcmd(cmd)?;
    let tic = Instant::now();
    let mut lines = Vec::new();
    loop {
        let line = match intf.read_until_terminator() {
            Ok(line) => line,
            Err(InstrumentError::Timeout(_)) if tic.elapsed() < max_wait => continue,
            Err(InstrumentError::Timeout(timeout)) => {
                return Err(InstrumentError::TimeoutQuery {
                    query: cmd.to_string(),
                    timeout: timeout.max(max_wait),
                });
            }
            Err(e) => return Err(e),
        };
        if line == "OK" {
            return Ok(lines);
        }
        if line == "ERROR" {
            log::warn!("ANC300 rejected {cmd:?}: {}", lines.join(" "));
            return Err(InstrumentError::InstrumentStatus(lines.join(" ")));
        }
        // Command echo, only present before `echo off`.
        if !line.is_empty() && line != cmd {
            lines.push(line);
        }
    }
}

fn check_voltage(voltage: Voltage) -> Result<f64, InstrumentError> {
    let value = voltage.as_volts();
    if !(0.0..=VOLT_MAX).contains(&value) {
        return Err(InstrumentError::FloatValueOutOfRange {
            value,
            min: 0.0,
            max: VOLT_MAX,
        });
    }
    Ok(value)
}

/// The value of a `name = value` line.
fn value_of(line: &str) -> Result<&str, InstrumentError> {
    line.split_once('=')
        .map(|(_, v)| v.trim())
        .ok_or_else(|| InstrumentError::ResponseParseError(line.to_string()))
}

/// Number and unit of a `name = value unit` line, e.g. `frequency = 100 Hz`.
fn number_with_unit(line: &str) -> Result<(f64, &str), InstrumentError> {
    let value = value_of(line)?;
    let (num, unit) = value.split_once(' ').unwrap_or((value, ""));
    let num = num
        .parse::<f64>()
        .map_err(|_| InstrumentError::ResponseParseError(line.to_string()))?;
    Ok((num, unit.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_with_unit() {
        assert_eq!(
            number_with_unit("frequency = 100 Hz").unwrap(),
            (100.0, "Hz")
        );
        assert_eq!(
            number_with_unit("capacitance = 1071.6 nF").unwrap(),
            (1071.6, "nF")
        );
        assert_eq!(number_with_unit("voltage = 30").unwrap(), (30.0, ""));
        assert!(number_with_unit("garbage").is_err());
    }

    #[test]
    fn test_value_of() {
        assert_eq!(value_of("mode = stp").unwrap(), "stp");
    }
}
