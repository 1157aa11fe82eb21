//! A rust driver for the Cryo-con 22C cryogenic temperature controller.
//!
//! The 22C has two sensor inputs (A, B) and two control loops (1, 2). Loop 1 is the main 50 W
//! heater with three ranges, loop 2 a 10 W auxiliary heater.
//!
//! # Example
//!
//! The 22C is usually connected via ethernet, on port 5000.
//! ```no_run
//! use cryocon_22c::{Cryocon22C, HeaterRange};
//! use benchrs::TcpIpInterface;
//! use measurements::Temperature;
//!
//! let tcpip = TcpIpInterface::simple("192.168.1.5:5000").unwrap();
//! let mut inst = Cryocon22C::try_new(tcpip).unwrap();
//!
//! let mut cha = inst.get_channel(0).unwrap();
//! println!("Input A: {:?}", cha.get_temperature());
//!
//! let mut loop1 = inst.get_loop(0).unwrap();
//! loop1.set_setpoint(Temperature::from_kelvin(2.5)).unwrap();
//! loop1.set_range(HeaterRange::Low).unwrap();
//! inst.control(true).unwrap();
//! ```

#![deny(warnings, missing_docs)]

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use benchrs::{InstrumentError, InstrumentInterface};

use measurements::Temperature;

/// Heater ranges of control loop 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterRange {
    /// High range, full power.
    Hi,
    /// Medium range, a tenth of full power.
    Mid,
    /// Low range, a hundredth of full power.
    Low,
}

impl HeaterRange {
    fn from_cmd_str(value: &str) -> Result<Self, InstrumentError> {
        match value.trim() {
            "HI" => Ok(HeaterRange::Hi),
            "MID" => Ok(HeaterRange::Mid),
            "LOW" => Ok(HeaterRange::Low),
            _ => Err(InstrumentError::ResponseParseError(value.to_string())),
        }
    }
}

impl Display for HeaterRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HeaterRange::Hi => "HI",
            HeaterRange::Mid => "MID",
            HeaterRange::Low => "LOW",
        };
        write!(f, "{s}")
    }
}

/// A rust driver for the Cryo-con 22C.
pub struct Cryocon22C<T: InstrumentInterface> {
    interface: Arc<Mutex<T>>,
    num_channels: usize,
    num_loops: usize,
}

impl<T: InstrumentInterface> Cryocon22C<T> {
    /// Create a new Cryocon22C instance with the given instrument interface.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    pub fn try_new(interface: T) -> Result<Self, InstrumentError> {
        let mut intf = interface;
        intf.set_terminator("\n");
        Ok(Cryocon22C {
            interface: Arc::new(Mutex::new(intf)),
            num_channels: 2,
            num_loops: 2,
        })
    }

    /// Get the sensor input with the given index. Index 0 is input A.
    pub fn get_channel(&mut self, idx: usize) -> Result<Channel<T>, InstrumentError> {
        if idx >= self.num_channels {
            return Err(InstrumentError::ChannelIndexOutOfRange {
                idx,
                nof_channels: self.num_channels,
            });
        }
        Ok(Channel::new(idx, Arc::clone(&self.interface)))
    }

    /// Get the control loop with the given index. Index 0 is loop 1.
    pub fn get_loop(&mut self, idx: usize) -> Result<Loop<T>, InstrumentError> {
        if idx >= self.num_loops {
            return Err(InstrumentError::ChannelIndexOutOfRange {
                idx,
                nof_channels: self.num_loops,
            });
        }
        Ok(Loop::new(idx, Arc::clone(&self.interface)))
    }

    /// Query the identification string of the instrument.
    pub fn get_name(&mut self) -> Result<String, InstrumentError> {
        self.query("*IDN?")
    }

    /// Engage (`true`) or disengage (`false`) all control loops.
    pub fn control(&mut self, on: bool) -> Result<(), InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.sendcmd(if on { "CONTROL" } else { "STOP" })
    }

    /// Check if the control loops are engaged.
    pub fn is_controlling(&mut self) -> Result<bool, InstrumentError> {
        let resp = self.query("CONTROL?")?;
        match resp.as_str() {
            "ON" => Ok(true),
            "OFF" => Ok(false),
            _ => Err(InstrumentError::ResponseParseError(resp)),
        }
    }

    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.query(cmd)
    }
}

impl<T: InstrumentInterface> Clone for Cryocon22C<T> {
    fn clone(&self) -> Self {
        Self {
            interface: self.interface.clone(),
            num_channels: self.num_channels,
            num_loops: self.num_loops,
        }
    }
}

/// A sensor input of the Cryocon22C.
///
/// **This structure can only be created through the [`Cryocon22C`] struct.**
pub struct Channel<T: InstrumentInterface> {
    idx: usize,
    interface: Arc<Mutex<T>>,
}

impl<T: InstrumentInterface> Channel<T> {
    fn new(idx: usize, interface: Arc<Mutex<T>>) -> Self {
        Channel { idx, interface }
    }

    /// Get the input letter of this channel.
    pub fn name(&self) -> char {
        match self.idx {
            0 => 'A',
            1 => 'B',
            _ => unreachable!("Channel index out of range"),
        }
    }

    /// Get the temperature of this input.
    ///
    /// This assumes the input reports in kelvin, see [`Channel::set_units_kelvin`]. An open or
    /// shorted sensor is reported by the instrument as a row of dots or dashes, which results in a
    /// sensor error.
    pub fn get_temperature(&mut self) -> Result<Temperature, InstrumentError> {
        let resp = self.query(&format!("INPUT {}:TEMP?", self.name()))?;
        if resp.is_empty() || resp.chars().all(|c| c == '.' || c == '-') {
            return Err(InstrumentError::SensorError(format!(
                "Input {} has no valid reading: {resp}",
                self.name()
            )));
        }
        let value = parse_value(&resp)?;
        Ok(Temperature::from_kelvin(value))
    }

    /// Set the reporting units of this input to kelvin.
    pub fn set_units_kelvin(&mut self) -> Result<(), InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.sendcmd(&format!("INPUT {}:UNITS K", self.name()))
    }

    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.query(cmd)
    }
}

impl<T: InstrumentInterface> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            idx: self.idx,
            interface: self.interface.clone(),
        }
    }
}

/// A control loop of the Cryocon22C.
///
/// **This structure can only be created through the [`Cryocon22C`] struct.**
pub struct Loop<T: InstrumentInterface> {
    idx: usize,
    interface: Arc<Mutex<T>>,
}

impl<T: InstrumentInterface> Loop<T> {
    fn new(idx: usize, interface: Arc<Mutex<T>>) -> Self {
        Loop { idx, interface }
    }

    /// Loop number as used by the instrument (1 or 2).
    pub fn number(&self) -> usize {
        self.idx + 1
    }

    /// Get the setpoint of this loop.
    pub fn get_setpoint(&mut self) -> Result<Temperature, InstrumentError> {
        let resp = self.query(&format!("LOOP {}:SETPT?", self.number()))?;
        Ok(Temperature::from_kelvin(parse_value(&resp)?))
    }

    /// Set the setpoint of this loop, 0 K to 1000 K.
    pub fn set_setpoint(&mut self, setpoint: Temperature) -> Result<(), InstrumentError> {
        let value = setpoint.as_kelvin();
        if !(0.0..=1000.0).contains(&value) {
            return Err(InstrumentError::FloatValueOutOfRange {
                value,
                min: 0.0,
                max: 1000.0,
            });
        }
        self.sendcmd(&format!("LOOP {}:SETPT {value:.4}", self.number()))
    }

    /// Get the heater range.
    pub fn get_range(&mut self) -> Result<HeaterRange, InstrumentError> {
        let resp = self.query(&format!("LOOP {}:RANGE?", self.number()))?;
        HeaterRange::from_cmd_str(&resp)
    }

    /// Set the heater range.
    pub fn set_range(&mut self, range: HeaterRange) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("LOOP {}:RANGE {range}", self.number()))
    }

    /// Select the sensor input that this loop regulates on.
    ///
    /// # Arguments
    /// * `input` - Zero-indexed input, i.e., 0 for input A.
    pub fn set_source(&mut self, input: usize) -> Result<(), InstrumentError> {
        let name = match input {
            0 => 'A',
            1 => 'B',
            _ => {
                return Err(InstrumentError::ChannelIndexOutOfRange {
                    idx: input,
                    nof_channels: 2,
                });
            }
        };
        self.sendcmd(&format!("LOOP {}:SOURCE {name}", self.number()))
    }

    /// Get the heater output power in percent of the full range.
    pub fn get_output_power(&mut self) -> Result<f64, InstrumentError> {
        let resp = self.query(&format!("LOOP {}:OUTPWR?", self.number()))?;
        parse_value(&resp)
    }

    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.sendcmd(cmd)
    }

    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.query(cmd)
    }
}

impl<T: InstrumentInterface> Clone for Loop<T> {
    fn clone(&self) -> Self {
        Self {
            idx: self.idx,
            interface: self.interface.clone(),
        }
    }
}

/// Parse a numeric reply, ignoring a trailing unit such as `K` or `%`.
fn parse_value(resp: &str) -> Result<f64, InstrumentError> {
    resp.trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%')
        .trim()
        .parse::<f64>()
        .map_err(|_| InstrumentError::ResponseParseError(resp.to_string()))
}
