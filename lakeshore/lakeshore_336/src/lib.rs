//! A rust driver for the Lakeshore 336 temperature controller.
//!
//! This driver reads the four sensor inputs (A to D) and controls the two heater outputs (control
//! loops 1 and 2): setpoint, heater range, setpoint ramping, and heater output.
//!
//! # Example
//!
//! This example shows the usage via the serial interface.
//! ```no_run
//! use lakeshore_336::{HeaterRange, Lakeshore336, SerialInterfaceLakeshore};
//! use measurements::Temperature;
//!
//! // Get the serial interface for the Lakeshore336 and open it. This interface already sets the
//! // correct parity, stop bits, and data bits for communication with the Lakeshore336.
//! let serial_inst = SerialInterfaceLakeshore::simple("/dev/ttyUSB0").unwrap();
//! let mut inst = Lakeshore336::try_new(serial_inst).unwrap();
//!
//! // Query the name of the instrument
//! println!("{}", inst.get_name().unwrap());
//!
//! // Print the temperature of input A
//! let mut cha = inst.get_channel(0).unwrap();
//! println!("Channel A temperature: {:?}", cha.get_temperature());
//!
//! // Regulate loop 1 to 4.2 K with the heater in the low range
//! let mut loop1 = inst.get_loop(0).unwrap();
//! loop1.set_setpoint(Temperature::from_kelvin(4.2)).unwrap();
//! loop1.set_heater_range(HeaterRange::Low).unwrap();
//! ```

#![deny(warnings, missing_docs)]

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
    time::Duration,
};

use benchrs::{InstrumentError, InstrumentInterface, PortInterface, SerialInterface};

use measurements::Temperature;

use serialport::SerialPort;

/// Number of sensor inputs (A to D).
const NUM_INPUTS: usize = 4;

/// Number of heater outputs that can run a control loop.
const NUM_LOOPS: usize = 2;

/// A SerialInterface for the Lakeshore336.
///
/// Builds a benchrs SerialInterface with the correct parity, stop bits, and data bits for
/// communication with the Lakeshore336.
#[derive(Debug)]
pub struct SerialInterfaceLakeshore {}

impl SerialInterfaceLakeshore {
    /// Try to create a port interface with a simple serial port configuration.
    ///
    /// This is analog to the `simple` method of the `SerialInterface` struct in `benchrs`,
    /// however, it sets the correct parity, stop bits, and data bits for communication with
    /// Lakeshore 336. The default timeout is set to 3 seconds.
    ///
    /// Arguments:
    /// * `port` - The name of the serial port, e.g., `"/dev/ttyUSB0"` or `"COM3"`.
    pub fn simple(
        port: &str,
    ) -> Result<PortInterface<Box<dyn SerialPort>>, InstrumentError> {
        let timeout = Duration::from_secs(3);
        let port = serialport::new(port, 57600)
            .timeout(timeout)
            .parity(serialport::Parity::Odd)
            .data_bits(serialport::DataBits::Seven)
            .stop_bits(serialport::StopBits::One);
        SerialInterface::full(port)
    }
}

/// Heater ranges of the two heater outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterRange {
    /// Heater off.
    Off = 0,
    /// Low range.
    Low = 1,
    /// Medium range.
    Medium = 2,
    /// High range.
    High = 3,
}

impl HeaterRange {
    fn from_cmd_str(value: &str) -> Result<Self, InstrumentError> {
        match value.trim() {
            "0" => Ok(HeaterRange::Off),
            "1" => Ok(HeaterRange::Low),
            "2" => Ok(HeaterRange::Medium),
            "3" => Ok(HeaterRange::High),
            _ => Err(InstrumentError::ResponseParseError(value.to_string())),
        }
    }
}

impl Display for HeaterRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeaterRange::Off => write!(f, "Off"),
            HeaterRange::Low => write!(f, "Low"),
            HeaterRange::Medium => write!(f, "Medium"),
            HeaterRange::High => write!(f, "High"),
        }
    }
}

/// Setpoint ramp configuration of a control loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    /// Whether setpoint ramping is enabled.
    pub enabled: bool,
    /// Ramp rate in kelvin per minute. Allowed are 0.001 to 100, 0 means infinite.
    pub rate_k_per_min: f64,
}

/// A rust driver for the Lakeshore336.
///
/// This driver provides functionality to control the Lakeshore/Lakeshore336.
/// See the top-level documentation for an example on how to use this driver.
pub struct Lakeshore336<T: InstrumentInterface> {
    interface: Arc<Mutex<T>>,
    num_channels: usize,
    num_loops: usize,
}

impl<T: InstrumentInterface> Lakeshore336<T> {
    /// Create a new Lakeshore336 instance with the given instrument interface.
    ///
    /// The Lakeshore 336 terminates all messages with `"\r\n"`.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    pub fn try_new(interface: T) -> Result<Self, InstrumentError> {
        let mut intf = interface;
        intf.set_terminator("\r\n");
        let interface = Arc::new(Mutex::new(intf));

        Ok(Lakeshore336 {
            interface,
            num_channels: NUM_INPUTS,
            num_loops: NUM_LOOPS,
        })
    }

    /// Get a new sensor input channel with a given index.
    ///
    /// Please note that channels are zero indexed, i.e., 0 is input A.
    pub fn get_channel(&mut self, idx: usize) -> Result<Channel<T>, InstrumentError> {
        if idx >= self.num_channels {
            return Err(InstrumentError::ChannelIndexOutOfRange {
                idx,
                nof_channels: self.num_channels,
            });
        }
        Ok(Channel::new(idx, Arc::clone(&self.interface)))
    }

    /// Get a control loop with a given index.
    ///
    /// Loops are zero indexed, i.e., 0 is heater output 1.
    pub fn get_loop(&mut self, idx: usize) -> Result<Loop<T>, InstrumentError> {
        if idx >= self.num_loops {
            return Err(InstrumentError::ChannelIndexOutOfRange {
                idx,
                nof_channels: self.num_loops,
            });
        }
        Ok(Loop::new(idx, Arc::clone(&self.interface)))
    }

    /// Query the name of the instrument
    ///
    /// Returns a comma-separated string of:
    /// * Manufacturer ID
    /// * Model number
    /// * Instrument serial number / Option card serial number
    /// * Firmware version
    pub fn get_name(&mut self) -> Result<String, InstrumentError> {
        self.query("*IDN?")
    }

    /// Turn off all heaters.
    pub fn all_heaters_off(&mut self) -> Result<(), InstrumentError> {
        self.sendcmd("ALLOFF")
    }

    /// Send a command to the instrument.
    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.sendcmd(cmd)
    }

    /// Query the instrument with a command and return the response as a String.
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.query(cmd)
    }
}

impl<T: InstrumentInterface> Clone for Lakeshore336<T> {
    fn clone(&self) -> Self {
        Self {
            interface: self.interface.clone(),
            num_channels: self.num_channels,
            num_loops: self.num_loops,
        }
    }
}

/// Channel structure representing a single sensor input of the Lakeshore336.
///
/// **This structure can only be created through the [`Lakeshore336`] struct.**
pub struct Channel<T: InstrumentInterface> {
    idx: usize,
    interface: Arc<Mutex<T>>,
}

impl<T: InstrumentInterface> Channel<T> {
    /// Get a new channel for the given instrument interface.
    ///
    /// This function can only be called from inside of the [`Lakeshore336`] struct.
    fn new(idx: usize, interface: Arc<Mutex<T>>) -> Self {
        Channel { idx, interface }
    }

    /// Get the current temperature reading of this channel.
    ///
    /// Note: If no sensor is connected, the input it disabled, etc., the instrument returns a
    /// reading of zero kelvin. In this case, we return a sensor error.
    pub fn get_temperature(&mut self) -> Result<Temperature, InstrumentError> {
        let val = parse_f64(&self.query("KRDG?")?)?;
        if val == 0.0 {
            return Err(InstrumentError::SensorError(format!(
                "Channel {} returned 0 K, no sensor connected or input disabled",
                self.idx_mapper()
            )));
        }
        Ok(Temperature::from_kelvin(val))
    }

    /// Get the raw sensor reading of this channel in sensor units (ohms or volts).
    pub fn get_sensor_reading(&mut self) -> Result<f64, InstrumentError> {
        parse_f64(&self.query("SRDG?")?)
    }

    /// Get the input letter of this channel.
    pub fn name(&self) -> char {
        self.idx_mapper()
    }

    /// Map the zero-indexed channel number to the letter indexed channel number.
    fn idx_mapper(&self) -> char {
        match self.idx {
            0 => 'A',
            1 => 'B',
            2 => 'C',
            3 => 'D',
            _ => unreachable!("Channel index out of range"),
        }
    }

    /// Query the instrument with a command for this input and return the response as a String.
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.query(&format!("{cmd} {}", self.idx_mapper()))
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

/// A control loop (heater output) of the Lakeshore336.
///
/// **This structure can only be created through the [`Lakeshore336`] struct.**
pub struct Loop<T: InstrumentInterface> {
    idx: usize,
    interface: Arc<Mutex<T>>,
}

impl<T: InstrumentInterface> Loop<T> {
    fn new(idx: usize, interface: Arc<Mutex<T>>) -> Self {
        Loop { idx, interface }
    }

    /// Get the output number of this loop as used by the instrument (1 or 2).
    pub fn output(&self) -> usize {
        self.idx + 1
    }

    /// Get the control setpoint.
    ///
    /// This assumes that the setpoint unit of the loop is set to kelvin, which is the default.
    pub fn get_setpoint(&mut self) -> Result<Temperature, InstrumentError> {
        let resp = self.query(&format!("SETP? {}", self.output()))?;
        Ok(Temperature::from_kelvin(parse_f64(&resp)?))
    }

    /// Set the control setpoint.
    ///
    /// If ramping is enabled, the setpoint ramps to the new value with the configured rate.
    ///
    /// # Arguments
    /// * `setpoint` - The new setpoint, must be between 0 and 1500 K.
    pub fn set_setpoint(&mut self, setpoint: Temperature) -> Result<(), InstrumentError> {
        let value = setpoint.as_kelvin();
        if !(0.0..=1500.0).contains(&value) {
            return Err(InstrumentError::FloatValueOutOfRange {
                value,
                min: 0.0,
                max: 1500.0,
            });
        }
        self.sendcmd(&format!("SETP {},{value:.4}", self.output()))
    }

    /// Get the heater range of this output.
    pub fn get_heater_range(&mut self) -> Result<HeaterRange, InstrumentError> {
        let resp = self.query(&format!("RANGE? {}", self.output()))?;
        HeaterRange::from_cmd_str(&resp)
    }

    /// Set the heater range of this output. `HeaterRange::Off` turns the heater off.
    pub fn set_heater_range(&mut self, range: HeaterRange) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("RANGE {},{}", self.output(), range as u8))
    }

    /// Get the heater output in percent of the current range.
    pub fn get_heater_output(&mut self) -> Result<f64, InstrumentError> {
        let resp = self.query(&format!("HTR? {}", self.output()))?;
        parse_f64(&resp)
    }

    /// Get the setpoint ramp configuration.
    pub fn get_ramp(&mut self) -> Result<Ramp, InstrumentError> {
        let resp = self.query(&format!("RAMP? {}", self.output()))?;
        let parts = split_check_resp(&resp, 2)?;
        let enabled = match parts[0].trim() {
            "0" => false,
            "1" => true,
            _ => return Err(InstrumentError::ResponseParseError(resp.clone())),
        };
        Ok(Ramp {
            enabled,
            rate_k_per_min: parse_f64(parts[1])?,
        })
    }

    /// Configure setpoint ramping.
    ///
    /// # Arguments
    /// * `ramp` - Ramp configuration. The rate must be between 0 and 100 K/min.
    pub fn set_ramp(&mut self, ramp: Ramp) -> Result<(), InstrumentError> {
        if !(0.0..=100.0).contains(&ramp.rate_k_per_min) {
            return Err(InstrumentError::FloatValueOutOfRange {
                value: ramp.rate_k_per_min,
                min: 0.0,
                max: 100.0,
            });
        }
        self.sendcmd(&format!(
            "RAMP {},{},{:.3}",
            self.output(),
            u8::from(ramp.enabled),
            ramp.rate_k_per_min
        ))
    }

    /// Check if the setpoint is currently ramping.
    pub fn is_ramping(&mut self) -> Result<bool, InstrumentError> {
        let resp = self.query(&format!("RAMPST? {}", self.output()))?;
        match resp.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(InstrumentError::ResponseParseError(resp)),
        }
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

fn parse_f64(resp: &str) -> Result<f64, InstrumentError> {
    resp.trim()
        .parse::<f64>()
        .map_err(|_| InstrumentError::ResponseParseError(resp.to_string()))
}

/// Split a string slice into its parts by commas, check if of correct length, and return the parts
/// as a vector.
fn split_check_resp(resp: &str, exp_len: usize) -> Result<Vec<&str>, InstrumentError> {
    let parts = resp.split(',').collect::<Vec<&str>>();
    if parts.len() != exp_len {
        return Err(InstrumentError::ResponseParseError(resp.to_string()));
    }
    Ok(parts)
}
