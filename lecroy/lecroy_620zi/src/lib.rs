//! A rust driver for the Teledyne LeCroy WaveRunner 620Zi oscilloscope.
//!
//! Besides the vertical and horizontal setup, the driver gives access to the measurement
//! parameters P1 to P8. These are configured on the scope itself (e.g. the amplitude or a level
//! crossing of a detector pulse) and read back here, either as the latest value, as their running
//! statistics, or as a series of single shot acquisitions.
//!
//! # Example
//!
//! Here the scope is reached through a TCP/IP socket. With a VISA installation, the interface from
//! `benchrs::VisaInterface` works the same way.
//! ```no_run
//! use benchrs::TcpIpInterface;
//! use lecroy_620zi::{Lecroy620Zi, TriggerMode};
//! use measurements::Voltage;
//!
//! let tcpip = TcpIpInterface::simple("192.168.1.20:5025").unwrap();
//! let mut scope = Lecroy620Zi::try_new(tcpip).unwrap();
//!
//! let mut c1 = scope.get_channel(0).unwrap();
//! c1.set_vertical_scale(Voltage::from_volts(0.05)).unwrap();
//! scope.set_trigger_mode(TriggerMode::Normal).unwrap();
//!
//! let wf = c1.get_waveform().unwrap();
//! println!("{} samples", wf.len());
//! println!("P1 mean: {:?}", scope.get_parameter_mean(1));
//! ```

#![deny(warnings, missing_docs)]

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use benchrs::{InstrumentError, InstrumentInterface};

use measurements::Voltage;

mod waveform;

pub use waveform::Waveform;

const NUM_CHANNELS: usize = 4;
const NUM_PARAMETERS: u8 = 8;

/// Trigger modes of the oscilloscope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// Trigger on events, acquire without trigger after a timeout.
    Auto,
    /// Trigger on every event.
    Normal,
    /// Trigger once, then stop.
    Single,
    /// Stop acquiring.
    Stop,
}

impl TriggerMode {
    fn as_str(&self) -> &'static str {
        match self {
            TriggerMode::Auto => "AUTO",
            TriggerMode::Normal => "NORM",
            TriggerMode::Single => "SINGLE",
            TriggerMode::Stop => "STOP",
        }
    }

    fn from_cmd_str(value: &str) -> Result<Self, InstrumentError> {
        match value.trim() {
            "AUTO" => Ok(TriggerMode::Auto),
            "NORM" | "NORMAL" => Ok(TriggerMode::Normal),
            "SINGLE" => Ok(TriggerMode::Single),
            "STOP" => Ok(TriggerMode::Stop),
            _ => Err(InstrumentError::ResponseParseError(value.to_string())),
        }
    }
}

impl Display for TriggerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TriggerMode::Auto => "Auto",
            TriggerMode::Normal => "Normal",
            TriggerMode::Single => "Single",
            TriggerMode::Stop => "Stop",
        };
        write!(f, "{s}")
    }
}

/// A rust driver for the LeCroy 620Zi.
pub struct Lecroy620Zi<T: InstrumentInterface> {
    interface: Arc<Mutex<T>>,
    num_channels: usize,
}

impl<T: InstrumentInterface> Lecroy620Zi<T> {
    /// Create a new Lecroy620Zi instance with the given instrument interface.
    ///
    /// This turns off the command headers of the replies, which the rest of the driver relies on.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    pub fn try_new(interface: T) -> Result<Self, InstrumentError> {
        let mut intf = interface;
        intf.set_terminator("\n");
        intf.sendcmd("COMM_HEADER OFF")?;
        Ok(Lecroy620Zi {
            interface: Arc::new(Mutex::new(intf)),
            num_channels: NUM_CHANNELS,
        })
    }

    /// Get a new channel with a given index. Index 0 is channel C1.
    pub fn get_channel(&mut self, idx: usize) -> Result<Channel<T>, InstrumentError> {
        if idx >= self.num_channels {
            return Err(InstrumentError::ChannelIndexOutOfRange {
                idx,
                nof_channels: self.num_channels,
            });
        }
        Ok(Channel::new(idx, Arc::clone(&self.interface)))
    }

    /// Query the identification string of the instrument.
    pub fn get_name(&mut self) -> Result<String, InstrumentError> {
        self.query("*IDN?")
    }

    /// Set the horizontal scale in seconds per division.
    pub fn set_horizontal_scale(&mut self, sec_per_div: f64) -> Result<(), InstrumentError> {
        if !(20e-12..=1000.0).contains(&sec_per_div) {
            return Err(InstrumentError::FloatValueOutOfRange {
                value: sec_per_div,
                min: 20e-12,
                max: 1000.0,
            });
        }
        self.sendcmd(&format!("TIME_DIV {sec_per_div:e}"))
    }

    /// Get the horizontal scale in seconds per division.
    pub fn get_horizontal_scale(&mut self) -> Result<f64, InstrumentError> {
        self.query_f64("TIME_DIV?")
    }

    /// Set the trigger mode.
    pub fn set_trigger_mode(&mut self, mode: TriggerMode) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("TRIG_MODE {}", mode.as_str()))
    }

    /// Get the trigger mode.
    pub fn get_trigger_mode(&mut self) -> Result<TriggerMode, InstrumentError> {
        let resp = self.query("TRIG_MODE?")?;
        TriggerMode::from_cmd_str(&resp)
    }

    /// Trigger on a rising or falling edge of the given channel. Index 0 is channel C1.
    pub fn set_trigger_source(&mut self, channel: usize) -> Result<(), InstrumentError> {
        self.check_channel(channel)?;
        self.sendcmd(&format!("TRIG_SELECT EDGE,SR,C{}", channel + 1))
    }

    /// Set the trigger level of the given channel. Index 0 is channel C1.
    pub fn set_trigger_level(
        &mut self,
        channel: usize,
        level: Voltage,
    ) -> Result<(), InstrumentError> {
        self.check_channel(channel)?;
        self.sendcmd(&format!("C{}:TRIG_LEVEL {}", channel + 1, level.as_volts()))
    }

    /// Clear all sweeps, which resets the statistics of all measurement parameters.
    pub fn clear_sweeps(&mut self) -> Result<(), InstrumentError> {
        self.sendcmd("CLEAR_SWEEPS")
    }

    /// Arm the scope for a single acquisition and wait until it has triggered.
    ///
    /// The scope waits at most `timeout` for a trigger. Fails with a timeout if nothing
    /// triggered, the scope is left in stopped mode then.
    pub fn acquire_single(&mut self, timeout: Duration) -> Result<(), InstrumentError> {
        self.sendcmd("ARM")?;
        self.sendcmd(&format!("WAIT {}", timeout.as_secs_f64()))?;
        let tic = Instant::now();
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.sendcmd("*OPC?")?;
        let resp = loop {
            match intf.read_until_terminator() {
                Ok(resp) => break resp,
                Err(InstrumentError::Timeout(_)) if tic.elapsed() < timeout => {}
                Err(InstrumentError::Timeout(_)) => {
                    return Err(InstrumentError::TimeoutQuery {
                        query: "*OPC?".to_string(),
                        timeout,
                    });
                }
                Err(e) => return Err(e),
            }
        };
        if resp != "1" {
            return Err(InstrumentError::ResponseParseError(resp));
        }
        Ok(())
    }

    /// Get the latest value of measurement parameter `p` (1 to 8).
    pub fn get_parameter_value(&mut self, p: u8) -> Result<f64, InstrumentError> {
        self.vbs_f64(p, "Out.Result.Value")
    }

    /// Get the mean of measurement parameter `p` (1 to 8) over all sweeps since the last clear.
    pub fn get_parameter_mean(&mut self, p: u8) -> Result<f64, InstrumentError> {
        self.vbs_f64(p, "Mean.Result.Value")
    }

    /// Get the number of sweeps that went into the statistics of parameter `p` (1 to 8).
    pub fn get_num_sweeps(&mut self, p: u8) -> Result<u64, InstrumentError> {
        let value = self.vbs_f64(p, "Num.Result.Value")?;
        Ok(value.max(0.0).round() as u64)
    }

    /// Poll until parameter `p` has accumulated at least `n` sweeps.
    ///
    /// Returns the number of sweeps that were reached.
    pub fn wait_for_sweeps(
        &mut self,
        p: u8,
        n: u64,
        poll: Duration,
        timeout: Duration,
    ) -> Result<u64, InstrumentError> {
        let tic = Instant::now();
        loop {
            let sweeps = self.get_num_sweeps(p)?;
            if sweeps >= n {
                return Ok(sweeps);
            }
            if tic.elapsed() >= timeout {
                return Err(InstrumentError::Timeout(timeout));
            }
            log::debug!("P{p}: {sweeps} of {n} sweeps");
            thread::sleep(poll);
        }
    }

    /// Collect `n` values of parameter `p` from `n` single shot acquisitions.
    ///
    /// Each acquisition waits at most `timeout` for a trigger.
    pub fn get_parameter_values(
        &mut self,
        p: u8,
        n: usize,
        timeout: Duration,
    ) -> Result<Vec<f64>, InstrumentError> {
        check_parameter(p)?;
        let mut values = Vec::with_capacity(n);
        for _ in 0..n {
            self.acquire_single(timeout)?;
            values.push(self.get_parameter_value(p)?);
        }
        Ok(values)
    }

    fn check_channel(&self, channel: usize) -> Result<(), InstrumentError> {
        if channel >= self.num_channels {
            return Err(InstrumentError::ChannelIndexOutOfRange {
                idx: channel,
                nof_channels: self.num_channels,
            });
        }
        Ok(())
    }

    /// Read a result of a measurement parameter through the automation interface.
    fn vbs_f64(&mut self, p: u8, path: &str) -> Result<f64, InstrumentError> {
        check_parameter(p)?;
        self.query_f64(&format!("VBS? 'return=app.Measure.P{p}.{path}'"))
    }

    fn query_f64(&mut self, cmd: &str) -> Result<f64, InstrumentError> {
        let resp = self.query(cmd)?;
        resp.parse::<f64>()
            .map_err(|_| InstrumentError::ResponseParseError(resp))
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

impl<T: InstrumentInterface> Clone for Lecroy620Zi<T> {
    fn clone(&self) -> Self {
        Self {
            interface: self.interface.clone(),
            num_channels: self.num_channels,
        }
    }
}

/// An input channel of the Lecroy620Zi.
///
/// **This structure can only be created through the [`Lecroy620Zi`] struct.**
pub struct Channel<T: InstrumentInterface> {
    idx: usize,
    interface: Arc<Mutex<T>>,
}

impl<T: InstrumentInterface> Channel<T> {
    fn new(idx: usize, interface: Arc<Mutex<T>>) -> Self {
        Channel { idx, interface }
    }

    /// Name of the channel as used by the scope, e.g. `C1`.
    pub fn name(&self) -> String {
        format!("C{}", self.idx + 1)
    }

    /// Set the vertical scale in volts per division, 1 mV/div to 10 V/div.
    pub fn set_vertical_scale(&mut self, per_div: Voltage) -> Result<(), InstrumentError> {
        let value = per_div.as_volts();
        if !(1e-3..=10.0).contains(&value) {
            return Err(InstrumentError::FloatValueOutOfRange {
                value,
                min: 1e-3,
                max: 10.0,
            });
        }
        self.sendcmd(&format!("{}:VOLT_DIV {value}", self.name()))
    }

    /// Get the vertical scale in volts per division.
    pub fn get_vertical_scale(&mut self) -> Result<Voltage, InstrumentError> {
        let value = self.query_f64(&format!("{}:VOLT_DIV?", self.name()))?;
        Ok(Voltage::from_volts(value))
    }

    /// Set the vertical offset.
    pub fn set_vertical_offset(&mut self, offset: Voltage) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("{}:OFFSET {}", self.name(), offset.as_volts()))
    }

    /// Get the vertical offset.
    pub fn get_vertical_offset(&mut self) -> Result<Voltage, InstrumentError> {
        let value = self.query_f64(&format!("{}:OFFSET?", self.name()))?;
        Ok(Voltage::from_volts(value))
    }

    /// Read the displayed waveform of this channel.
    ///
    /// The samples are transferred as ASCII, which is slow for long records but needs no
    /// knowledge of the binary descriptor.
    pub fn get_waveform(&mut self) -> Result<Waveform, InstrumentError> {
        let name = self.name();
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");

        let resp = intf.query(&format!("{name}:INSPECT? HORIZ_INTERVAL"))?;
        let resp = waveform::read_quoted_block(&mut *intf, resp)?;
        let interval = waveform::parse_variable(&resp)?;

        let resp = intf.query(&format!("{name}:INSPECT? HORIZ_OFFSET"))?;
        let resp = waveform::read_quoted_block(&mut *intf, resp)?;
        let offset = waveform::parse_variable(&resp)?;

        let first = intf.query(&format!("{name}:INSPECT? SIMPLE"))?;
        let block = waveform::read_quoted_block(&mut *intf, first)?;
        let voltage = waveform::parse_simple(&block)?;
        log::debug!("Read {} samples from {name}", voltage.len());

        Ok(Waveform::from_samples(voltage, interval, offset))
    }

    fn query_f64(&mut self, cmd: &str) -> Result<f64, InstrumentError> {
        let resp = self.query(cmd)?;
        resp.parse::<f64>()
            .map_err(|_| InstrumentError::ResponseParseError(resp))
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

impl<T: InstrumentInterface> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            idx: self.idx,
            interface: self.interface.clone(),
        }
    }
}

fn check_parameter(p: u8) -> Result<(), InstrumentError> {
    if !(1..=NUM_PARAMETERS).contains(&p) {
        return Err(InstrumentError::IntValueOutOfRange {
            value: p.into(),
            min: 1,
            max: NUM_PARAMETERS.into(),
        });
    }
    Ok(())
}
