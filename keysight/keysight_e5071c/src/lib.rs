//! A rust driver for the Keysight (Agilent) E5071C ENA vector network analyzer.
//!
//! The driver works on channel 1 and trace 1 of the analyzer, which is all a typical resonator
//! or transmission measurement needs. Sweeps are triggered by software and read back as
//! formatted data.
//!
//! # Example
//!
//! The E5071C listens on port 5025 for raw SCPI over TCP/IP.
//! ```no_run
//! use std::time::Duration;
//!
//! use benchrs::TcpIpInterface;
//! use keysight_e5071c::{E5071C, Format, SParameter};
//! use measurements::Frequency;
//!
//! let tcpip = TcpIpInterface::simple("192.168.1.30:5025").unwrap();
//! let mut vna = E5071C::try_new(tcpip).unwrap();
//!
//! vna.set_start_frequency(Frequency::from_hertz(4e9)).unwrap();
//! vna.set_stop_frequency(Frequency::from_hertz(8e9)).unwrap();
//! vna.set_num_points(1601).unwrap();
//! vna.set_measurement(SParameter::S21).unwrap();
//! vna.set_format(Format::LogMag).unwrap();
//! vna.single_sweep(Duration::from_secs(30)).unwrap();
//! let trace = vna.get_trace().unwrap();
//! println!("{} points", trace.frequency.len());
//! ```

#![deny(warnings, missing_docs)]

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use benchrs::{InstrumentError, InstrumentInterface};

use measurements::Frequency;

const FREQ_MIN: f64 = 9e3;
const FREQ_MAX: f64 = 20e9;

/// Scattering parameters that trace 1 can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SParameter {
    /// Reflection at port 1
    S11,
    /// Transmission from port 2 to port 1
    S12,
    /// Transmission from port 1 to port 2
    S21,
    /// Reflection at port 2
    S22,
}

impl Display for SParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SParameter::S11 => "S11",
            SParameter::S12 => "S12",
            SParameter::S21 => "S21",
            SParameter::S22 => "S22",
        };
        write!(f, "{s}")
    }
}

/// Data formats of trace 1.
///
/// The format decides what [`E5071C::get_trace`] returns. Formats with a single value per point
/// (e.g. log magnitude) return zeros as the secondary values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Log magnitude in dB
    LogMag,
    /// Linear magnitude
    LinMag,
    /// Phase in degrees
    Phase,
    /// Unwrapped phase in degrees
    UnwrappedPhase,
    /// Group delay in seconds
    GroupDelay,
    /// Real and imaginary part, polar chart
    Polar,
    /// Real and imaginary part, Smith chart
    Smith,
    /// Real part
    Real,
    /// Imaginary part
    Imaginary,
}

impl Format {
    fn as_str(&self) -> &'static str {
        match self {
            Format::LogMag => "MLOG",
            Format::LinMag => "MLIN",
            Format::Phase => "PHAS",
            Format::UnwrappedPhase => "UPH",
            Format::GroupDelay => "GDEL",
            Format::Polar => "POL",
            Format::Smith => "SMIT",
            Format::Real => "REAL",
            Format::Imaginary => "IMAG",
        }
    }
}

/// One formatted trace as read from the analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct VnaTrace {
    /// Stimulus frequencies in Hz.
    pub frequency: Vec<f64>,
    /// Primary value of each point, e.g., the magnitude in dB for [`Format::LogMag`].
    pub primary: Vec<f64>,
    /// Secondary value of each point, only used by the complex formats.
    pub secondary: Vec<f64>,
}

/// A rust driver for the E5071C.
pub struct E5071C<T: InstrumentInterface> {
    interface: Arc<Mutex<T>>,
}

impl<T: InstrumentInterface> E5071C<T> {
    /// Create a new E5071C instance with the given instrument interface.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    pub fn try_new(interface: T) -> Result<Self, InstrumentError> {
        let mut intf = interface;
        intf.set_terminator("\n");
        Ok(E5071C {
            interface: Arc::new(Mutex::new(intf)),
        })
    }

    /// Query the identification string of the instrument.
    pub fn get_name(&mut self) -> Result<String, InstrumentError> {
        self.query("*IDN?")
    }

    /// Set the start frequency of the sweep.
    pub fn set_start_frequency(&mut self, freq: Frequency) -> Result<(), InstrumentError> {
        let value = check_frequency(freq)?;
        self.sendcmd(&format!(":SENS1:FREQ:STAR {value}"))
    }

    /// Get the start frequency of the sweep.
    pub fn get_start_frequency(&mut self) -> Result<Frequency, InstrumentError> {
        Ok(Frequency::from_hertz(self.query_f64(":SENS1:FREQ:STAR?")?))
    }

    /// Set the stop frequency of the sweep.
    pub fn set_stop_frequency(&mut self, freq: Frequency) -> Result<(), InstrumentError> {
        let value = check_frequency(freq)?;
        self.sendcmd(&format!(":SENS1:FREQ:STOP {value}"))
    }

    /// Get the stop frequency of the sweep.
    pub fn get_stop_frequency(&mut self) -> Result<Frequency, InstrumentError> {
        Ok(Frequency::from_hertz(self.query_f64(":SENS1:FREQ:STOP?")?))
    }

    /// Set the sweep range by center frequency and span.
    pub fn set_center_span(
        &mut self,
        center: Frequency,
        span: Frequency,
    ) -> Result<(), InstrumentError> {
        let center = check_frequency(center)?;
        let span = span.as_hertz();
        if span < 0.0 || center - span / 2.0 < FREQ_MIN || center + span / 2.0 > FREQ_MAX {
            return Err(InstrumentError::FloatValueOutOfRange {
                value: span,
                min: 0.0,
                max: 2.0 * (center - FREQ_MIN).min(FREQ_MAX - center),
            });
        }
        self.sendcmd(&format!(":SENS1:FREQ:CENT {center}"))?;
        self.sendcmd(&format!(":SENS1:FREQ:SPAN {span}"))
    }

    /// Set the number of points per sweep, 2 to 20001.
    pub fn set_num_points(&mut self, points: u32) -> Result<(), InstrumentError> {
        if !(2..=20001).contains(&points) {
            return Err(InstrumentError::IntValueOutOfRange {
                value: points.into(),
                min: 2,
                max: 20001,
            });
        }
        self.sendcmd(&format!(":SENS1:SWE:POIN {points}"))
    }

    /// Get the number of points per sweep.
    pub fn get_num_points(&mut self) -> Result<u32, InstrumentError> {
        let resp = self.query(":SENS1:SWE:POIN?")?;
        resp.trim_start_matches('+')
            .parse::<u32>()
            .map_err(|_| InstrumentError::ResponseParseError(resp))
    }

    /// Set the source power in dBm, -55 to 10 dBm.
    pub fn set_power(&mut self, dbm: f64) -> Result<(), InstrumentError> {
        if !(-55.0..=10.0).contains(&dbm) {
            return Err(InstrumentError::FloatValueOutOfRange {
                value: dbm,
                min: -55.0,
                max: 10.0,
            });
        }
        self.sendcmd(&format!(":SOUR1:POW {dbm}"))
    }

    /// Get the source power in dBm.
    pub fn get_power(&mut self) -> Result<f64, InstrumentError> {
        self.query_f64(":SOUR1:POW?")
    }

    /// Set the IF bandwidth, 10 Hz to 1.5 MHz.
    pub fn set_if_bandwidth(&mut self, bw: Frequency) -> Result<(), InstrumentError> {
        let value = bw.as_hertz();
        if !(10.0..=1.5e6).contains(&value) {
            return Err(InstrumentError::FloatValueOutOfRange {
                value,
                min: 10.0,
                max: 1.5e6,
            });
        }
        self.sendcmd(&format!(":SENS1:BAND {value}"))
    }

    /// Select the S-parameter measured by trace 1.
    pub fn set_measurement(&mut self, param: SParameter) -> Result<(), InstrumentError> {
        self.sendcmd(&format!(":CALC1:PAR1:DEF {param}"))
    }

    /// Select the data format of trace 1.
    pub fn set_format(&mut self, format: Format) -> Result<(), InstrumentError> {
        self.sendcmd(&format!(":CALC1:FORM {}", format.as_str()))
    }

    /// Set sweep averaging. A count of zero turns averaging off.
    ///
    /// # Arguments
    /// * `count` - Number of sweeps to average, 0 to 999.
    pub fn set_averaging(&mut self, count: u32) -> Result<(), InstrumentError> {
        if count > 999 {
            return Err(InstrumentError::IntValueOutOfRange {
                value: count.into(),
                min: 0,
                max: 999,
            });
        }
        if count == 0 {
            return self.sendcmd(":SENS1:AVER OFF");
        }
        self.sendcmd(&format!(":SENS1:AVER:COUN {count}"))?;
        self.sendcmd(":SENS1:AVER ON")?;
        self.sendcmd(":TRIG:AVER ON")
    }

    /// Turn the RF output on or off.
    pub fn set_output(&mut self, on: bool) -> Result<(), InstrumentError> {
        let state = if on { "ON" } else { "OFF" };
        self.sendcmd(&format!(":OUTP {state}"))
    }

    /// Trigger a single sweep (or a full set of averages) and wait until it is done.
    ///
    /// Sweeps can take much longer than the interface timeout, so the operation complete query is
    /// read repeatedly until `max_wait` has passed.
    pub fn single_sweep(&mut self, max_wait: Duration) -> Result<(), InstrumentError> {
        self.sendcmd(":INIT1:CONT ON")?;
        self.sendcmd(":TRIG:SOUR BUS")?;
        self.sendcmd(":SENS1:AVER:CLE")?;
        self.sendcmd(":TRIG:SING")?;

        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        intf.sendcmd("*OPC?")?;
        let tic = Instant::now();
        let resp = loop {
            match intf.read_until_terminator() {
                Ok(resp) => break resp,
                Err(InstrumentError::Timeout(_)) if tic.elapsed() < max_wait => {
                    log::debug!("Sweep still running after {:?}", tic.elapsed());
                }
                Err(InstrumentError::Timeout(_)) => {
                    return Err(InstrumentError::TimeoutQuery {
                        query: "*OPC?".to_string(),
                        timeout: max_wait,
                    });
                }
                Err(e) => return Err(e),
            }
        };
        match resp.trim_start_matches('+') {
            "1" => Ok(()),
            _ => Err(InstrumentError::ResponseParseError(resp)),
        }
    }

    /// Get the stimulus frequencies of the current sweep in Hz.
    pub fn get_frequencies(&mut self) -> Result<Vec<f64>, InstrumentError> {
        let resp = self.query(":SENS1:FREQ:DATA?")?;
        parse_list(&resp)
    }

    /// Read the formatted data of trace 1 together with the stimulus frequencies.
    pub fn get_trace(&mut self) -> Result<VnaTrace, InstrumentError> {
        let frequency = self.get_frequencies()?;
        let resp = self.query(":CALC1:DATA:FDAT?")?;
        let data = parse_list(&resp)?;
        if data.len() != 2 * frequency.len() {
            return Err(InstrumentError::ResponseParseError(format!(
                "Expected {} values for {} points, got {}",
                2 * frequency.len(),
                frequency.len(),
                data.len()
            )));
        }
        let (primary, secondary): (Vec<f64>, Vec<f64>) =
            data.chunks_exact(2).map(|c| (c[0], c[1])).unzip();
        Ok(VnaTrace {
            frequency,
            primary,
            secondary,
        })
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

impl<T: InstrumentInterface> Clone for E5071C<T> {
    fn clone(&self) -> Self {
        Self {
            interface: self.interface.clone(),
        }
    }
}

fn check_frequency(freq: Frequency) -> Result<f64, InstrumentError> {
    let value = freq.as_hertz();
    if !(FREQ_MIN..=FREQ_MAX).contains(&value) {
        return Err(InstrumentError::FloatValueOutOfRange {
            value,
            min: FREQ_MIN,
            max: FREQ_MAX,
        });
    }
    Ok(value)
}

/// Parse a comma separated list of ASCII numbers.
fn parse_list(resp: &str) -> Result<Vec<f64>, InstrumentError> {
    resp.split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| InstrumentError::ResponseParseError(resp.to_string()))
        })
        .collect()
}
