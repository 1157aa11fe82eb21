//! A rust driver for the Agilent 33250A 80 MHz function / arbitrary waveform generator.
//!
//! The generator has a single output. This driver sets the waveform shape, frequency, amplitude,
//! offset, output load, burst mode, and uploads arbitrary waveforms into volatile memory.
//!
//! # Example
//!
//! The 33250A is usually reached over GPIB, here through a Prologix GPIB-USB adapter.
//! ```no_run
//! use agilent_33250a::{Agilent33250A, Function, Load};
//! use benchrs::{PrologixInterface, SerialInterface};
//! use measurements::{Frequency, Voltage};
//!
//! let adapter = SerialInterface::simple("/dev/ttyUSB0", 115200).unwrap();
//! let gpib = PrologixInterface::try_new(adapter, 10).unwrap();
//! let mut awg = Agilent33250A::try_new(gpib).unwrap();
//!
//! // A 100 Hz triangle of 1 Vpp into a high impedance load.
//! awg.set_load(Load::HighZ).unwrap();
//! awg.set_function(Function::Ramp).unwrap();
//! awg.set_ramp_symmetry(50.0).unwrap();
//! awg.set_frequency(Frequency::from_hertz(100.0)).unwrap();
//! awg.set_vpp(Voltage::from_volts(1.0)).unwrap();
//! awg.set_output(true).unwrap();
//! ```

#![deny(warnings, missing_docs)]

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
    time::Duration,
};

use benchrs::{InstrumentError, InstrumentInterface};

use measurements::{Frequency, Voltage};

const FREQ_MIN: f64 = 1e-6;
const FREQ_MAX: f64 = 80e6;
const VPP_MIN: f64 = 0.01;
const VPP_MAX: f64 = 10.0;
const VOLT_LIMIT: f64 = 5.0;
const ARB_MAX_POINTS: usize = 65536;

/// Waveform shapes of the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// Sine wave
    Sine,
    /// Square wave
    Square,
    /// Ramp / triangle, shape set by the ramp symmetry
    Ramp,
    /// Pulse
    Pulse,
    /// Gaussian noise
    Noise,
    /// DC voltage, level set by the offset
    Dc,
    /// Arbitrary waveform from the selected user memory
    User,
}

impl Function {
    fn as_str(&self) -> &'static str {
        match self {
            Function::Sine => "SIN",
            Function::Square => "SQU",
            Function::Ramp => "RAMP",
            Function::Pulse => "PULS",
            Function::Noise => "NOIS",
            Function::Dc => "DC",
            Function::User => "USER",
        }
    }

    fn from_cmd_str(value: &str) -> Result<Self, InstrumentError> {
        match value.trim().trim_matches('"') {
            "SIN" => Ok(Function::Sine),
            "SQU" => Ok(Function::Square),
            "RAMP" => Ok(Function::Ramp),
            "PULS" => Ok(Function::Pulse),
            "NOIS" => Ok(Function::Noise),
            "DC" => Ok(Function::Dc),
            "USER" => Ok(Function::User),
            _ => Err(InstrumentError::ResponseParseError(value.to_string())),
        }
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Function::Sine => "Sine",
            Function::Square => "Square",
            Function::Ramp => "Ramp",
            Function::Pulse => "Pulse",
            Function::Noise => "Noise",
            Function::Dc => "DC",
            Function::User => "User",
        };
        write!(f, "{s}")
    }
}

/// The load the generator expects at its output.
///
/// The displayed and programmed amplitudes assume this load. With a 50 ohm setting, the voltage
/// across a high impedance input is twice the programmed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Load {
    /// A load resistance in ohms, 1 to 10 kOhm.
    Ohms(f64),
    /// High impedance load.
    HighZ,
}

/// Trigger sources for burst mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// Trigger continuously.
    Immediate,
    /// Trigger on the rear panel trigger input.
    External,
    /// Trigger by software, see [`Agilent33250A::trigger`].
    Bus,
}

impl TriggerSource {
    fn as_str(&self) -> &'static str {
        match self {
            TriggerSource::Immediate => "IMM",
            TriggerSource::External => "EXT",
            TriggerSource::Bus => "BUS",
        }
    }
}

/// A rust driver for the Agilent 33250A.
///
/// See the top-level documentation for an example on how to use this driver.
pub struct Agilent33250A<T: InstrumentInterface> {
    interface: Arc<Mutex<T>>,
}

impl<T: InstrumentInterface> Agilent33250A<T> {
    /// Create a new Agilent33250A instance with the given instrument interface.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    pub fn try_new(interface: T) -> Result<Self, InstrumentError> {
        let mut intf = interface;
        intf.set_terminator("\n");
        Ok(Agilent33250A {
            interface: Arc::new(Mutex::new(intf)),
        })
    }

    /// Query the identification string of the instrument.
    pub fn get_name(&mut self) -> Result<String, InstrumentError> {
        self.query("*IDN?")
    }

    /// Reset the instrument to its factory default state. The output is turned off.
    pub fn reset(&mut self) -> Result<(), InstrumentError> {
        self.sendcmd("*RST")
    }

    /// Get the current waveform shape.
    pub fn get_function(&mut self) -> Result<Function, InstrumentError> {
        let resp = self.query("FUNC?")?;
        Function::from_cmd_str(&resp)
    }

    /// Set the waveform shape.
    pub fn set_function(&mut self, func: Function) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("FUNC {}", func.as_str()))
    }

    /// Get the output frequency.
    pub fn get_frequency(&mut self) -> Result<Frequency, InstrumentError> {
        Ok(Frequency::from_hertz(self.query_f64("FREQ?")?))
    }

    /// Set the output frequency, 1 uHz to 80 MHz.
    ///
    /// The upper limit depends on the waveform shape, the instrument clips values it cannot reach.
    pub fn set_frequency(&mut self, freq: Frequency) -> Result<(), InstrumentError> {
        let value = freq.as_hertz();
        check_range(value, FREQ_MIN, FREQ_MAX)?;
        self.sendcmd(&format!("FREQ {value}"))
    }

    /// Get the peak to peak amplitude.
    pub fn get_vpp(&mut self) -> Result<Voltage, InstrumentError> {
        Ok(Voltage::from_volts(self.query_f64("VOLT?")?))
    }

    /// Set the peak to peak amplitude, 10 mVpp to 10 Vpp.
    pub fn set_vpp(&mut self, vpp: Voltage) -> Result<(), InstrumentError> {
        let value = vpp.as_volts();
        check_range(value, VPP_MIN, VPP_MAX)?;
        self.sendcmd(&format!("VOLT {value}"))
    }

    /// Get the DC offset.
    pub fn get_offset(&mut self) -> Result<Voltage, InstrumentError> {
        Ok(Voltage::from_volts(self.query_f64("VOLT:OFFS?")?))
    }

    /// Set the DC offset, -5 V to 5 V.
    ///
    /// In [`Function::Dc`] mode, the offset is the output voltage.
    pub fn set_offset(&mut self, offset: Voltage) -> Result<(), InstrumentError> {
        let value = offset.as_volts();
        check_range(value, -VOLT_LIMIT, VOLT_LIMIT)?;
        self.sendcmd(&format!("VOLT:OFFS {value}"))
    }

    /// Set the high and low levels of the waveform instead of amplitude and offset.
    ///
    /// Both levels must be within -5 V to 5 V and `high` must be above `low`.
    pub fn set_vhighlow(&mut self, high: Voltage, low: Voltage) -> Result<(), InstrumentError> {
        let high = high.as_volts();
        let low = low.as_volts();
        check_range(high, -VOLT_LIMIT, VOLT_LIMIT)?;
        check_range(low, -VOLT_LIMIT, VOLT_LIMIT)?;
        if high <= low {
            return Err(InstrumentError::InvalidArgument(format!(
                "High level {high} V must be above low level {low} V."
            )));
        }
        self.sendcmd(&format!("VOLT:HIGH {high}"))?;
        self.sendcmd(&format!("VOLT:LOW {low}"))
    }

    /// Set the expected output load.
    pub fn set_load(&mut self, load: Load) -> Result<(), InstrumentError> {
        match load {
            Load::Ohms(ohms) => {
                check_range(ohms, 1.0, 10e3)?;
                self.sendcmd(&format!("OUTP:LOAD {ohms}"))
            }
            Load::HighZ => self.sendcmd("OUTP:LOAD INF"),
        }
    }

    /// Check if the output is on.
    pub fn get_output(&mut self) -> Result<bool, InstrumentError> {
        parse_bool(&self.query("OUTP?")?)
    }

    /// Turn the output on or off.
    pub fn set_output(&mut self, on: bool) -> Result<(), InstrumentError> {
        let state = if on { "ON" } else { "OFF" };
        self.sendcmd(&format!("OUTP {state}"))
    }

    /// Set the symmetry of the ramp waveform in percent.
    ///
    /// 100 % is a rising sawtooth, 50 % a symmetric triangle.
    pub fn set_ramp_symmetry(&mut self, percent: f64) -> Result<(), InstrumentError> {
        check_range(percent, 0.0, 100.0)?;
        self.sendcmd(&format!("FUNC:RAMP:SYMM {percent}"))
    }

    /// Set the pulse width of the pulse waveform, 8 ns to 2000 s.
    pub fn set_pulse_width(&mut self, width: Duration) -> Result<(), InstrumentError> {
        let value = width.as_secs_f64();
        check_range(value, 8e-9, 2000.0)?;
        self.sendcmd(&format!("PULS:WIDT {value}"))
    }

    /// Set where burst triggers come from.
    pub fn set_trigger_source(&mut self, source: TriggerSource) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("TRIG:SOUR {}", source.as_str()))
    }

    /// Enable triggered burst mode with the given number of cycles per trigger.
    ///
    /// # Arguments
    /// * `cycles` - Number of cycles per burst, 1 to 1000000.
    pub fn set_burst(&mut self, cycles: u32) -> Result<(), InstrumentError> {
        if !(1..=1_000_000).contains(&cycles) {
            return Err(InstrumentError::IntValueOutOfRange {
                value: cycles.into(),
                min: 1,
                max: 1_000_000,
            });
        }
        self.sendcmd("BURS:MODE TRIG")?;
        self.sendcmd(&format!("BURS:NCYC {cycles}"))?;
        self.sendcmd("BURS:STAT ON")
    }

    /// Disable burst mode and return to continuous output.
    pub fn disable_burst(&mut self) -> Result<(), InstrumentError> {
        self.sendcmd("BURS:STAT OFF")
    }

    /// Send a software trigger. Requires [`TriggerSource::Bus`].
    pub fn trigger(&mut self) -> Result<(), InstrumentError> {
        self.sendcmd("*TRG")
    }

    /// Upload an arbitrary waveform into volatile memory and select it as output.
    ///
    /// The samples are normalized: -1 is the low level and 1 the high level of the output. The
    /// waveform is replayed at the set frequency, i.e., the whole array makes up one period.
    ///
    /// # Arguments
    /// * `samples` - 1 to 65536 points within -1 to 1.
    pub fn set_arb_waveform(&mut self, samples: &[f64]) -> Result<(), InstrumentError> {
        if samples.is_empty() || samples.len() > ARB_MAX_POINTS {
            return Err(InstrumentError::IntValueOutOfRange {
                value: samples.len() as i64,
                min: 1,
                max: ARB_MAX_POINTS as i64,
            });
        }
        for &value in samples {
            check_range(value, -1.0, 1.0)?;
        }
        let data = samples
            .iter()
            .map(|v| format!("{v:.4}"))
            .collect::<Vec<_>>()
            .join(", ");
        log::debug!("Uploading arbitrary waveform with {} points", samples.len());
        self.sendcmd(&format!("DATA VOLATILE, {data}"))?;
        self.sendcmd("FUNC:USER VOLATILE")?;
        self.sendcmd("FUNC USER")
    }

    /// Query the instrument and parse the reply as a floating point value.
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

impl<T: InstrumentInterface> Clone for Agilent33250A<T> {
    fn clone(&self) -> Self {
        Self {
            interface: self.interface.clone(),
        }
    }
}

fn check_range(value: f64, min: f64, max: f64) -> Result<(), InstrumentError> {
    if !(min..=max).contains(&value) {
        return Err(InstrumentError::FloatValueOutOfRange { value, min, max });
    }
    Ok(())
}

fn parse_bool(resp: &str) -> Result<bool, InstrumentError> {
    match resp.trim() {
        "0" | "OFF" => Ok(false),
        "1" | "ON" => Ok(true),
        _ => Err(InstrumentError::ResponseParseError(resp.to_string())),
    }
}
