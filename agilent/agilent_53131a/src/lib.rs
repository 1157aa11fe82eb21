//! A rust driver for the Agilent 53131A universal counter, set up as a photon counter.
//!
//! Only channel 1 is used. The counter totalizes input events during a timed gate, which is how
//! detector click rates are measured.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use agilent_53131a::Agilent53131A;
//! use benchrs::{PrologixInterface, SerialInterface};
//! use measurements::Voltage;
//!
//! let adapter = SerialInterface::simple("/dev/ttyUSB0", 115200).unwrap();
//! let gpib = PrologixInterface::try_new(adapter, 5).unwrap();
//! let mut counter = Agilent53131A::try_new(gpib).unwrap();
//!
//! counter.basic_setup().unwrap();
//! counter.set_trigger_level(Voltage::from_volts(0.1)).unwrap();
//! let rate = counter.count_rate(Duration::from_millis(500)).unwrap();
//! println!("{rate} counts/s");
//! ```

#![deny(warnings, missing_docs)]

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
    thread,
    time::Duration,
};

use benchrs::{InstrumentError, InstrumentInterface};

use measurements::Voltage;

const GATE_MIN: f64 = 1e-3;
const GATE_MAX: f64 = 1000.0;

/// Trigger slope of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slope {
    /// Count on rising edges.
    Positive,
    /// Count on falling edges.
    Negative,
}

impl Display for Slope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slope::Positive => write!(f, "POS"),
            Slope::Negative => write!(f, "NEG"),
        }
    }
}

/// Input impedance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impedance {
    /// 50 ohm, the usual choice for detector pulses.
    Fifty,
    /// 1 MOhm
    OneMega,
}

impl Display for Impedance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Impedance::Fifty => write!(f, "50"),
            Impedance::OneMega => write!(f, "1E6"),
        }
    }
}

/// Input coupling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coupling {
    /// AC coupling
    Ac,
    /// DC coupling
    Dc,
}

impl Display for Coupling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Coupling::Ac => write!(f, "AC"),
            Coupling::Dc => write!(f, "DC"),
        }
    }
}

/// A rust driver for the Agilent 53131A.
pub struct Agilent53131A<T: InstrumentInterface> {
    interface: Arc<Mutex<T>>,
}

impl<T: InstrumentInterface> Agilent53131A<T> {
    /// Create a new Agilent53131A instance with the given instrument interface.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    pub fn try_new(interface: T) -> Result<Self, InstrumentError> {
        let mut intf = interface;
        intf.set_terminator("\n");
        Ok(Agilent53131A {
            interface: Arc::new(Mutex::new(intf)),
        })
    }

    /// Query the identification string of the instrument.
    pub fn get_name(&mut self) -> Result<String, InstrumentError> {
        self.query("*IDN?")
    }

    /// Configure the counter for totalizing on channel 1.
    ///
    /// Resets the instrument, selects DC coupling with 50 ohm input impedance, turns off the
    /// automatic trigger level, and selects totalize mode with a timed gate of one second.
    pub fn basic_setup(&mut self) -> Result<(), InstrumentError> {
        self.sendcmd("*RST")?;
        self.sendcmd("*CLS")?;
        self.set_coupling(Coupling::Dc)?;
        self.set_impedance(Impedance::Fifty)?;
        self.sendcmd(":EVEN1:LEV:AUTO OFF")?;
        self.sendcmd(":FUNC 'TOT 1'")?;
        self.sendcmd(":TOT:ARM:STAR:SOUR IMM")?;
        self.sendcmd(":TOT:ARM:STOP:SOUR TIM")?;
        self.sendcmd(":TOT:ARM:STOP:TIM 1")
    }

    /// Set the absolute trigger level, -5 V to 5 V.
    pub fn set_trigger_level(&mut self, level: Voltage) -> Result<(), InstrumentError> {
        let value = level.as_volts();
        if !(-5.0..=5.0).contains(&value) {
            return Err(InstrumentError::FloatValueOutOfRange {
                value,
                min: -5.0,
                max: 5.0,
            });
        }
        self.sendcmd(&format!(":EVEN1:LEV:ABS {value}"))
    }

    /// Get the absolute trigger level.
    pub fn get_trigger_level(&mut self) -> Result<Voltage, InstrumentError> {
        let resp = self.query(":EVEN1:LEV:ABS?")?;
        let value = resp
            .parse::<f64>()
            .map_err(|_| InstrumentError::ResponseParseError(resp))?;
        Ok(Voltage::from_volts(value))
    }

    /// Set the trigger slope.
    pub fn set_slope(&mut self, slope: Slope) -> Result<(), InstrumentError> {
        self.sendcmd(&format!(":EVEN1:SLOP {slope}"))
    }

    /// Set the input impedance.
    pub fn set_impedance(&mut self, imp: Impedance) -> Result<(), InstrumentError> {
        self.sendcmd(&format!(":INP1:IMP {imp}"))
    }

    /// Set the input coupling.
    pub fn set_coupling(&mut self, coupling: Coupling) -> Result<(), InstrumentError> {
        self.sendcmd(&format!(":INP1:COUP {coupling}"))
    }

    /// Count input events during a gate of the given length.
    ///
    /// The gate must be between 1 ms and 1000 s. This call blocks for the duration of the gate.
    pub fn timed_count(&mut self, gate: Duration) -> Result<u64, InstrumentError> {
        let secs = gate.as_secs_f64();
        if !(GATE_MIN..=GATE_MAX).contains(&secs) {
            return Err(InstrumentError::FloatValueOutOfRange {
                value: secs,
                min: GATE_MIN,
                max: GATE_MAX,
            });
        }
        self.sendcmd(&format!(":TOT:ARM:STOP:TIM {secs}"))?;
        self.sendcmd(":INIT")?;
        thread::sleep(gate);
        self.sendcmd("*WAI")?;
        let resp = self.query(":FETC?")?;
        let counts = resp
            .parse::<f64>()
            .map_err(|_| InstrumentError::ResponseParseError(resp.clone()))?;
        if counts < 0.0 {
            return Err(InstrumentError::ResponseParseError(resp));
        }
        log::debug!("Counted {counts} events in {secs} s");
        Ok(counts.round() as u64)
    }

    /// Count rate in events per second, measured during a gate of the given length.
    pub fn count_rate(&mut self, gate: Duration) -> Result<f64, InstrumentError> {
        let counts = self.timed_count(gate)?;
        Ok(counts as f64 / gate.as_secs_f64())
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

impl<T: InstrumentInterface> Clone for Agilent53131A<T> {
    fn clone(&self) -> Self {
        Self {
            interface: self.interface.clone(),
        }
    }
}
