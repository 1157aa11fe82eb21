//! A rust driver for the JDSU HA9 programmable optical attenuator.
//!
//! # Example
//!
//! ```no_run
//! use benchrs::{PrologixInterface, SerialInterface};
//! use jdsu_ha9::JdsuHa9;
//! use measurements::Length;
//!
//! let adapter = SerialInterface::simple("/dev/ttyUSB0", 115200).unwrap();
//! let gpib = PrologixInterface::try_new(adapter, 7).unwrap();
//! let mut att = JdsuHa9::try_new(gpib).unwrap();
//!
//! att.set_wavelength(Length::from_meters(1550e-9)).unwrap();
//! att.set_attenuation(30.0).unwrap();
//! att.set_beam_block(false).unwrap();
//! ```

#![deny(warnings, missing_docs)]

use std::sync::{Arc, Mutex};

use benchrs::{InstrumentError, InstrumentInterface};

use measurements::Length;

const ATT_MAX: f64 = 100.0;
const WVL_MIN_NM: f64 = 1200.0;
const WVL_MAX_NM: f64 = 1700.0;

/// A rust driver for the JDSU HA9.
pub struct JdsuHa9<T: InstrumentInterface> {
    interface: Arc<Mutex<T>>,
}

impl<T: InstrumentInterface> JdsuHa9<T> {
    /// Create a new JdsuHa9 instance with the given instrument interface.
    ///
    /// # Arguments
    /// * `interface` - An instrument interface that implements the [`InstrumentInterface`] trait.
    pub fn try_new(interface: T) -> Result<Self, InstrumentError> {
        let mut intf = interface;
        intf.set_terminator("\n");
        Ok(JdsuHa9 {
            interface: Arc::new(Mutex::new(intf)),
        })
    }

    /// Query the identification string of the instrument.
    pub fn get_name(&mut self) -> Result<String, InstrumentError> {
        self.query("IDN?")
    }

    /// Set the attenuation in dB, 0 to 100 dB.
    ///
    /// The value includes the calibration offset, see [`JdsuHa9::set_calibration`].
    pub fn set_attenuation(&mut self, db: f64) -> Result<(), InstrumentError> {
        if !(0.0..=ATT_MAX).contains(&db) {
            return Err(InstrumentError::FloatValueOutOfRange {
                value: db,
                min: 0.0,
                max: ATT_MAX,
            });
        }
        self.sendcmd(&format!("ATT {db:.2}"))
    }

    /// Get the attenuation in dB.
    pub fn get_attenuation(&mut self) -> Result<f64, InstrumentError> {
        self.query_f64("ATT?")
    }

    /// Block (`true`) or open (`false`) the beam.
    pub fn set_beam_block(&mut self, block: bool) -> Result<(), InstrumentError> {
        self.sendcmd(&format!("D {}", u8::from(block)))
    }

    /// Check if the beam is blocked.
    pub fn get_beam_block(&mut self) -> Result<bool, InstrumentError> {
        let resp = self.query("D?")?;
        match resp.as_str() {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(InstrumentError::ResponseParseError(resp)),
        }
    }

    /// Set the wavelength the attenuation is calibrated for, 1200 nm to 1700 nm.
    pub fn set_wavelength(&mut self, wavelength: Length) -> Result<(), InstrumentError> {
        let nm = wavelength.as_meters() * 1e9;
        if !(WVL_MIN_NM..=WVL_MAX_NM).contains(&nm) {
            return Err(InstrumentError::FloatValueOutOfRange {
                value: nm,
                min: WVL_MIN_NM,
                max: WVL_MAX_NM,
            });
        }
        self.sendcmd(&format!("WVL {nm:.0}E-9"))
    }

    /// Get the wavelength the attenuation is calibrated for.
    pub fn get_wavelength(&mut self) -> Result<Length, InstrumentError> {
        Ok(Length::from_meters(self.query_f64("WVL?")?))
    }

    /// Set the calibration offset in dB that is added to the displayed attenuation.
    pub fn set_calibration(&mut self, db: f64) -> Result<(), InstrumentError> {
        if !(-ATT_MAX..=ATT_MAX).contains(&db) {
            return Err(InstrumentError::FloatValueOutOfRange {
                value: db,
                min: -ATT_MAX,
                max: ATT_MAX,
            });
        }
        self.sendcmd(&format!("CAL {db:.2}"))
    }

    /// Get the calibration offset in dB.
    pub fn get_calibration(&mut self) -> Result<f64, InstrumentError> {
        self.query_f64("CAL?")
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

impl<T: InstrumentInterface> Clone for JdsuHa9<T> {
    fn clone(&self) -> Self {
        Self {
            interface: self.interface.clone(),
        }
    }
}
