//! A rust driver for the Stanford Research Systems SIM928 isolated voltage source.
//!
//! The SIM928 usually sits in a slot of a SIM900 mainframe. The mainframe forwards everything
//! between `CONN <slot>,"<escape>"` and the escape string to the module in that slot. The driver
//! wraps every command into such a connection, so several modules in the same mainframe can share
//! one interface.
//!
//! # Example
//!
//! ```no_run
//! use benchrs::SerialInterface;
//! use measurements::Voltage;
//! use srs_sim928::SrsSim928;
//!
//! let serial_inst = SerialInterface::simple("/dev/ttyUSB0", 9600).unwrap();
//! let mut source = SrsSim928::try_new(serial_inst, 2).unwrap();
//!
//! source.set_voltage(Voltage::from_volts(0.5)).unwrap();
//! source.set_output(true).unwrap();
//! ```

#![deny(warnings, missing_docs)]

use std::sync::{Arc, Mutex};

use benchrs::{InstrumentError, InstrumentInterface};

use measurements::Voltage;

const ESCAPE: &str = "xyz";
const VOLT_LIMIT: f64 = 20.0;
const SLOT_MAX: u8 = 8;

/// A rust driver for the SIM928.
pub struct SrsSim928<T: InstrumentInterface> {
    interface: Arc<Mutex<T>>,
    slot: Option<u8>,
}

impl<T: InstrumentInterface> SrsSim928<T> {
    /// Create a new SrsSim928 instance for the module in the given mainframe slot.
    ///
    /// # Arguments
    /// * `interface` - Interface to the SIM900 mainframe.
    /// * `slot` - Slot of the SIM928 in the mainframe, 1 to 8.
    pub fn try_new(interface: T, slot: u8) -> Result<Self, InstrumentError> {
        if !(1..=SLOT_MAX).contains(&slot) {
            return Err(InstrumentError::IntValueOutOfRange {
                value: slot.into(),
                min: 1,
                max: SLOT_MAX.into(),
            });
        }
        Ok(Self::with_slot(interface, Some(slot)))
    }

    /// Create a new SrsSim928 instance for a module that is connected directly, without mainframe.
    pub fn try_new_direct(interface: T) -> Result<Self, InstrumentError> {
        Ok(Self::with_slot(interface, None))
    }

    fn with_slot(interface: T, slot: Option<u8>) -> Self {
        let mut intf = interface;
        intf.set_terminator("\n");
        SrsSim928 {
            interface: Arc::new(Mutex::new(intf)),
            slot,
        }
    }

    /// Query the identification string of the module.
    pub fn get_name(&mut self) -> Result<String, InstrumentError> {
        self.query("*IDN?")
    }

    /// Reset the module. This sets the voltage to zero and turns the output off.
    pub fn reset(&mut self) -> Result<(), InstrumentError> {
        self.sendcmd("*RST")
    }

    /// Set the output voltage, -20 V to 20 V, with 1 mV resolution.
    pub fn set_voltage(&mut self, voltage: Voltage) -> Result<(), InstrumentError> {
        let value = voltage.as_volts();
        if !(-VOLT_LIMIT..=VOLT_LIMIT).contains(&value) {
            return Err(InstrumentError::FloatValueOutOfRange {
                value,
                min: -VOLT_LIMIT,
                max: VOLT_LIMIT,
            });
        }
        self.sendcmd(&format!("VOLT {value:.3}"))
    }

    /// Get the set output voltage.
    pub fn get_voltage(&mut self) -> Result<Voltage, InstrumentError> {
        let resp = self.query("VOLT?")?;
        let value = resp
            .parse::<f64>()
            .map_err(|_| InstrumentError::ResponseParseError(resp))?;
        Ok(Voltage::from_volts(value))
    }

    /// Turn the output on or off.
    pub fn set_output(&mut self, on: bool) -> Result<(), InstrumentError> {
        self.sendcmd(if on { "OPON" } else { "OPOF" })
    }

    /// Check if the output is on.
    pub fn get_output(&mut self) -> Result<bool, InstrumentError> {
        let resp = self.query("EXON?")?;
        match resp.as_str() {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(InstrumentError::ResponseParseError(resp)),
        }
    }

    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        match self.slot {
            Some(slot) => {
                intf.sendcmd(&format!("CONN {slot},\"{ESCAPE}\""))?;
                intf.sendcmd(cmd)?;
                intf.sendcmd(ESCAPE)
            }
            None => intf.sendcmd(cmd),
        }
    }

    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        let mut intf = self.interface.lock().expect("Mutex should not be poisoned");
        match self.slot {
            Some(slot) => {
                intf.sendcmd(&format!("CONN {slot},\"{ESCAPE}\""))?;
                let resp = intf.query(cmd);
                // Leave the module even if the reply failed.
                intf.sendcmd(ESCAPE)?;
                resp
            }
            None => intf.query(cmd),
        }
    }
}

impl<T: InstrumentInterface> Clone for SrsSim928<T> {
    fn clone(&self) -> Self {
        Self {
            interface: self.interface.clone(),
            slot: self.slot,
        }
    }
}
