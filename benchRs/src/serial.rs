//! This module provides shortcuts to create an instrument interface on a serial port.
//!
//! The port itself is opened with the [`serialport`] crate and wrapped into a
//! [`PortInterface`].

use std::time::Duration;

use serialport::{SerialPort, SerialPortBuilder};

use crate::{InstrumentError, PortInterface};

/// Shortcuts to open a blocking serial port as a [`PortInterface`].
#[derive(Debug)]
pub struct SerialInterface {}

impl SerialInterface {
    /// Open a serial port with 8N1 framing, the given baud rate, and a timeout of three seconds.
    ///
    /// # Arguments
    /// * `port` - The name of the serial port, e.g., `"/dev/ttyUSB0"` or `"COM3"`.
    /// * `baud` - The baud rate.
    pub fn simple(
        port: &str,
        baud: u32,
    ) -> Result<PortInterface<Box<dyn SerialPort>>, InstrumentError> {
        let spb = serialport::new(port, baud).timeout(Duration::from_secs(3));
        Self::full(spb)
    }

    /// Open a serial port from a fully configured [`SerialPortBuilder`].
    ///
    /// Use this if your instrument needs a non-default parity, data bits, stop bits, or flow
    /// control. The timeout of the builder is used as the read timeout of the interface.
    pub fn full(
        spb: SerialPortBuilder,
    ) -> Result<PortInterface<Box<dyn SerialPort>>, InstrumentError> {
        let port = spb.open()?;
        let timeout = port.timeout();
        log::debug!(
            "Opened serial port {} with timeout {timeout:?}",
            port.name().unwrap_or_default()
        );
        Ok(PortInterface::new(port, timeout))
    }
}
