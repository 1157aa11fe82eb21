//! This module provides an instrument interface on top of a VISA session using `visa-rs`.
//!
//! VISA resource strings look like `"GPIB0::12::INSTR"`, `"TCPIP0::192.168.1.20::inst0::INSTR"`,
//! or `"ASRL3::INSTR"`. A VISA installation (e.g., NI-VISA or Keysight IO Libraries) is required
//! at runtime.

use std::{
    ffi::CString,
    io::{Read, Write},
    time::Duration,
};

use visa_rs::prelude::*;

use crate::{InstrumentError, PortInterface};

/// An open VISA session together with the resource manager that opened it.
///
/// Closing the default resource manager closes all of its sessions, so both are kept together and
/// dropped together.
pub struct VisaPort {
    session: visa_rs::Instrument,
    _rm: DefaultRM,
}

impl Read for VisaPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.session.read(buf)
    }
}

impl Write for VisaPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.session.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.session.flush()
    }
}

/// Shortcuts to open a VISA resource as a [`PortInterface`].
#[derive(Debug)]
pub struct VisaInterface {}

impl VisaInterface {
    /// Open a VISA resource with a timeout of three seconds.
    ///
    /// # Arguments
    /// * `resource` - The VISA resource string, e.g., `"GPIB0::12::INSTR"`.
    pub fn simple(resource: &str) -> Result<PortInterface<VisaPort>, InstrumentError> {
        Self::full(resource, Duration::from_secs(3))
    }

    /// Open a VISA resource with a given timeout.
    ///
    /// The timeout is used both for opening the session and for reading replies.
    pub fn full(
        resource: &str,
        timeout: Duration,
    ) -> Result<PortInterface<VisaPort>, InstrumentError> {
        let rm = DefaultRM::new()?;
        let rsc = CString::new(resource).map_err(|_| {
            InstrumentError::InvalidArgument(format!(
                "VISA resource string {resource:?} contains a nul byte."
            ))
        })?;
        let session = rm.open(&rsc.into(), AccessMode::NO_LOCK, timeout)?;
        log::debug!("Opened VISA resource {resource}");
        Ok(PortInterface::new(VisaPort { session, _rm: rm }, timeout))
    }
}
