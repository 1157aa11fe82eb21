//! GPIB access through a Prologix GPIB-USB or GPIB-ETHERNET adapter.
//!
//! The adapter is reached through another interface, a serial port for the USB version or a TCP/IP
//! socket (port 1234) for the Ethernet version. Lines starting with `++` configure the adapter,
//! everything else is forwarded to the GPIB instrument at the configured address.

use std::time::Duration;

use crate::{InstrumentError, InstrumentInterface};

const ESC: u8 = 0x1B;

/// Highest primary GPIB address.
const MAX_ADDRESS: u8 = 30;

/// An instrument interface for one GPIB instrument behind a Prologix adapter.
///
/// The adapter is put into controller mode with `++auto 0`, i.e., it does not address the
/// instrument to talk after every command. Queries therefore send an explicit `++read eoi`.
///
/// # Example
///
/// ```no_run
/// use benchrs::{InstrumentInterface, PrologixInterface, SerialInterface};
///
/// let adapter = SerialInterface::simple("/dev/ttyUSB0", 115200).unwrap();
/// let mut gpib = PrologixInterface::try_new(adapter, 12).unwrap();
/// println!("{}", gpib.query("*IDN?").unwrap());
/// ```
pub struct PrologixInterface<T: InstrumentInterface> {
    adapter: T,
    address: u8,
    terminator: String,
    eos_pending: bool,
}

impl<T: InstrumentInterface> PrologixInterface<T> {
    /// Configure the adapter and create the interface for the instrument at `address`.
    ///
    /// # Arguments
    /// * `adapter` - Interface that is connected to the Prologix adapter.
    /// * `address` - Primary GPIB address of the instrument, 0 to 30.
    pub fn try_new(adapter: T, address: u8) -> Result<Self, InstrumentError> {
        check_address(address)?;
        let mut adapter = adapter;
        adapter.set_terminator("\n");
        adapter.sendcmd("++mode 1")?;
        adapter.sendcmd(&format!("++addr {address}"))?;
        adapter.sendcmd("++auto 0")?;
        adapter.sendcmd("++eoi 1")?;
        adapter.sendcmd("++eos 2")?;
        Ok(Self {
            adapter,
            address,
            terminator: "\n".to_string(),
            eos_pending: false,
        })
    }

    /// Get the GPIB address the adapter currently talks to.
    pub fn get_address(&self) -> u8 {
        self.address
    }

    /// Point the adapter to another GPIB address.
    pub fn set_address(&mut self, address: u8) -> Result<(), InstrumentError> {
        check_address(address)?;
        self.adapter.sendcmd(&format!("++addr {address}"))?;
        self.address = address;
        Ok(())
    }

    /// Send `++eos` if the terminator was changed since the last command.
    ///
    /// The adapter appends the GPIB termination characters itself, `++eos` tells it which.
    fn flush_eos(&mut self) -> Result<(), InstrumentError> {
        if !self.eos_pending {
            return Ok(());
        }
        let eos = match self.terminator.as_str() {
            "\r\n" => 0,
            "\r" => 1,
            "\n" => 2,
            _ => 3,
        };
        self.adapter.sendcmd(&format!("++eos {eos}"))?;
        self.eos_pending = false;
        Ok(())
    }
}

impl<T: InstrumentInterface> InstrumentInterface for PrologixInterface<T> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        self.adapter.read_exact(buf)
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        self.adapter.write_raw(data)
    }

    fn get_terminator(&self) -> &str {
        self.terminator.as_str()
    }

    fn set_terminator(&mut self, terminator: &str) {
        if terminator != self.terminator {
            self.terminator = terminator.to_string();
            self.eos_pending = true;
        }
    }

    fn get_timeout(&self) -> Duration {
        self.adapter.get_timeout()
    }

    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        self.flush_eos()?;
        log::trace!("-> GPIB {}: {cmd:?}", self.address);
        let mut data = escape(cmd.as_bytes());
        data.push(b'\n');
        self.adapter.write_raw(&data)
    }

    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        self.sendcmd(cmd)?;
        self.adapter.sendcmd("++read eoi")?;
        self.read_until_terminator().map_err(|e| match e {
            InstrumentError::Timeout(timeout) => InstrumentError::TimeoutQuery {
                query: cmd.to_string(),
                timeout,
            },
            e => e,
        })
    }
}

fn check_address(address: u8) -> Result<(), InstrumentError> {
    if address > MAX_ADDRESS {
        return Err(InstrumentError::IntValueOutOfRange {
            value: address.into(),
            min: 0,
            max: MAX_ADDRESS.into(),
        });
    }
    Ok(())
}

/// Escape characters that the adapter would otherwise interpret itself.
fn escape(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for &b in data {
        if matches!(b, b'\r' | b'\n' | ESC | b'+') {
            out.push(ESC);
        }
        out.push(b);
    }
    out
}
