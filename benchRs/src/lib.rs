//! benchrs: blocking transports for laboratory instruments
//!
//! This crate is the plumbing underneath the instrument drivers of this workspace. It provides the
//! [`InstrumentInterface`] trait that all drivers are generic over, the [`InstrumentError`] type
//! that all drivers return, and a set of ready-made interfaces.
//!
//! # Implemented interfaces
//! - Serial (blocking) using the [`serialport`] crate, feature `serial` (on by default).
//! - TCP/IP (blocking) using [`std::net::TcpStream`].
//! - VISA using the `visa-rs` crate, feature `visa`. This requires a VISA installation at runtime.
//! - GPIB through a Prologix GPIB-USB or GPIB-ETHERNET adapter, stacked on top of any of the
//!   interfaces above.
//! - A [`LoopbackInterface`] that replays scripted instrument replies and checks the commands a
//!   driver sends. All drivers in this workspace are tested with it.
//!
//! Every interface speaks the same simple protocol: a command string is sent with a terminator
//! appended, and a reply, if any, is read back until the terminator is found or the timeout hits.
//!
//! # Example
//!
//! ```no_run
//! use benchrs::{InstrumentInterface, TcpIpInterface};
//!
//! let mut intf = TcpIpInterface::simple("192.168.1.20:5025").unwrap();
//! println!("{}", intf.query("*IDN?").unwrap());
//! ```

#![warn(missing_docs)]

mod error;
mod loopback;
mod port;
mod prologix;
#[cfg(feature = "serial")]
mod serial;
mod tcp_ip;
#[cfg(feature = "visa")]
mod visa;

pub use error::InstrumentError;
pub use loopback::LoopbackInterface;
pub use port::PortInterface;
pub use prologix::PrologixInterface;
#[cfg(feature = "serial")]
pub use serial::SerialInterface;
pub use tcp_ip::TcpIpInterface;
#[cfg(feature = "visa")]
pub use visa::{VisaInterface, VisaPort};

use std::time::{Duration, Instant};

/// The `InstrumentInterface` trait defines how drivers talk to instruments.
///
/// Only [`InstrumentInterface::read_exact`] and [`InstrumentInterface::write_raw`] must be
/// implemented. Everything else has a default implementation built on top of these two that can
/// be overwritten where an interface needs to behave differently, e.g., a GPIB adapter that needs
/// an extra read request after each query.
///
/// The trait is object safe. Boxed interfaces implement it as well, such that drivers can be used
/// with an interface that is only selected at runtime (`Box<dyn InstrumentInterface + Send>`).
pub trait InstrumentInterface {
    /// Read exactly as many bytes as fit into the buffer.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError>;

    /// Write raw bytes to the instrument and flush the interface.
    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError>;

    /// Get the terminator of the interface. The default is `"\n"`.
    fn get_terminator(&self) -> &str {
        "\n"
    }

    /// Set the terminator of an interface from a `&str`.
    ///
    /// Interfaces that do not support changing the terminator ignore this call.
    fn set_terminator(&mut self, _terminator: &str) {}

    /// Get the timeout for reading a reply. The default is three seconds.
    fn get_timeout(&self) -> Duration {
        Duration::from_secs(3)
    }

    /// Write a string to the instrument as is, without appending the terminator.
    fn write(&mut self, data: &str) -> Result<(), InstrumentError> {
        self.write_raw(data.as_bytes())
    }

    /// Send a command to the instrument.
    ///
    /// The terminator is appended to the command and the whole string is written to the
    /// instrument at once.
    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        log::trace!("-> {cmd:?}");
        let data = format!("{cmd}{}", self.get_terminator());
        self.write_raw(data.as_bytes())
    }

    /// Read from the instrument until the terminator is found and return the line.
    ///
    /// The terminator as well as leading and trailing whitespace are removed from the returned
    /// string. Bytes that are not valid UTF-8 are skipped with a warning. If no terminator shows up
    /// within the timeout, a [`InstrumentError::Timeout`] is returned.
    fn read_until_terminator(&mut self) -> Result<String, InstrumentError> {
        let terminator = self.get_terminator().as_bytes().to_vec();
        let timeout = self.get_timeout();
        let mut buf: Vec<u8> = Vec::new();
        let mut single_buf = [0u8];

        let tic = Instant::now();
        while tic.elapsed() < timeout {
            self.read_exact(&mut single_buf)?;
            buf.push(single_buf[0]);
            if buf.ends_with(&terminator) {
                buf.truncate(buf.len() - terminator.len());
                let response = decode_lossy(&buf);
                log::trace!("<- {response:?}");
                return Ok(response.trim().to_string());
            }
        }
        Err(InstrumentError::Timeout(timeout))
    }

    /// Query the instrument with a command and return the reply.
    ///
    /// This sends the command with [`InstrumentInterface::sendcmd`] and reads one line with
    /// [`InstrumentInterface::read_until_terminator`]. A timeout is reported together with the
    /// query that caused it.
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        self.sendcmd(cmd)?;
        self.read_until_terminator().map_err(|e| match e {
            InstrumentError::Timeout(timeout) => InstrumentError::TimeoutQuery {
                query: cmd.to_string(),
                timeout,
            },
            e => e,
        })
    }

    /// Read one line and make sure that it is the expected acknowledgment.
    ///
    /// # Arguments
    /// * `ack` - The acknowledgment the instrument is expected to send.
    fn check_acknowledgment(&mut self, ack: &str) -> Result<(), InstrumentError> {
        let response = self.read_until_terminator()?;
        if response == ack {
            Ok(())
        } else {
            Err(InstrumentError::NotAcknowledged(response))
        }
    }
}

impl<I: InstrumentInterface + ?Sized> InstrumentInterface for Box<I> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        (**self).read_exact(buf)
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        (**self).write_raw(data)
    }

    fn get_terminator(&self) -> &str {
        (**self).get_terminator()
    }

    fn set_terminator(&mut self, terminator: &str) {
        (**self).set_terminator(terminator)
    }

    fn get_timeout(&self) -> Duration {
        (**self).get_timeout()
    }

    fn write(&mut self, data: &str) -> Result<(), InstrumentError> {
        (**self).write(data)
    }

    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        (**self).sendcmd(cmd)
    }

    fn read_until_terminator(&mut self) -> Result<String, InstrumentError> {
        (**self).read_until_terminator()
    }

    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        (**self).query(cmd)
    }

    fn check_acknowledgment(&mut self, ack: &str) -> Result<(), InstrumentError> {
        (**self).check_acknowledgment(ack)
    }
}

/// Decode bytes as UTF-8 and drop, with a warning, every byte that is not valid.
pub(crate) fn decode_lossy(buf: &[u8]) -> String {
    let mut out = String::with_capacity(buf.len());
    for chunk in buf.utf8_chunks() {
        out.push_str(chunk.valid());
        if !chunk.invalid().is_empty() {
            log::warn!("Received invalid UTF-8 data: {:?}", chunk.invalid());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_lossy_skips_invalid_bytes() {
        assert_eq!(decode_lossy(b"1.5\xff2"), "1.52");
        assert_eq!(decode_lossy("µW".as_bytes()), "µW");
    }
}
