//! An [`InstrumentInterface`] on top of any blocking byte stream.
//!
//! Sockets, serial ports and VISA sessions all implement [`Read`] and [`Write`] with a read
//! timeout. A read that runs into that timeout is reported as [`InstrumentError::Timeout`], not as
//! an I/O error, so that drivers can keep waiting for slow operations (sweeps, moves, triggers)
//! by simply reading again.

use std::{
    io::{ErrorKind, Read, Write},
    time::{Duration, Instant},
};

use crate::{InstrumentError, InstrumentInterface, decode_lossy};

/// Line based interface over a blocking port.
///
/// The serial, TCP/IP, and VISA shortcuts of this crate all return a [`PortInterface`]. Any other
/// type that implements [`Read`] and [`Write`] can be wrapped as well.
///
/// Bytes of a line that is still incomplete when a read times out are kept, and the next read
/// continues that line.
///
/// # Example
///
/// ```no_run
/// use std::{net::TcpStream, time::Duration};
///
/// use benchrs::PortInterface;
///
/// let stream = TcpStream::connect("192.168.10.1:5025").unwrap();
/// stream.set_read_timeout(Some(Duration::from_secs(3))).unwrap();
/// let intf = PortInterface::new(stream, Duration::from_secs(3));
/// ```
pub struct PortInterface<P: Read + Write> {
    port: P,
    terminator: String,
    timeout: Duration,
    partial: Vec<u8>,
}

impl<P: Read + Write> PortInterface<P> {
    /// Wrap a port whose reads give up after `timeout`.
    ///
    /// The terminator starts out as `"\n"`, drivers set the one their instrument uses.
    pub fn new(port: P, timeout: Duration) -> Self {
        Self {
            port,
            terminator: "\n".to_string(),
            timeout,
            partial: Vec::new(),
        }
    }

    /// Change how long a reply is waited for.
    ///
    /// This only changes the bookkeeping of the interface. The port itself must be configured with
    /// the same timeout when it is opened.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Number of bytes of an incomplete line held back from an earlier timeout.
    pub fn pending(&self) -> usize {
        self.partial.len()
    }
}

/// Whether an I/O error means that the port timed out waiting for data.
///
/// Unix sockets report `WouldBlock` when their read timeout expires, serial ports and Windows
/// sockets report `TimedOut`.
fn is_read_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

impl<P: Read + Write> InstrumentInterface for PortInterface<P> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(InstrumentError::Io(ErrorKind::UnexpectedEof.into()));
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if is_read_timeout(e.kind()) => {
                    return Err(InstrumentError::Timeout(self.timeout));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    fn get_terminator(&self) -> &str {
        self.terminator.as_str()
    }

    fn set_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }

    fn get_timeout(&self) -> Duration {
        self.timeout
    }

    fn read_until_terminator(&mut self) -> Result<String, InstrumentError> {
        let terminator = self.terminator.as_bytes().to_vec();
        let mut byte = [0u8];

        let tic = Instant::now();
        while tic.elapsed() < self.timeout {
            self.read_exact(&mut byte)?;
            self.partial.push(byte[0]);
            if self.partial.ends_with(&terminator) {
                let mut line = std::mem::take(&mut self.partial);
                line.truncate(line.len() - terminator.len());
                let response = decode_lossy(&line);
                log::trace!("<- {response:?}");
                return Ok(response.trim().to_string());
            }
        }
        Err(InstrumentError::Timeout(self.timeout))
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, io};

    use super::*;

    /// Hands out its chunks one read at a time, a `None` chunk is a read timeout.
    struct ChunkedPort {
        chunks: VecDeque<Option<Vec<u8>>>,
    }

    impl Read for ChunkedPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(Some(mut chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        chunk.drain(..n);
                        self.chunks.push_front(Some(chunk));
                    }
                    Ok(n)
                }
                Some(None) => Err(ErrorKind::WouldBlock.into()),
                None => Ok(0),
            }
        }
    }

    impl Write for ChunkedPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn port(chunks: Vec<Option<&[u8]>>) -> PortInterface<ChunkedPort> {
        let chunks = chunks.into_iter().map(|c| c.map(<[u8]>::to_vec)).collect();
        PortInterface::new(ChunkedPort { chunks }, Duration::from_secs(3))
    }

    #[test]
    fn test_would_block_is_a_timeout() {
        let mut intf = port(vec![None]);
        assert!(matches!(
            intf.read_until_terminator(),
            Err(InstrumentError::Timeout(t)) if t == Duration::from_secs(3)
        ));
    }

    #[test]
    fn test_partial_line_survives_timeout() {
        let mut intf = port(vec![Some(b"+"), None, Some(b"1\n")]);

        assert!(matches!(
            intf.read_until_terminator(),
            Err(InstrumentError::Timeout(_))
        ));
        assert_eq!(intf.pending(), 1);
        assert_eq!(intf.read_until_terminator().unwrap(), "+1");
        assert_eq!(intf.pending(), 0);
    }

    #[test]
    fn test_interrupted_read_is_retried() {
        struct Interrupting(bool);
        impl Read for Interrupting {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if !self.0 {
                    self.0 = true;
                    return Err(ErrorKind::Interrupted.into());
                }
                buf[0] = b'x';
                Ok(1)
            }
        }
        impl Write for Interrupting {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                Ok(buf.len())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut intf = PortInterface::new(Interrupting(false), Duration::from_secs(1));
        let mut buf = [0u8; 2];
        intf.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"xx");
    }
}
