//! This module provides the implementation for an instrument controlled via TCP/IP.
//!
//! Most LAN instruments accept plain SCPI strings on a raw socket, usually port 5025. The
//! connection is a blocking [`std::net::TcpStream`] wrapped into a [`PortInterface`].

use std::{
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use crate::{InstrumentError, PortInterface};

/// Shortcuts to connect to an instrument via a blocking TCP/IP socket.
#[derive(Debug)]
pub struct TcpIpInterface {}

impl TcpIpInterface {
    /// Connect to an instrument with the default timeout of three seconds.
    ///
    /// A `TcpStream` can block forever if no read timeout is set, which is never wanted for
    /// instrument communications. Read and write timeouts are therefore always set.
    ///
    /// # Arguments
    /// * `sock_addr` - Socket address, e.g., `"192.168.1.20:5025"`.
    pub fn simple<A: ToSocketAddrs>(
        sock_addr: A,
    ) -> Result<PortInterface<TcpStream>, InstrumentError> {
        Self::full(sock_addr, Duration::from_secs(3))
    }

    /// Connect to an instrument with a given read and write timeout.
    ///
    /// # Arguments
    /// * `sock_addr` - Socket address.
    /// * `timeout` - Read and write timeout. Must not be zero.
    pub fn full<A: ToSocketAddrs>(
        sock_addr: A,
        timeout: Duration,
    ) -> Result<PortInterface<TcpStream>, InstrumentError> {
        if timeout.is_zero() {
            return Err(InstrumentError::InvalidArgument(
                "The timeout of a TCP/IP interface must not be zero.".to_string(),
            ));
        }
        let stream = TcpStream::connect(sock_addr)?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        log::debug!("Connected to {:?}", stream.peer_addr().ok());
        Ok(PortInterface::new(stream, timeout))
    }
}
