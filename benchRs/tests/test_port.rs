//! Tests for [`PortInterface`] over in-memory ports.
//!
//! Note that much of the functionality of the [`InstrumentInterface`] trait is also covered by the
//! [`benchrs::LoopbackInterface`] tests.

use std::{collections::VecDeque, time::Duration};

use rstest::*;

use benchrs::{InstrumentError, InstrumentInterface, PortInterface};

/// Set up an empty port with default 3 second timeout.
#[fixture]
fn empt_port() -> PortInterface<VecDeque<u8>> {
    PortInterface::new(VecDeque::new(), Duration::from_secs(3))
}

/// Set up a port with no terminator in its buffer and no timeout duration.
#[fixture]
fn no_term_port() -> PortInterface<VecDeque<u8>> {
    PortInterface::new(
        VecDeque::from(vec![b'r', b'e', b's', b'p']),
        Duration::from_secs(0),
    )
}

#[rstest]
fn test_port_terminator(mut empt_port: PortInterface<VecDeque<u8>>) {
    assert_eq!(empt_port.get_terminator(), "\n");

    empt_port.set_terminator("\r\n");
    assert_eq!(empt_port.get_terminator(), "\r\n");
}

#[rstest]
fn test_port_timeout(mut empt_port: PortInterface<VecDeque<u8>>) {
    assert_eq!(empt_port.get_timeout(), Duration::from_secs(3));

    empt_port.set_timeout(Duration::from_millis(500));
    assert_eq!(empt_port.get_timeout(), Duration::from_millis(500));
}

#[rstest]
fn test_port_write_read(mut empt_port: PortInterface<VecDeque<u8>>) {
    let data = b"Hello, port!";
    empt_port.write_raw(data).unwrap();

    let mut buf = vec![0; data.len()];
    empt_port.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, data);
}

/// A `VecDeque` echoes what was written, so a query returns the command itself.
#[rstest]
fn test_port_query_echo(mut empt_port: PortInterface<VecDeque<u8>>) {
    empt_port.set_terminator("\r\n");
    assert_eq!(empt_port.query("  VOLT 1.5 ").unwrap(), "VOLT 1.5");
}

#[rstest]
fn test_port_check_acknowledgment(mut empt_port: PortInterface<VecDeque<u8>>) {
    empt_port.sendcmd("OK").unwrap();
    empt_port.check_acknowledgment("OK").unwrap();

    empt_port.sendcmd("ERROR").unwrap();
    match empt_port.check_acknowledgment("OK") {
        Err(InstrumentError::NotAcknowledged(resp)) => assert_eq!(resp, "ERROR"),
        _ => panic!("Expected a not acknowledged error."),
    }
}

#[rstest]
fn test_port_read_until_terminator_timeout(mut no_term_port: PortInterface<VecDeque<u8>>) {
    let timeout_exp = Duration::from_secs(0);

    match no_term_port.read_until_terminator() {
        Err(InstrumentError::Timeout(timeout)) => {
            assert_eq!(timeout_exp, timeout);
        }
        _ => panic!("Expected timeout error, but got a different result."),
    }
}

#[rstest]
fn test_port_query_timeout(mut no_term_port: PortInterface<VecDeque<u8>>) {
    let timeout_exp = Duration::from_secs(0);
    let query_exp = "QUERY";

    match no_term_port.query(query_exp) {
        Err(InstrumentError::TimeoutQuery { query, timeout }) => {
            assert_eq!(query_exp, query);
            assert_eq!(timeout_exp, timeout);
        }
        _ => panic!("Expected timeout error, but got a different result."),
    }
}

/// Running out of data before the terminator shows up is an I/O error.
#[rstest]
fn test_port_read_eof(mut empt_port: PortInterface<VecDeque<u8>>) {
    empt_port.write("no terminator").unwrap();
    assert!(matches!(
        empt_port.read_until_terminator(),
        Err(InstrumentError::Io(_))
    ));
}
