//! Tests for the Prologix GPIB adapter interface.

use rstest::*;

use benchrs::{InstrumentError, InstrumentInterface, LoopbackInterface, PrologixInterface};

/// Commands the adapter receives when the interface is created for GPIB address 5.
const INIT: [&str; 5] = ["++mode 1", "++addr 5", "++auto 0", "++eoi 1", "++eos 2"];

fn crt_gpib(host2inst: Vec<&str>, inst2host: Vec<&str>) -> PrologixInterface<LoopbackInterface> {
    let h2i: Vec<String> = INIT
        .iter()
        .chain(host2inst.iter())
        .map(|s| s.to_string())
        .collect();
    let i2h: Vec<String> = inst2host.iter().map(|s| s.to_string()).collect();
    let adapter = LoopbackInterface::new(h2i, i2h, "\n");
    PrologixInterface::try_new(adapter, 5).unwrap()
}

#[rstest]
fn test_initialization() {
    let gpib = crt_gpib(vec![], vec![]);
    assert_eq!(gpib.get_address(), 5);
}

#[rstest]
fn test_invalid_address() {
    let adapter = LoopbackInterface::new(vec![], vec![], "\n");
    assert!(matches!(
        PrologixInterface::try_new(adapter, 31),
        Err(InstrumentError::IntValueOutOfRange { value: 31, .. })
    ));
}

#[rstest]
fn test_query_requests_read() {
    let mut gpib = crt_gpib(vec!["*IDN?", "++read eoi"], vec!["HEWLETT-PACKARD,53131A,0,4806"]);
    assert_eq!(gpib.query("*IDN?").unwrap(), "HEWLETT-PACKARD,53131A,0,4806");
}

#[rstest]
fn test_sendcmd_escapes_plus() {
    let mut gpib = crt_gpib(vec!["VOLT \u{1b}+1.5"], vec![]);
    gpib.sendcmd("VOLT +1.5").unwrap();
}

#[rstest]
fn test_terminator_sets_eos() {
    let mut gpib = crt_gpib(vec!["++eos 0", "*RST", "*CLS"], vec![]);
    gpib.set_terminator("\r\n");
    gpib.sendcmd("*RST").unwrap();
    // eos is only sent once
    gpib.sendcmd("*CLS").unwrap();
}

#[rstest]
fn test_set_address() {
    let mut gpib = crt_gpib(vec!["++addr 12"], vec![]);
    gpib.set_address(12).unwrap();
    assert_eq!(gpib.get_address(), 12);
    assert!(gpib.set_address(42).is_err());
}
