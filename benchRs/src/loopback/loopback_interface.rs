//! Loopback interface for testing drivers of instruments that communicate by sending strings.
//!
//! End-of-command is in these cases always determined by a terminator string, usually `"\n"` or
//! similar.

use std::collections::VecDeque;

use crate::{InstrumentError, InstrumentInterface, loopback::IncrIndex};

/// An interface that allows you to simply write tests for your instrument driver.
///
/// # Example
///
/// Let us build a simple instrument that sends a `"*IDN?"` command and gets back a string, then
/// write a test for it using the [`LoopbackInterface`]. The instrument itself takes any
/// interface that implements the [`InstrumentInterface`] trait.
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use benchrs::{InstrumentInterface, InstrumentError, LoopbackInterface};
///
/// struct MyInstrument<T: InstrumentInterface> {
///     interface: Arc<Mutex<T>>,
/// }
///
/// impl<T: InstrumentInterface> MyInstrument<T> {
///     fn new(interface: T) -> Self {
///         let interface = Arc::new(Mutex::new(interface));
///         MyInstrument { interface }
///     }
///
///     fn get_name(&mut self) -> Result<String, InstrumentError> {
///         self.interface.lock().unwrap().query("*IDN?")
///     }
/// }
///
/// let host2inst = vec!["*IDN?".to_string()];
/// let inst2host = vec!["MyInstrument,1.0,1234".to_string()];
///
/// // Create the loopback interface with the expected commands and the scripted replies.
/// let loopback = LoopbackInterface::new(host2inst, inst2host, "\n");
///
/// let mut inst = MyInstrument::new(loopback);
/// assert_eq!("MyInstrument,1.0,1234", inst.get_name().unwrap());
///
/// // When `inst` is dropped, the loopback interface checks that all commands were used.
/// ```
pub struct LoopbackInterface {
    from_host: Vec<String>,
    from_inst: Vec<String>,
    terminator_exp: String,
    from_host_index: IncrIndex,
    from_inst_index: IncrIndex,
    curr_bytes: VecDeque<u8>,
    terminator: String,
}

impl LoopbackInterface {
    /// Create a new loopback instrument with given commands to and from instrument.
    ///
    /// You provide the list of commands that are expected to go from the host to the instrument and
    /// the list of replies that go from the instrument to the host. Both are consumed in order.
    /// Whenever the driver sends something unexpected, or reads more than was scripted, the
    /// interface panics. When the [`LoopbackInterface`] is dropped, [`LoopbackInterface::finalize`]
    /// checks that everything you provided has been used.
    ///
    /// # Arguments:
    /// * `from_host` - Commands from host to instrument, without terminator.
    /// * `from_inst` - Replies from instrument to host, without terminator.
    /// * `terminator_exp` - The terminator that the driver is expected to use. It is appended to
    ///   every expected command and every scripted reply.
    pub fn new(from_host: Vec<String>, from_inst: Vec<String>, terminator_exp: &str) -> Self {
        LoopbackInterface {
            from_host,
            from_inst,
            terminator_exp: terminator_exp.to_string(),
            from_host_index: IncrIndex::default(),
            from_inst_index: IncrIndex::default(),
            curr_bytes: VecDeque::new(),
            terminator: "\n".to_string(), // default terminator, as interfaces
        }
    }

    /// This command panics if not all commands in the [`LoopbackInterface`] have been used.
    ///
    /// It is automatically called when the [`LoopbackInterface`] is dropped, but you can also call
    /// it manually to ensure that all commands have been used.
    pub fn finalize(&self) {
        if let Some(fil) = self.from_host.get(self.from_host_index.index) {
            panic!("Leftover expected commands found from host to instrument: {fil}");
        }
        if let Some(fil) = self.from_inst.get(self.from_inst_index.index) {
            panic!("Leftover expected commands found from instrument to host: {fil}");
        }
        if !self.curr_bytes.is_empty() {
            panic!(
                "Leftover bytes of a reply that were never read: {:?}",
                self.curr_bytes
            );
        }
    }

    /// Assert that the terminator currently set by the driver is the expected one.
    pub fn test_terminator(&self, expected_terminator: &str) {
        assert_eq!(
            expected_terminator, self.terminator,
            "Expected terminator '{expected_terminator:?}', got '{:?}'",
            self.terminator
        );
    }

    /// Get the next command from host to instrument as a string including the terminator.
    fn get_next_from_host_with_terminator(&mut self) -> String {
        let cmd = self
            .from_host
            .get(self.from_host_index.next())
            .expect("No more commands were expected from host to instrument.");
        format!("{cmd}{}", self.terminator_exp)
    }

    /// Get the next reply from instrument to host as a string including the terminator.
    fn get_next_from_inst_with_terminator(&mut self) -> String {
        let cmd = self
            .from_inst
            .get(self.from_inst_index.next())
            .expect("No more commands were expected from instrument to host.");
        format!("{cmd}{}", self.terminator_exp)
    }

    /// Read exactly one byte from the current reply, pulling in the next reply when required.
    ///
    /// This panics if there are no more replies. The panic is justified as this is a test
    /// interface.
    fn read_one_byte(&mut self) -> u8 {
        match self.curr_bytes.pop_front() {
            Some(byte) => byte,
            None => {
                let next_cmd = self.get_next_from_inst_with_terminator();
                self.curr_bytes = next_cmd.as_bytes().iter().copied().collect();
                self.read_one_byte()
            }
        }
    }
}

impl InstrumentInterface for LoopbackInterface {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        for byte in buf.iter_mut() {
            *byte = self.read_one_byte();
        }
        Ok(())
    }

    fn get_terminator(&self) -> &str {
        self.terminator.as_str()
    }

    fn set_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }

    fn write_raw(&mut self, cmd: &[u8]) -> Result<(), InstrumentError> {
        let exp = self.get_next_from_host_with_terminator();
        assert_eq!(
            exp.as_bytes(),
            cmd,
            "Expected sendcmd '{0:?}', got '{1:?}'",
            exp,
            String::from_utf8_lossy(cmd)
        );
        Ok(())
    }
}

impl Drop for LoopbackInterface {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            self.finalize();
        }
    }
}
