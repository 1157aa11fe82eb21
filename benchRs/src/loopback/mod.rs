//! The loopback module provides an instrument simulator for testing purposes.
//!
//! The [`LoopbackInterface`] allows to test instrument drivers that communicate using strings and
//! have a fixed terminator to declare the end of a line. Check it out for more details and an
//! example. Every driver crate in this workspace has tests that use it.

mod loopback_interface;

pub use loopback_interface::*;

/// A self-incrementing index structure that by default starts at 0 and increments whenever `next`
/// is called.
#[derive(Debug, Default)]
struct IncrIndex {
    index: usize,
}

impl IncrIndex {
    fn next(&mut self) -> usize {
        let current = self.index;
        self.index += 1;
        current
    }
}
