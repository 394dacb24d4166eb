//! Transport between the probe and the server under test.

pub mod stdio;

pub use stdio::{Incoming, StdioTransport};
