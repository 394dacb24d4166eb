//! The handshake smoke-test runner.

mod observe;
pub mod probe;

pub use probe::ProbeRunner;
