//! mcp-probe: handshake smoke tests for MCP servers speaking JSON-RPC over stdio.
//!
//! The probe launches a server, sends `initialize`, `notifications/initialized`
//! and `resources/list` as line-delimited JSON, captures stdout and stderr, and
//! reports a verdict based on which keywords show up in the output.

pub mod config;
pub mod process;
pub mod protocol;
pub mod report;
pub mod runner;
pub mod transport;
pub mod types;

pub use config::ProbeConfig;
pub use protocol::{Scenario, Verdict};
pub use report::Transcript;
pub use runner::ProbeRunner;
