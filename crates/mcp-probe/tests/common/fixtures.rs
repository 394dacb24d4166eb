//! Shared fixtures for probe tests.

#![allow(dead_code)]

use std::path::Path;

use mcp_probe::config::ProbeConfig;
use mcp_probe::protocol::ReadMode;
use mcp_probe::ProbeRunner;

/// Path of the mock server binary built alongside the tests.
pub fn mock_server() -> &'static str {
    env!("CARGO_BIN_EXE_mcp-probe-mock-server")
}

/// A config pointing at the mock server with `behavior`, tuned for fast tests.
pub fn mock_config(behavior: &str, report_dir: &Path) -> ProbeConfig {
    let mut config = ProbeConfig::default();
    config.server.command = Some(mock_server().to_string());
    config.server.args = vec![behavior.to_string()];
    config.probe.settle_ms = 0;
    config.probe.timeout_secs = 5;
    config.probe.shutdown_grace_ms = 300;
    config.report.path = report_dir.join("probe_report.txt");
    config
}

/// A runner for the mock server in the given read mode.
pub fn mock_runner(behavior: &str, read_mode: ReadMode, report_dir: &Path) -> ProbeRunner {
    let mut config = mock_config(behavior, report_dir);
    config.probe.read_mode = read_mode;
    ProbeRunner::new(config).expect("Failed to build runner")
}

/// Same as [`mock_runner`] with a one-second timeout.
pub fn quick_timeout_runner(behavior: &str, read_mode: ReadMode, report_dir: &Path) -> ProbeRunner {
    let mut config = mock_config(behavior, report_dir);
    config.probe.read_mode = read_mode;
    config.probe.timeout_secs = 1;
    ProbeRunner::new(config).expect("Failed to build runner")
}
