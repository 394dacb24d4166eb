//! Phase 6: CLI tests, the `mcp-probe` binary end to end.

mod common;

use std::path::Path;
use std::process::{Command, Output};

use common::fixtures::mock_server;

fn probe(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mcp-probe"))
        .args(args)
        .current_dir(cwd)
        .env_remove("MCP_PROBE_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run mcp-probe")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_cli_success() {
    let dir = tempfile::tempdir().unwrap();
    let output = probe(
        dir.path(),
        &["--settle-ms", "0", "--timeout", "5", "--", mock_server(), "notebooks"],
    );

    assert_eq!(stdout_of(&output).trim(), "SUCCESS");
    assert_eq!(output.status.code(), Some(0));

    let report = std::fs::read_to_string(dir.path().join("probe_report.txt")).unwrap();
    assert!(report.contains("Sending initialize: "));
    assert!(report.contains("VERDICT: SUCCESS"));
}

#[test]
fn test_cli_explicit_run_and_report_path() {
    let dir = tempfile::tempdir().unwrap();
    let output = probe(
        dir.path(),
        &[
            "run",
            "--settle-ms",
            "0",
            "--read-mode",
            "batch",
            "--report",
            "out/verify.txt",
            "--",
            mock_server(),
            "notebooks",
        ],
    );

    assert_eq!(stdout_of(&output).trim(), "SUCCESS");
    assert!(dir.path().join("out").join("verify.txt").exists());
}

#[test]
fn test_cli_failure_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let output = probe(
        dir.path(),
        &[
            "--settle-ms",
            "0",
            "--keyword",
            "notebook",
            "--",
            mock_server(),
            "empty",
        ],
    );

    assert_eq!(stdout_of(&output).trim(), "FAILURE");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_cli_launch_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-server");
    let output = probe(
        dir.path(),
        &["--settle-ms", "0", "--", missing.to_str().unwrap()],
    );

    assert_eq!(stdout_of(&output).trim(), "LAUNCH_ERROR");
    assert_eq!(output.status.code(), Some(1));

    let report = std::fs::read_to_string(dir.path().join("probe_report.txt")).unwrap();
    assert!(report.contains("VERDICT: LAUNCH_ERROR"));
}

#[test]
fn test_cli_missing_command_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = probe(dir.path(), &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout_of(&output).is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no server command"));
}

#[test]
fn test_cli_reads_local_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = format!(
        "[server]\ncommand = {:?}\nargs = [\"notebooks\"]\n\n[probe]\nsettle_ms = 0\n",
        mock_server()
    );
    std::fs::write(dir.path().join("mcp-probe.toml"), config).unwrap();

    let output = probe(dir.path(), &[]);
    assert_eq!(stdout_of(&output).trim(), "SUCCESS");
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_cli_messages_subcommand() {
    let dir = tempfile::tempdir().unwrap();
    let output = probe(dir.path(), &["messages"]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = stdout_of(&output);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("\"method\":\"initialize\""));
    assert_eq!(
        lines[1],
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#
    );
    assert_eq!(lines[2], r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#);
}

#[test]
fn test_cli_config_subcommand() {
    let dir = tempfile::tempdir().unwrap();
    let output = probe(
        dir.path(),
        &["config", "--timeout", "9", "--", "my-server", "--stdio"],
    );
    assert_eq!(output.status.code(), Some(0));

    let stdout = stdout_of(&output);
    assert!(stdout.contains("command = \"my-server\""));
    assert!(stdout.contains("timeout_secs = 9"));
}

#[test]
fn test_cli_huge_timeout_still_reports() {
    let dir = tempfile::tempdir().unwrap();
    let output = probe(
        dir.path(),
        &[
            "--settle-ms",
            "0",
            "--timeout",
            "18446744073709551615",
            "--message-delay-ms",
            "50",
            "--",
            mock_server(),
            "notebooks",
        ],
    );

    assert_eq!(stdout_of(&output).trim(), "SUCCESS");
    assert_eq!(output.status.code(), Some(0));
    assert!(dir.path().join("probe_report.txt").exists());
}
