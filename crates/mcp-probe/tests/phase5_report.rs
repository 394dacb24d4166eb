//! Phase 5: Report tests, transcript rendering and report files.

use mcp_probe::protocol::{ReadMode, ScenarioKind, Verdict};
use mcp_probe::report::{render_report, write_report, Transcript};

fn finished_transcript() -> Transcript {
    let mut transcript = Transcript::new(
        "python -m notebooklm_mcp.server".to_string(),
        ScenarioKind::Handshake,
        ReadMode::Interactive,
    );
    transcript.start().unwrap();
    transcript.record_sent(
        "initialize",
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#.to_string(),
    );
    transcript.record_received(
        "initialize",
        r#"{"jsonrpc":"2.0","id":1,"result":{}}"#.to_string(),
    );
    transcript.push_stdout(r#"{"jsonrpc":"2.0","id":1,"result":{}}"#);
    transcript.stderr = "server starting\n".to_string();
    transcript.server = Some("notebooklm v1.0 (protocol 2024-11-05, resources capability: yes)".into());
    transcript.resource_count = Some(3);
    transcript.exit_status = Some("exit status: 0".to_string());
    transcript
        .finish(Verdict::CompletedSuccess {
            keyword: "notebook".to_string(),
        })
        .unwrap();
    transcript
}

#[test]
fn test_render_sections_in_order() {
    let transcript = finished_transcript();
    let report = render_report(&transcript);

    let header = report.find("=== MCP probe report ===").unwrap();
    let sending = report.find("Sending initialize: ").unwrap();
    let response = report.find("Response to initialize: ").unwrap();
    let stdout = report.find("--- STDOUT ---").unwrap();
    let stderr = report.find("--- STDERR ---").unwrap();
    let notes = report.find("--- NOTES ---").unwrap();
    let verdict = report.find("VERDICT: ").unwrap();
    assert!(header < sending);
    assert!(sending < response);
    assert!(response < stdout);
    assert!(stdout < stderr);
    assert!(stderr < notes);
    assert!(notes < verdict);

    assert!(report.contains(&transcript.run_id.to_string()));
    assert!(report.contains("Command:   python -m notebooklm_mcp.server"));
    assert!(report.contains("Scenario:  handshake (interactive)"));
    assert!(report.contains("Resources: 3"));
    assert!(report.contains("server starting"));
    assert!(report.contains("- child exit: exit status: 0"));
    assert!(report
        .trim_end()
        .ends_with("VERDICT: SUCCESS: found \"notebook\" in server output."));
}

#[test]
fn test_render_timeout_report() {
    let mut transcript = Transcript::new(
        "slow-server".to_string(),
        ScenarioKind::Handshake,
        ReadMode::Batch,
    );
    transcript.start().unwrap();
    transcript.terminated = true;
    transcript.note("no response within 1s");
    transcript.finish(Verdict::TimedOut).unwrap();

    let report = render_report(&transcript);
    assert!(report.contains("- no response within 1s"));
    assert!(report.contains("- child was killed by the probe"));
    assert!(report.contains("VERDICT: TIMEOUT"));
}

#[test]
fn test_render_launch_error_report() {
    let mut transcript = Transcript::new(
        "missing-server".to_string(),
        ScenarioKind::Handshake,
        ReadMode::Interactive,
    );
    transcript
        .finish(Verdict::LaunchError {
            message: "failed to launch `missing-server`".to_string(),
        })
        .unwrap();

    let report = render_report(&transcript);
    assert!(!report.contains("Sending "));
    assert!(!report.contains("--- NOTES ---"));
    assert!(report.contains("VERDICT: LAUNCH_ERROR: failed to launch `missing-server`"));
}

#[test]
fn test_render_unfinished_run() {
    let transcript = Transcript::new(
        "server".to_string(),
        ScenarioKind::LegacyList,
        ReadMode::Interactive,
    );
    let report = render_report(&transcript);
    assert!(report.contains("VERDICT: INCOMPLETE: run ended in state NOT_STARTED"));
}

#[test]
fn test_write_report_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports").join("nested").join("probe_report.txt");
    let transcript = finished_transcript();

    tokio_test::block_on(write_report(&path, &transcript)).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, render_report(&transcript));
}

#[test]
fn test_write_report_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("probe_report.txt");
    std::fs::write(&path, "stale contents").unwrap();

    let transcript = finished_transcript();
    tokio_test::block_on(write_report(&path, &transcript)).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(!written.contains("stale contents"));
    assert!(written.contains("VERDICT: SUCCESS"));
}
