//! Plain-text report rendering and persistence.

use std::fmt::Write as _;
use std::path::Path;

use super::transcript::{Exchange, Transcript};
use crate::types::ProbeResult;

/// Render a transcript as the human-readable report.
pub fn render_report(transcript: &Transcript) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "=== MCP probe report ===");
    let _ = writeln!(out, "Run ID:    {}", transcript.run_id);
    let _ = writeln!(out, "Started:   {}", transcript.started_at.to_rfc3339());
    let _ = writeln!(out, "Elapsed:   {} ms", transcript.elapsed.as_millis());
    let _ = writeln!(out, "Command:   {}", transcript.command);
    let _ = writeln!(
        out,
        "Scenario:  {} ({})",
        transcript.scenario, transcript.read_mode
    );
    if let Some(server) = &transcript.server {
        let _ = writeln!(out, "Server:    {server}");
    }
    if let Some(count) = transcript.resource_count {
        let _ = writeln!(out, "Resources: {count}");
    }
    out.push('\n');

    for exchange in &transcript.exchanges {
        match exchange {
            Exchange::Sent { method, line } => {
                let _ = writeln!(out, "Sending {method}: {line}");
            }
            Exchange::Received { method, line } => {
                let _ = writeln!(out, "Response to {method}: {line}");
            }
        }
    }

    out.push_str("\n--- STDOUT ---\n");
    out.push_str(&transcript.stdout);
    out.push_str("\n--- STDERR ---\n");
    out.push_str(&transcript.stderr);
    out.push('\n');

    if !transcript.notes.is_empty() || transcript.exit_status.is_some() || transcript.terminated {
        out.push_str("\n--- NOTES ---\n");
        for note in &transcript.notes {
            let _ = writeln!(out, "- {note}");
        }
        if let Some(status) = &transcript.exit_status {
            let _ = writeln!(out, "- child exit: {status}");
        }
        if transcript.terminated {
            let _ = writeln!(out, "- child was killed by the probe");
        }
    }

    let verdict_line = transcript
        .verdict()
        .map(|v| v.report_line())
        .unwrap_or_else(|| format!("INCOMPLETE: run ended in state {}", transcript.state()));
    let _ = writeln!(out, "\nVERDICT: {verdict_line}");

    out
}

/// Write the report for `transcript` to `path`, creating parent directories.
pub async fn write_report(path: &Path, transcript: &Transcript) -> ProbeResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, render_report(transcript)).await?;
    tracing::info!("Report written to {}", path.display());
    Ok(())
}
