//! Everything observed during one run.

use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::protocol::{ReadMode, RunState, ScenarioKind, Verdict};
use crate::types::ProbeResult;

/// One line exchanged with the child, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange {
    /// Written to the child's stdin.
    Sent {
        /// Method name.
        method: String,
        /// The JSON line.
        line: String,
    },
    /// A response read from stdout, matched to the request it answers.
    Received {
        /// Method of the answered request.
        method: String,
        /// The JSON line.
        line: String,
    },
}

/// Record of a single probe run.
#[derive(Debug, Clone)]
pub struct Transcript {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Time from launch to verdict.
    pub elapsed: Duration,
    /// Command line of the child.
    pub command: String,
    /// Scenario that was run.
    pub scenario: ScenarioKind,
    /// Read mode that was used.
    pub read_mode: ReadMode,
    /// Sent messages and matched responses.
    pub exchanges: Vec<Exchange>,
    /// Everything read from stdout.
    pub stdout: String,
    /// Everything read from stderr.
    pub stderr: String,
    /// Server identity from the initialize result.
    pub server: Option<String>,
    /// Number of resources in the resources/list result.
    pub resource_count: Option<usize>,
    /// Free-form observations.
    pub notes: Vec<String>,
    /// Whether the probe had to kill the child.
    pub terminated: bool,
    /// How the child exited, when known.
    pub exit_status: Option<String>,
    state: RunState,
}

impl Transcript {
    /// Start an empty transcript.
    pub fn new(command: String, scenario: ScenarioKind, read_mode: ReadMode) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            elapsed: Duration::ZERO,
            command,
            scenario,
            read_mode,
            exchanges: Vec::new(),
            stdout: String::new(),
            stderr: String::new(),
            server: None,
            resource_count: None,
            notes: Vec::new(),
            terminated: false,
            exit_status: None,
            state: RunState::default(),
        }
    }

    /// Current run state.
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Final verdict, once the run has finished.
    pub fn verdict(&self) -> Option<&Verdict> {
        self.state.verdict()
    }

    /// Mark the child as running.
    pub fn start(&mut self) -> ProbeResult<()> {
        self.state.start()
    }

    /// Record the final verdict.
    pub fn finish(&mut self, verdict: Verdict) -> ProbeResult<()> {
        tracing::info!(run_id = %self.run_id, "Run finished: {verdict}");
        self.state.finish(verdict)
    }

    /// Record a line written to the child.
    pub fn record_sent(&mut self, method: &str, line: String) {
        self.exchanges.push(Exchange::Sent {
            method: method.to_string(),
            line,
        });
    }

    /// Record a response matched to a request.
    pub fn record_received(&mut self, method: &str, line: String) {
        self.exchanges.push(Exchange::Received {
            method: method.to_string(),
            line,
        });
    }

    /// Append a raw stdout line.
    pub fn push_stdout(&mut self, line: &str) {
        self.stdout.push_str(line);
        self.stdout.push('\n');
    }

    /// Add a note.
    pub fn note(&mut self, note: impl Into<String>) {
        let note = note.into();
        tracing::info!("{note}");
        self.notes.push(note);
    }

    /// Methods in the order they were written to the child.
    pub fn sent_methods(&self) -> Vec<&str> {
        self.exchanges
            .iter()
            .filter_map(|e| match e {
                Exchange::Sent { method, .. } => Some(method.as_str()),
                Exchange::Received { .. } => None,
            })
            .collect()
    }
}
