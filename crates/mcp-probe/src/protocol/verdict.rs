//! Run verdicts and the run state machine.

use crate::types::{ProbeError, ProbeResult};

/// Final outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// A keyword was found in the captured output.
    CompletedSuccess {
        /// The keyword that matched.
        keyword: String,
    },
    /// The child ran but no keyword was found.
    CompletedFailure,
    /// The deadline passed and the child was killed.
    TimedOut,
    /// The child could not be started.
    LaunchError {
        /// Why the launch failed.
        message: String,
    },
}

impl Verdict {
    /// True only for a keyword match.
    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::CompletedSuccess { .. })
    }

    /// One-word console form.
    pub fn console_word(&self) -> &'static str {
        match self {
            Verdict::CompletedSuccess { .. } => "SUCCESS",
            Verdict::CompletedFailure => "FAILURE",
            Verdict::TimedOut => "TIMEOUT",
            Verdict::LaunchError { .. } => "LAUNCH_ERROR",
        }
    }

    /// Full verdict line for the report.
    pub fn report_line(&self) -> String {
        match self {
            Verdict::CompletedSuccess { keyword } => {
                format!("SUCCESS: found \"{keyword}\" in server output.")
            }
            Verdict::CompletedFailure => {
                "FAILURE: no expected keyword in server output.".to_string()
            }
            Verdict::TimedOut => {
                "TIMEOUT: no response before the deadline; child killed.".to_string()
            }
            Verdict::LaunchError { message } => format!("LAUNCH_ERROR: {message}"),
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Verdict::CompletedSuccess { .. } => "COMPLETED_SUCCESS",
            Verdict::CompletedFailure => "COMPLETED_FAILURE",
            Verdict::TimedOut => "TIMED_OUT",
            Verdict::LaunchError { .. } => "LAUNCH_ERROR",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a single run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RunState {
    /// Nothing launched yet.
    #[default]
    NotStarted,
    /// Child running, exchange in progress.
    Running,
    /// Terminal.
    Finished(Verdict),
}

impl RunState {
    /// Whether the state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Finished(_))
    }

    /// The verdict, once terminal.
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            RunState::Finished(v) => Some(v),
            _ => None,
        }
    }

    /// Move `NotStarted -> Running`.
    pub fn start(&mut self) -> ProbeResult<()> {
        match self {
            RunState::NotStarted => {
                *self = RunState::Running;
                Ok(())
            }
            _ => Err(self.invalid("RUNNING")),
        }
    }

    /// Enter a terminal state.
    ///
    /// `LaunchError` is only reachable from `NotStarted`; every other verdict
    /// requires `Running`.
    pub fn finish(&mut self, verdict: Verdict) -> ProbeResult<()> {
        let allowed = match (&*self, &verdict) {
            (RunState::NotStarted, Verdict::LaunchError { .. }) => true,
            (RunState::Running, Verdict::LaunchError { .. }) => false,
            (RunState::Running, _) => true,
            _ => false,
        };
        if !allowed {
            return Err(self.invalid(&verdict.to_string()));
        }
        *self = RunState::Finished(verdict);
        Ok(())
    }

    fn invalid(&self, to: &str) -> ProbeError {
        ProbeError::InvalidTransition {
            from: self.to_string(),
            to: to.to_string(),
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::NotStarted => f.write_str("NOT_STARTED"),
            RunState::Running => f.write_str("RUNNING"),
            RunState::Finished(v) => write!(f, "{v}"),
        }
    }
}
