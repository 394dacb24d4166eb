//! The server under test as an owned child process.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

use crate::config::ProbeConfig;
use crate::types::{ProbeError, ProbeResult};

/// Everything needed to launch the server.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Executable to run.
    pub program: String,
    /// Arguments.
    pub args: Vec<String>,
    /// Extra environment variables.
    pub env: BTreeMap<String, String>,
    /// Working directory, if not inherited.
    pub working_dir: Option<PathBuf>,
}

impl CommandSpec {
    /// Take the `[server]` section of a configuration.
    pub fn from_config(config: &ProbeConfig) -> ProbeResult<Self> {
        let program = config
            .server
            .command
            .clone()
            .ok_or_else(|| ProbeError::Config("no server command configured".to_string()))?;
        Ok(Self {
            program,
            args: config.server.args.clone(),
            env: config.server.env.clone(),
            working_dir: config.server.working_dir.clone(),
        })
    }

    /// The command line as a single display string.
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| {
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("{part:?}")
                } else {
                    part.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How a child ended once the probe let go of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    /// Exited on its own.
    Exited(ExitStatus),
    /// Still running after the grace period and was killed.
    Killed,
}

/// A spawned server with piped stdio.
///
/// The child is killed when this value is dropped without having been
/// reaped, so every exit path of a run leaves no process behind.
pub struct ProbeChild {
    child: Child,
    command: String,
    reaped: bool,
}

impl ProbeChild {
    /// Launch the command with stdin, stdout and stderr piped.
    pub fn spawn(spec: &CommandSpec) -> ProbeResult<Self> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }

        let shown = spec.display();
        let child = command.spawn().map_err(|source| ProbeError::Launch {
            command: shown.clone(),
            source,
        })?;

        tracing::info!("Launched `{shown}` (pid {:?})", child.id());

        Ok(Self {
            child,
            command: shown,
            reaped: false,
        })
    }

    /// The command line this child was started with.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// OS process id, `None` once reaped.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Take the child's stdin.
    pub fn take_stdin(&mut self) -> ProbeResult<ChildStdin> {
        self.child
            .stdin
            .take()
            .ok_or_else(|| ProbeError::Transport("child stdin unavailable".to_string()))
    }

    /// Take the child's stdout.
    pub fn take_stdout(&mut self) -> ProbeResult<ChildStdout> {
        self.child
            .stdout
            .take()
            .ok_or_else(|| ProbeError::Transport("child stdout unavailable".to_string()))
    }

    /// Take the child's stderr.
    pub fn take_stderr(&mut self) -> ProbeResult<ChildStderr> {
        self.child
            .stderr
            .take()
            .ok_or_else(|| ProbeError::Transport("child stderr unavailable".to_string()))
    }

    /// Exit status if the child has already exited.
    pub fn try_exit_status(&mut self) -> ProbeResult<Option<ExitStatus>> {
        let status = self.child.try_wait()?;
        if status.is_some() {
            self.reaped = true;
        }
        Ok(status)
    }

    /// Forcefully kill the child and reap it.
    ///
    /// Returns `false` if it had already exited and nothing was sent.
    pub async fn kill(&mut self) -> ProbeResult<bool> {
        if self.try_exit_status()?.is_some() {
            return Ok(false);
        }
        self.child.kill().await?;
        self.reaped = true;
        tracing::warn!("Killed `{}`", self.command);
        Ok(true)
    }

    /// Give the child `grace` to exit on its own, then kill it.
    ///
    /// The caller should close the child's stdin first.
    pub async fn wait_or_kill(&mut self, grace: Duration) -> ProbeResult<ChildExit> {
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                self.reaped = true;
                tracing::debug!("`{}` exited with {status}", self.command);
                Ok(ChildExit::Exited(status))
            }
            Err(_) => {
                tracing::debug!("`{}` still running after {grace:?}", self.command);
                if self.kill().await? {
                    Ok(ChildExit::Killed)
                } else {
                    let status = self.child.wait().await?;
                    Ok(ChildExit::Exited(status))
                }
            }
        }
    }
}

impl Drop for ProbeChild {
    fn drop(&mut self) {
        if !self.reaped {
            if let Err(e) = self.child.start_kill() {
                tracing::error!("Failed to kill `{}` on drop: {e}", self.command);
            }
        }
    }
}
