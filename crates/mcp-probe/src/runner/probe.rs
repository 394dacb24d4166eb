//! One probe run: launch, settle, exchange, verdict.

use std::time::Duration;

use tokio::process::ChildStdin;
use tokio::time::Instant;

use super::observe::observe_line;
use crate::config::ProbeConfig;
use crate::process::{ChildExit, CommandSpec, ProbeChild, StreamCapture};
use crate::protocol::{ProbeMessage, ReadMode, Scenario, Verdict};
use crate::report::Transcript;
use crate::transport::{Incoming, StdioTransport};
use crate::types::{ProbeError, ProbeResult, RequestId};

/// How long stdout may keep producing lines after the exchange ends.
const STDOUT_DRAIN: Duration = Duration::from_millis(200);

/// How long to wait for stderr to reach EOF once the child is gone.
const STDERR_DRAIN: Duration = Duration::from_millis(500);

/// Stand-in deadline for timeouts too large to represent (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

type ChildTransport = StdioTransport<ChildStdin>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExchangeEnd {
    Completed,
    Elapsed,
}

/// Runs a scenario against a freshly launched server.
pub struct ProbeRunner {
    config: ProbeConfig,
    command: CommandSpec,
    scenario: Scenario,
}

impl ProbeRunner {
    /// Validate `config` and build the scenario it describes.
    pub fn new(config: ProbeConfig) -> ProbeResult<Self> {
        config.validate()?;
        let command = CommandSpec::from_config(&config)?;
        let scenario = Scenario::from_config(&config)?;
        Ok(Self {
            config,
            command,
            scenario,
        })
    }

    /// Replace the scenario built from the configuration.
    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = scenario;
        self
    }

    /// The effective configuration.
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// The scenario that will be sent.
    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Perform exactly one exchange. Every failure ends up in the transcript.
    pub async fn run(&self) -> Transcript {
        let clock = std::time::Instant::now();
        let mut transcript = Transcript::new(
            self.command.display(),
            self.scenario.kind,
            self.scenario.read_mode,
        );
        tracing::info!(
            run_id = %transcript.run_id,
            "Probing `{}` ({} scenario, {} reads)",
            transcript.command,
            self.scenario.kind,
            self.scenario.read_mode
        );

        let mut child = match ProbeChild::spawn(&self.command) {
            Ok(child) => child,
            Err(e) => {
                tracing::error!("{e}");
                conclude(
                    &mut transcript,
                    Verdict::LaunchError {
                        message: e.to_string(),
                    },
                );
                transcript.elapsed = clock.elapsed();
                return transcript;
            }
        };

        if let Err(e) = transcript.start() {
            tracing::error!("{e}");
        }
        tracing::debug!(pid = ?child.pid(), "Running `{}`", child.command());

        let verdict = match self.drive(&mut child, &mut transcript).await {
            Ok(verdict) => verdict,
            Err(e) => {
                transcript.note(format!("probe error: {e}"));
                match child.kill().await {
                    Ok(true) => transcript.terminated = true,
                    Ok(false) => {}
                    Err(e) => transcript.note(format!("failed to kill child: {e}")),
                }
                Verdict::CompletedFailure
            }
        };

        conclude(&mut transcript, verdict);
        transcript.elapsed = clock.elapsed();
        transcript
    }

    async fn drive(
        &self,
        child: &mut ProbeChild,
        transcript: &mut Transcript,
    ) -> ProbeResult<Verdict> {
        let stdin = child.take_stdin()?;
        let stdout = child.take_stdout()?;
        let stderr = StreamCapture::spawn(child.take_stderr()?, "stderr");
        let mut transport = StdioTransport::new(stdin, stdout);

        let settle = self.config.settle_delay();
        if !settle.is_zero() {
            tracing::debug!("Waiting {settle:?} for the server to start");
            tokio::time::sleep(settle).await;
        }

        let timeout = self.config.timeout();
        let deadline = deadline_after(timeout);
        let end = match self.scenario.read_mode {
            ReadMode::Interactive => {
                self.exchange_interactive(&mut transport, transcript, deadline)
                    .await
            }
            ReadMode::Batch => {
                self.exchange_batch(&mut transport, transcript, deadline)
                    .await
            }
        };

        match end {
            ExchangeEnd::Elapsed => {
                transcript.note(ProbeError::Timeout(timeout).to_string());
                match child.kill().await {
                    Ok(true) => transcript.terminated = true,
                    Ok(false) => transcript.note("child had already exited"),
                    Err(e) => transcript.note(format!("failed to kill child: {e}")),
                }
            }
            ExchangeEnd::Completed => {
                transport.close_stdin().await;
                match child.wait_or_kill(self.config.shutdown_grace()).await {
                    Ok(ChildExit::Exited(status)) => {
                        transcript.exit_status = Some(status.to_string());
                    }
                    Ok(ChildExit::Killed) => {
                        transcript.terminated = true;
                        transcript.note("child kept running after stdin was closed");
                    }
                    Err(e) => transcript.note(format!("failed to reap child: {e}")),
                }
            }
        }

        self.drain_stdout(&mut transport, transcript).await;
        transcript.stderr = stderr.finish(STDERR_DRAIN).await;

        Ok(match end {
            ExchangeEnd::Elapsed => Verdict::TimedOut,
            ExchangeEnd::Completed => self.judge(transcript),
        })
    }

    /// Send a message, wait for its response, then move on.
    async fn exchange_interactive(
        &self,
        transport: &mut ChildTransport,
        transcript: &mut Transcript,
        deadline: Instant,
    ) -> ExchangeEnd {
        for (index, message) in self.scenario.messages.iter().enumerate() {
            if index > 0 {
                self.pause().await;
            }
            if !self.send(transport, transcript, message).await {
                return ExchangeEnd::Completed;
            }
            let Some(id) = message.id() else {
                continue;
            };
            loop {
                match transport.next_line(deadline).await {
                    Incoming::Line(line) => {
                        if self.observe(&line, transcript).as_ref() == Some(id) {
                            break;
                        }
                    }
                    Incoming::Closed => {
                        transcript.note(format!(
                            "server closed stdout before answering {}",
                            message.method()
                        ));
                        return ExchangeEnd::Completed;
                    }
                    Incoming::Elapsed => return ExchangeEnd::Elapsed,
                }
            }
        }
        ExchangeEnd::Completed
    }

    /// Send everything, close stdin, read until the server closes stdout.
    async fn exchange_batch(
        &self,
        transport: &mut ChildTransport,
        transcript: &mut Transcript,
        deadline: Instant,
    ) -> ExchangeEnd {
        for (index, message) in self.scenario.messages.iter().enumerate() {
            if index > 0 {
                self.pause().await;
            }
            if !self.send(transport, transcript, message).await {
                break;
            }
        }
        transport.close_stdin().await;

        loop {
            match transport.next_line(deadline).await {
                Incoming::Line(line) => {
                    self.observe(&line, transcript);
                }
                Incoming::Closed => return ExchangeEnd::Completed,
                Incoming::Elapsed => return ExchangeEnd::Elapsed,
            }
        }
    }

    /// Write one message. Returns `false` once the child stops accepting input.
    async fn send(
        &self,
        transport: &mut ChildTransport,
        transcript: &mut Transcript,
        message: &ProbeMessage,
    ) -> bool {
        match transport.send(message).await {
            Ok(line) => {
                transcript.record_sent(message.method(), line);
                true
            }
            Err(e) if e.is_broken_pipe() => {
                transcript.note(format!(
                    "server closed stdin before {} could be sent",
                    message.method()
                ));
                false
            }
            Err(e) => {
                transcript.note(format!("failed to send {}: {e}", message.method()));
                false
            }
        }
    }

    async fn drain_stdout(&self, transport: &mut ChildTransport, transcript: &mut Transcript) {
        let until = Instant::now() + STDOUT_DRAIN;
        while let Incoming::Line(line) = transport.next_line(until).await {
            self.observe(&line, transcript);
        }
    }

    async fn pause(&self) {
        let delay = self.config.message_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn observe(&self, line: &str, transcript: &mut Transcript) -> Option<RequestId> {
        observe_line(
            line,
            &self.scenario,
            &self.config.probe.protocol_version,
            transcript,
        )
    }

    fn judge(&self, transcript: &Transcript) -> Verdict {
        match self.scenario.matched_keyword(&transcript.stdout) {
            Some(keyword) => Verdict::CompletedSuccess {
                keyword: keyword.to_string(),
            },
            None => Verdict::CompletedFailure,
        }
    }
}

/// `now + timeout`, clamped when the sum overflows the clock.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

fn conclude(transcript: &mut Transcript, verdict: Verdict) {
    if let Err(e) = transcript.finish(verdict) {
        tracing::error!("{e}");
    }
}
