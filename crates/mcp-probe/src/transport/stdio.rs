//! Line-delimited JSON over a child's stdin and stdout.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::protocol::ProbeMessage;
use crate::types::{ProbeError, ProbeResult};

/// Result of waiting for the next stdout line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// One line, without its line terminator.
    Line(String),
    /// The child closed stdout.
    Closed,
    /// The deadline passed first.
    Elapsed,
}

/// Writes probe messages to the child and hands back its stdout lines.
pub struct StdioTransport<W> {
    stdin: Option<W>,
    lines: mpsc::UnboundedReceiver<String>,
    reader: JoinHandle<()>,
}

impl<W> StdioTransport<W>
where
    W: AsyncWrite + Unpin,
{
    /// Wrap the child's stdin and start reading its stdout in the background.
    pub fn new<R>(stdin: W, stdout: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, lines) = mpsc::unbounded_channel();
        let reader = tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {
                        let line = String::from_utf8_lossy(&buf)
                            .trim_end_matches(&['\r', '\n'][..])
                            .to_string();
                        tracing::debug!("<- {line}");
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Error reading child stdout: {e}");
                        break;
                    }
                }
            }
        });

        Self {
            stdin: Some(stdin),
            lines,
            reader,
        }
    }

    /// Serialize `message`, write it as one line, and flush.
    ///
    /// Returns the line that was written, without the newline.
    pub async fn send(&mut self, message: &ProbeMessage) -> ProbeResult<String> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ProbeError::Transport("stdin already closed".to_string()))?;

        let line = message.to_line()?;
        tracing::debug!("-> {line}");

        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(line)
    }

    /// Close stdin so the child sees EOF.
    pub async fn close_stdin(&mut self) {
        if let Some(mut stdin) = self.stdin.take() {
            if let Err(e) = stdin.shutdown().await {
                tracing::debug!("Closing child stdin: {e}");
            }
        }
    }

    /// Wait for the next stdout line, giving up at `deadline`.
    pub async fn next_line(&mut self, deadline: Instant) -> Incoming {
        match tokio::time::timeout_at(deadline, self.lines.recv()).await {
            Ok(Some(line)) => Incoming::Line(line),
            Ok(None) => Incoming::Closed,
            Err(_) => Incoming::Elapsed,
        }
    }
}

impl<W> Drop for StdioTransport<W> {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
