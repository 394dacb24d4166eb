//! Background capture of a child output stream.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

const CHUNK_SIZE: usize = 4096;

/// Collects everything a stream produces until EOF.
///
/// Bytes are appended as they arrive, so whatever was read so far is still
/// available if the stream never closes.
pub struct StreamCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    handle: JoinHandle<()>,
}

impl StreamCapture {
    /// Spawn a task draining `stream`.
    pub fn spawn<R>(mut stream: R, label: &'static str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = buffer.clone();
        let handle = tokio::spawn(async move {
            let mut chunk = vec![0u8; CHUNK_SIZE];
            loop {
                match stream.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => sink.lock().await.extend_from_slice(&chunk[..n]),
                    Err(e) => {
                        tracing::warn!("Error reading child {label}: {e}");
                        break;
                    }
                }
            }
            tracing::debug!("Child {label} closed");
        });
        Self { buffer, handle }
    }

    /// Wait up to `wait` for EOF, then return the captured text.
    pub async fn finish(self, wait: Duration) -> String {
        let Self { buffer, mut handle } = self;
        if tokio::time::timeout(wait, &mut handle).await.is_err() {
            tracing::debug!("Stream still open after {wait:?}; keeping partial capture");
            handle.abort();
        }
        let bytes = buffer.lock().await;
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
