//! Newline-delimited JSON transport: one record per line.

use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::StreamError;
use crate::stream::{Delivery, MemorySource, RecordSink, RecordSource};

/// Lines buffered ahead of the worker when reading stdin.
const STDIN_BUFFER: usize = 16;

/// Reads one record per line on a dedicated OS thread. Blank lines are skipped.
///
/// A blocking read (stdin in particular) cannot be cancelled, so it never runs
/// on the runtime: closing the source or exiting the process does not wait
/// for the next line to arrive.
pub struct LineSource {
    inner: MemorySource,
}

impl LineSource {
    /// Start reading `reader`. At most `capacity` lines are buffered.
    pub fn spawn<R>(reader: R, capacity: usize) -> Result<Self, StreamError>
    where
        R: Read + Send + 'static,
    {
        let (tx, inner) = MemorySource::channel(capacity);
        std::thread::Builder::new()
            .name("line-reader".into())
            .spawn(move || read_lines(BufReader::new(reader), &tx))
            .map_err(|e| StreamError::Transport {
                transport: "lines".into(),
                reason: format!("failed to start reader thread: {e}"),
            })?;
        Ok(Self { inner })
    }

    pub fn stdin() -> Result<Self, StreamError> {
        Self::spawn(std::io::stdin(), STDIN_BUFFER)
    }
}

/// Forward non-blank lines until EOF, a read error, or the source closing.
fn read_lines<R: BufRead>(mut reader: R, tx: &mpsc::Sender<Vec<u8>>) {
    loop {
        let mut line = Vec::new();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => return,
            Ok(_) => {
                while matches!(line.last(), Some(b'\n' | b'\r')) {
                    line.pop();
                }
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                if tx.blocking_send(line).is_err() {
                    return;
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "Line reader stopped");
                return;
            }
        }
    }
}

#[async_trait]
impl RecordSource for LineSource {
    fn name(&self) -> &str {
        "lines"
    }

    async fn poll(&mut self, timeout: Duration) -> Result<Delivery, StreamError> {
        self.inner.poll(timeout).await
    }

    async fn close(&mut self) -> Result<(), StreamError> {
        // The reader thread exits on its next send; a read it is parked in
        // is abandoned with the process.
        self.inner.close().await
    }
}

/// Writes one record per line. The topic is not part of the line format.
pub struct LineSink<W> {
    writer: W,
}

impl<W> LineSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl LineSink<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

fn write_error(e: std::io::Error) -> StreamError {
    StreamError::Transport {
        transport: "lines".into(),
        reason: format!("write failed: {e}"),
    }
}

#[async_trait]
impl<W> RecordSink for LineSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &str {
        "lines"
    }

    async fn publish(&mut self, _topic: &str, mut payload: Vec<u8>) -> Result<(), StreamError> {
        if payload.contains(&b'\n') {
            return Err(StreamError::Payload(
                "payload contains a newline and cannot be framed as a line".into(),
            ));
        }
        payload.push(b'\n');
        self.writer.write_all(&payload).await.map_err(write_error)
    }

    async fn flush(&mut self) -> Result<(), StreamError> {
        self.writer.flush().await.map_err(write_error)
    }
}
