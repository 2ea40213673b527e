//! Stream transport abstraction and the record-processing loop.
//!
//! The broker client is an external collaborator: the worker only needs a
//! `RecordSource` to poll raw payloads from and a `RecordSink` to publish
//! enriched payloads to. Two transports ship with the crate:
//! - `lines`: newline-delimited JSON, read on a dedicated thread and written
//!   through any async writer (stdio in the binary, so a broker CLI can be
//!   piped in and out)
//! - `memory`: bounded `tokio::sync::mpsc` channels, for tests and embedding

pub mod lines;
pub mod memory;
pub mod record;
pub mod worker;

pub use lines::{LineSink, LineSource};
pub use memory::{MemorySink, MemorySource};
pub use record::Record;
pub use worker::{StreamWorker, WorkerStats};

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StreamError;

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A raw record payload.
    Record(Vec<u8>),
    /// Nothing arrived within the poll timeout.
    Empty,
    /// The source has no more records and never will.
    EndOfStream,
}

/// Input side of the stream.
#[async_trait]
pub trait RecordSource: Send {
    /// Transport name for logging.
    fn name(&self) -> &str;

    /// Wait up to `timeout` for the next record.
    async fn poll(&mut self, timeout: Duration) -> Result<Delivery, StreamError>;

    /// Release the subscription. Called once on every exit path of the loop.
    async fn close(&mut self) -> Result<(), StreamError>;
}

/// Output side of the stream.
#[async_trait]
pub trait RecordSink: Send {
    /// Transport name for logging.
    fn name(&self) -> &str;

    /// Publish one payload to `topic`.
    async fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), StreamError>;

    /// Flush anything buffered by `publish`.
    async fn flush(&mut self) -> Result<(), StreamError>;
}
