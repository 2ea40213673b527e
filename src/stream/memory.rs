//! In-memory transport over bounded mpsc channels.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::StreamError;
use crate::stream::{Delivery, RecordSink, RecordSource};

/// Receives payloads pushed into a channel. Ends when every sender is dropped.
pub struct MemorySource {
    rx: mpsc::Receiver<Vec<u8>>,
    closed: bool,
}

impl MemorySource {
    /// Create a source and the sender that feeds it.
    pub fn channel(capacity: usize) -> (mpsc::Sender<Vec<u8>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx, closed: false })
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn poll(&mut self, timeout: Duration) -> Result<Delivery, StreamError> {
        if self.closed {
            return Ok(Delivery::EndOfStream);
        }
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(payload)) => Ok(Delivery::Record(payload)),
            Ok(None) => Ok(Delivery::EndOfStream),
            Err(_) => Ok(Delivery::Empty),
        }
    }

    async fn close(&mut self) -> Result<(), StreamError> {
        self.rx.close();
        self.closed = true;
        Ok(())
    }
}

/// A published payload and the topic it was sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Forwards published payloads into a channel.
pub struct MemorySink {
    tx: mpsc::Sender<Published>,
}

impl MemorySink {
    /// Create a sink and the receiver that observes what it publishes.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Published>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), StreamError> {
        self.tx
            .send(Published {
                topic: topic.to_string(),
                payload,
            })
            .await
            .map_err(|_| StreamError::Transport {
                transport: "memory".into(),
                reason: "receiver dropped".into(),
            })
    }

    async fn flush(&mut self) -> Result<(), StreamError> {
        Ok(())
    }
}
