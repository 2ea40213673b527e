//! Stream worker: polls raw records, enriches them, publishes the result.
//!
//! Loop:
//! 1. `RecordSource::poll()` (raced against the shutdown signal)
//! 2. Parse the JSON object, extract `comments`
//! 3. `EnrichmentEngine::process()` (also raced against shutdown)
//! 4. Merge the result under `result`, publish, flush
//!
//! Each record is handled inside its own error boundary: payload and
//! transport failures are logged and the loop moves on. Only the shutdown
//! signal or the end of the source stops it, and the source is closed on
//! both paths.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::pipeline::{CallerNotes, EnrichmentEngine, EnrichmentResult};
use crate::stream::{Delivery, Record, RecordSink, RecordSource};

/// Field holding the caller notes in inbound records.
pub const NOTES_FIELD: &str = "comments";
/// Field the enrichment result is written to in outbound records.
pub const RESULT_FIELD: &str = "result";

/// Counters for one run of the loop.
#[derive(Debug, Clone)]
pub struct WorkerStats {
    pub started_at: DateTime<Utc>,
    /// Records pulled from the source.
    pub received: u64,
    /// Enriched records published.
    pub published: u64,
    /// Records with blank or missing notes.
    pub skipped: u64,
    /// Records dropped because of a payload or publish error.
    pub failed: u64,
    /// Poll errors from the source.
    pub transport_errors: u64,
}

impl WorkerStats {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            received: 0,
            published: 0,
            skipped: 0,
            failed: 0,
            transport_errors: 0,
        }
    }
}

/// What happened to one record.
#[derive(Debug)]
enum RecordOutcome {
    Published,
    Skipped,
}

/// Drives records from a source through the engine into a sink, one at a time.
pub struct StreamWorker {
    engine: Arc<EnrichmentEngine>,
    config: StreamConfig,
}

impl StreamWorker {
    pub fn new(engine: Arc<EnrichmentEngine>, config: StreamConfig) -> Self {
        Self { engine, config }
    }

    /// Run until `shutdown` resolves or the source ends.
    ///
    /// The shutdown future is polled while waiting on the source, while a
    /// record is being enriched and during the inter-record delay. A record
    /// interrupted mid-enrichment is dropped unpublished.
    pub async fn run<S, K, F>(&self, mut source: S, mut sink: K, shutdown: F) -> WorkerStats
    where
        S: RecordSource,
        K: RecordSink,
        F: Future<Output = ()>,
    {
        let mut stats = WorkerStats::new();
        tokio::pin!(shutdown);

        info!(
            source = source.name(),
            sink = sink.name(),
            input = %self.config.input_topic,
            output = %self.config.output_topic,
            "Listening for call notes"
        );

        loop {
            let delivery = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping");
                    break;
                }
                polled = source.poll(self.config.poll_timeout) => polled,
            };

            let payload = match delivery {
                Ok(Delivery::Record(payload)) => payload,
                Ok(Delivery::Empty) => continue,
                Ok(Delivery::EndOfStream) => {
                    info!("Input stream ended, stopping");
                    break;
                }
                Err(e) => {
                    stats.transport_errors += 1;
                    warn!(error = %e, "Poll failed");
                    continue;
                }
            };

            stats.received += 1;
            let record_id = Uuid::new_v4();

            let handled = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    warn!(record = %record_id, "Shutdown signal received mid-record, dropping it");
                    break;
                }
                handled = self.handle_record(&payload, &mut sink) => handled,
            };

            match handled {
                Ok(RecordOutcome::Published) => {
                    stats.published += 1;
                    info!(
                        record = %record_id,
                        topic = %self.config.output_topic,
                        "Published enriched record"
                    );
                }
                Ok(RecordOutcome::Skipped) => {
                    stats.skipped += 1;
                    warn!(record = %record_id, "Skipping record with empty comments");
                }
                Err(e) => {
                    stats.failed += 1;
                    error!(record = %record_id, error = %e, "Failed to process record");
                }
            }

            if !self.config.record_delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = &mut shutdown => {
                        info!("Shutdown signal received, stopping");
                        break;
                    }
                    _ = tokio::time::sleep(self.config.record_delay) => {}
                }
            }
        }

        if let Err(e) = source.close().await {
            warn!(error = %e, "Failed to close input stream");
        }
        if let Err(e) = sink.flush().await {
            warn!(error = %e, "Failed to flush output stream");
        }

        info!(
            received = stats.received,
            published = stats.published,
            skipped = stats.skipped,
            failed = stats.failed,
            transport_errors = stats.transport_errors,
            uptime_secs = (Utc::now() - stats.started_at).num_seconds(),
            "Stream worker stopped"
        );
        stats
    }

    /// Per-record error boundary: everything that can fail for one record.
    async fn handle_record<K: RecordSink>(
        &self,
        payload: &[u8],
        sink: &mut K,
    ) -> Result<RecordOutcome, StreamError> {
        let record = parse_record(payload)?;
        let Some(notes) = extract_notes(&record)? else {
            return Ok(RecordOutcome::Skipped);
        };

        let result = self.engine.process(&notes).await;
        debug!(
            outcome = result.outcome().label(),
            sentiment = %result.sentiment_label(),
            "Record enriched"
        );

        let enriched = merge_result(record, &result)?;
        sink.publish(&self.config.output_topic, enriched).await?;
        sink.flush().await?;
        Ok(RecordOutcome::Published)
    }
}

/// Parse a raw payload as a JSON object.
pub fn parse_record(payload: &[u8]) -> Result<Record, StreamError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Extract the caller notes. `Ok(None)` when the field is absent, null or blank.
pub fn extract_notes(record: &Record) -> Result<Option<CallerNotes>, StreamError> {
    let Some(raw) = record.get(NOTES_FIELD) else {
        return Ok(None);
    };
    match serde_json::from_str::<Value>(raw.get())? {
        Value::Null => Ok(None),
        Value::String(text) => Ok(CallerNotes::new(&text)),
        other => Err(StreamError::Payload(format!(
            "`{NOTES_FIELD}` must be a string, got {}",
            json_kind(&other)
        ))),
    }
}

/// Insert the result into the original record and serialize it.
/// Every other field is written back exactly as it arrived.
pub fn merge_result(mut record: Record, result: &EnrichmentResult) -> Result<Vec<u8>, StreamError> {
    record.insert(RESULT_FIELD, serde_json::value::to_raw_value(result)?);
    Ok(serde_json::to_vec(&record)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
