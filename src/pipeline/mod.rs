//! Call-note enrichment pipeline.
//!
//! Every record that reaches the engine flows through:
//! 1. `ClassificationStage`: sentiment label via the LLM chain
//! 2. `gate::evaluate`: negative sentiment short-circuits (no LLM)
//! 3. `ActionStage`: recommended next actions via the LLM chain
//!
//! **Every record that reaches the engine produces a result.** Backend
//! failures are written into the result fields, never raised.

pub mod engine;
pub mod gate;
pub mod prompts;
pub mod stages;
pub mod types;

pub use engine::EnrichmentEngine;
pub use stages::GenerationSettings;
pub use types::{CallerNotes, EnrichmentResult, Outcome, SentimentKind, SentimentLabel};
