//! Callnote Enricher: streaming sentiment and follow-up enrichment worker.

pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod stream;
