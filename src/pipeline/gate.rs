//! Sentiment gate: decides whether action generation runs. No I/O.

use crate::pipeline::types::{CallerNotes, EnrichmentResult, Outcome, SentimentLabel};

pub const NEGATIVE_REASON: &str = "negative sentiment detected";
pub const NEGATIVE_ACTIONS: &str = "no action recommended due to negative sentiment";

/// What to do after a successful classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Negative sentiment: this result is final.
    ShortCircuit(EnrichmentResult),
    /// Anything else, including labels with no known prefix.
    Proceed,
}

/// Branch on the label text. Only a case-insensitive "negative" prefix stops
/// the pipeline; unrecognized labels fall through to action generation.
pub fn evaluate(notes: &CallerNotes, label: &SentimentLabel) -> GateDecision {
    if label.is_negative() {
        GateDecision::ShortCircuit(EnrichmentResult::new(
            notes,
            label,
            NEGATIVE_REASON,
            NEGATIVE_ACTIONS,
            Outcome::NegativeShortCircuit,
        ))
    } else {
        GateDecision::Proceed
    }
}
