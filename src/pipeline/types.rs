//! Shared types for the enrichment pipeline.

use std::fmt;

use serde::Serialize;

// ── Caller notes ────────────────────────────────────────────────────

/// Free-text caller notes from a cold call. Never blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CallerNotes(String);

impl CallerNotes {
    /// Trim and wrap the text. Returns `None` for empty or whitespace-only input.
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerNotes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Sentiment ───────────────────────────────────────────────────────

/// Category parsed from the leading word of a sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentKind {
    Positive,
    /// "Neutral / Follow-up Required".
    Neutral,
    Negative,
    /// Classification failed; no label was produced.
    Unknown,
    /// The backend answered, but with no recognizable leading label.
    Unrecognized,
}

impl SentimentKind {
    /// Case-insensitive prefix match on the label text.
    pub fn from_label(text: &str) -> Self {
        let lower = text.trim_start().to_lowercase();
        if lower.starts_with("negative") {
            Self::Negative
        } else if lower.starts_with("positive") {
            Self::Positive
        } else if lower.starts_with("neutral")
            || lower.starts_with("follow-up")
            || lower.starts_with("follow up")
        {
            Self::Neutral
        } else {
            Self::Unrecognized
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
            Self::Unknown => "unknown",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// Sentiment label text as returned by the backend, plus its parsed kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentimentLabel {
    text: String,
    kind: SentimentKind,
}

impl SentimentLabel {
    /// Label text used when classification failed.
    pub const UNKNOWN_TEXT: &'static str = "Unknown";

    /// Wrap backend output. The text is trimmed; the kind is parsed from it.
    pub fn from_backend(text: &str) -> Self {
        let text = text.trim().to_string();
        let kind = SentimentKind::from_label(&text);
        Self { text, kind }
    }

    pub fn unknown() -> Self {
        Self {
            text: Self::UNKNOWN_TEXT.to_string(),
            kind: SentimentKind::Unknown,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> SentimentKind {
        self.kind
    }

    /// True when the label starts with "negative", ignoring case.
    pub fn is_negative(&self) -> bool {
        self.kind == SentimentKind::Negative
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// ── Result record ───────────────────────────────────────────────────

/// Which terminal path produced an `EnrichmentResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Both backends failed to classify.
    ClassificationFailed,
    /// Negative sentiment; action generation skipped.
    NegativeShortCircuit,
    /// Action items generated.
    Actioned,
    /// Classified, but both backends failed to generate actions.
    ActionFailed,
}

impl Outcome {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ClassificationFailed => "classification_failed",
            Self::NegativeShortCircuit => "negative_short_circuit",
            Self::Actioned => "actioned",
            Self::ActionFailed => "action_failed",
        }
    }
}

/// Enriched output for one record. Serialized into the `result` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichmentResult {
    #[serde(rename = "Caller Notes")]
    caller_notes: String,
    #[serde(rename = "Sentiment Label")]
    sentiment_label: String,
    #[serde(rename = "Reason")]
    reason: String,
    #[serde(rename = "Next Action Items")]
    next_action_items: String,
    #[serde(skip)]
    outcome: Outcome,
}

impl EnrichmentResult {
    pub(crate) fn new(
        notes: &CallerNotes,
        label: &SentimentLabel,
        reason: impl Into<String>,
        next_action_items: impl Into<String>,
        outcome: Outcome,
    ) -> Self {
        Self {
            caller_notes: notes.as_str().to_string(),
            sentiment_label: label.text().to_string(),
            reason: reason.into(),
            next_action_items: next_action_items.into(),
            outcome,
        }
    }

    pub fn caller_notes(&self) -> &str {
        &self.caller_notes
    }

    pub fn sentiment_label(&self) -> &str {
        &self.sentiment_label
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn next_action_items(&self) -> &str {
        &self.next_action_items
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }
}
