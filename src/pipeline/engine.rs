//! Enrichment engine: classification, sentiment gate, action generation.
//!
//! Three terminal outcomes per call:
//! 1. Classification failed → `Unknown` label, actions skipped
//! 2. Negative sentiment → no-action result, action stage never runs
//! 3. Anything else → action stage result (generated text, or a failure
//!    description if both backends failed)
//!
//! Classification failure is terminal because the gate depends on it. Action
//! failure is not: the record is still published with the failure text.

use std::sync::Arc;

use tracing::{info, warn};

use crate::llm::provider::LlmProvider;
use crate::pipeline::gate::{self, GateDecision};
use crate::pipeline::stages::{ActionStage, ClassificationStage, GenerationSettings};
use crate::pipeline::types::{CallerNotes, EnrichmentResult, Outcome, SentimentLabel};

pub const CLASSIFIED_REASON: &str = "sentiment identified via generation backend";
pub const SKIPPED_ACTIONS: &str = "skipped due to classification error";

/// Stateless orchestrator over the two stages.
pub struct EnrichmentEngine {
    classifier: ClassificationStage,
    actions: ActionStage,
}

impl EnrichmentEngine {
    /// Both stages share the same provider (normally a failover chain).
    pub fn new(llm: Arc<dyn LlmProvider>, settings: GenerationSettings) -> Self {
        Self {
            classifier: ClassificationStage::new(Arc::clone(&llm), settings.clone()),
            actions: ActionStage::new(llm, settings),
        }
    }

    /// Enrich one set of notes. Never fails; backend failures are described
    /// inside the returned result.
    pub async fn process(&self, notes: &CallerNotes) -> EnrichmentResult {
        let label = match self.classifier.classify(notes).await {
            Ok(label) => label,
            Err(e) => {
                warn!(error = %e, "Sentiment classification failed on every backend");
                return EnrichmentResult::new(
                    notes,
                    &SentimentLabel::unknown(),
                    format!("classification failed: {e}"),
                    SKIPPED_ACTIONS,
                    Outcome::ClassificationFailed,
                );
            }
        };

        if let GateDecision::ShortCircuit(result) = gate::evaluate(notes, &label) {
            info!("Negative sentiment, skipping action generation");
            return result;
        }

        match self.actions.recommend(notes, &label).await {
            Ok(items) => EnrichmentResult::new(
                notes,
                &label,
                CLASSIFIED_REASON,
                items,
                Outcome::Actioned,
            ),
            Err(e) => {
                warn!(error = %e, "Action generation failed on every backend");
                EnrichmentResult::new(
                    notes,
                    &label,
                    CLASSIFIED_REASON,
                    format!("action generation failed: {e}"),
                    Outcome::ActionFailed,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::LlmError;
    use crate::llm::FailoverProvider;
    use crate::llm::provider::{CompletionRequest, CompletionResponse, FinishReason};

    /// Mock backend that replays scripted replies, one per call.
    /// `None` means the call fails. Prompts are recorded for inspection.
    struct MockLlm {
        name: &'static str,
        script: Mutex<VecDeque<Option<&'static str>>>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl MockLlm {
        fn new(name: &'static str, script: Vec<Option<&'static str>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn action_calls(&self) -> usize {
            self.prompts
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.contains("sales assistant"))
                .count()
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlm {
        fn model_name(&self) -> &str {
            self.name
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts
                .lock()
                .unwrap()
                .push(request.last_user_text().unwrap_or_default().to_string());
            let next = self.script.lock().unwrap().pop_front().flatten();
            match next {
                Some(text) => Ok(CompletionResponse {
                    content: text.to_string(),
                    input_tokens: 10,
                    output_tokens: 5,
                    finish_reason: FinishReason::Stop,
                    model: self.name.to_string(),
                }),
                None => Err(LlmError::RequestFailed {
                    provider: self.name.to_string(),
                    reason: "service unavailable".into(),
                }),
            }
        }
    }

    fn engine(primary: &Arc<MockLlm>, fallback: &Arc<MockLlm>) -> EnrichmentEngine {
        let chain = FailoverProvider::primary_fallback(primary.clone(), fallback.clone());
        EnrichmentEngine::new(Arc::new(chain), GenerationSettings::default())
    }

    fn notes(text: &str) -> CallerNotes {
        CallerNotes::new(text).unwrap()
    }

    #[tokio::test]
    async fn classification_failure_is_terminal() {
        let primary = MockLlm::new("primary", vec![None, Some("should not be used")]);
        let fallback = MockLlm::new("fallback", vec![None, Some("should not be used")]);
        let engine = engine(&primary, &fallback);

        let result = engine.process(&notes("Left a voicemail")).await;

        assert_eq!(result.sentiment_label(), "Unknown");
        assert_eq!(result.next_action_items(), SKIPPED_ACTIONS);
        assert!(result.reason().contains("service unavailable"));
        assert_eq!(result.outcome(), Outcome::ClassificationFailed);
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
        assert_eq!(primary.action_calls(), 0);
        assert_eq!(fallback.action_calls(), 0);
    }

    #[tokio::test]
    async fn negative_label_skips_action_stage() {
        let primary = MockLlm::new(
            "primary",
            vec![Some("Negative: tone was dismissive"), Some("unused")],
        );
        let fallback = MockLlm::new("fallback", vec![]);
        let engine = engine(&primary, &fallback);

        let result = engine.process(&notes("Said never call again")).await;

        assert_eq!(result.sentiment_label(), "Negative: tone was dismissive");
        assert_eq!(result.reason(), gate::NEGATIVE_REASON);
        assert_eq!(result.next_action_items(), gate::NEGATIVE_ACTIONS);
        assert_eq!(primary.calls(), 1);
        assert_eq!(primary.action_calls(), 0);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn uppercase_negative_label_skips_action_stage() {
        let primary = MockLlm::new("primary", vec![Some("NEGATIVE - tone was curt")]);
        let fallback = MockLlm::new("fallback", vec![]);
        let engine = engine(&primary, &fallback);

        let result = engine.process(&notes("Curt reply, hung up")).await;
        assert_eq!(result.outcome(), Outcome::NegativeShortCircuit);
        assert_eq!(primary.action_calls(), 0);
    }

    #[tokio::test]
    async fn positive_label_returns_trimmed_action_text() {
        let primary = MockLlm::new(
            "primary",
            vec![
                Some("  Positive - wants pricing  "),
                Some("\n1. Send pricing sheet\n2. Book follow-up call\n"),
            ],
        );
        let fallback = MockLlm::new("fallback", vec![]);
        let engine = engine(&primary, &fallback);

        let result = engine
            .process(&notes("Customer loved the demo, wants pricing info"))
            .await;

        assert_eq!(result.caller_notes(), "Customer loved the demo, wants pricing info");
        assert_eq!(result.sentiment_label(), "Positive - wants pricing");
        assert_eq!(result.reason(), CLASSIFIED_REASON);
        assert_eq!(
            result.next_action_items(),
            "1. Send pricing sheet\n2. Book follow-up call"
        );
        assert_eq!(result.outcome(), Outcome::Actioned);
        assert_eq!(primary.action_calls(), 1);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn action_prompt_carries_label() {
        let primary = MockLlm::new(
            "primary",
            vec![Some("Neutral / Follow-up Required"), Some("Email in two weeks")],
        );
        let fallback = MockLlm::new("fallback", vec![]);
        let engine = engine(&primary, &fallback);

        engine.process(&notes("Busy, call back later")).await;

        let prompts = primary.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("Busy, call back later"));
        assert!(prompts[1].contains("Sentiment label: Neutral / Follow-up Required"));
    }

    #[tokio::test]
    async fn unrecognized_label_falls_through_to_actions() {
        let primary = MockLlm::new(
            "primary",
            vec![Some("Hard to say, mixed signals"), Some("Send a case study")],
        );
        let fallback = MockLlm::new("fallback", vec![]);
        let engine = engine(&primary, &fallback);

        let result = engine.process(&notes("Asked a few questions")).await;
        assert_eq!(result.next_action_items(), "Send a case study");
        assert_eq!(primary.action_calls(), 1);
    }

    #[tokio::test]
    async fn action_failure_is_not_terminal() {
        let primary = MockLlm::new("primary", vec![Some("Positive"), None]);
        let fallback = MockLlm::new("fallback", vec![None]);
        let engine = engine(&primary, &fallback);

        let result = engine.process(&notes("Keen to trial")).await;

        assert_eq!(result.sentiment_label(), "Positive");
        assert_eq!(result.reason(), CLASSIFIED_REASON);
        assert!(result.next_action_items().starts_with("action generation failed"));
        assert!(result.next_action_items().contains("service unavailable"));
        assert_eq!(result.outcome(), Outcome::ActionFailed);
        assert_eq!(primary.calls(), 2);
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn classification_fails_over_to_fallback() {
        let primary = MockLlm::new("primary", vec![None, Some("Follow up on Friday")]);
        let fallback = MockLlm::new("fallback", vec![Some("Neutral / Follow-up Required")]);
        let engine = engine(&primary, &fallback);

        let result = engine.process(&notes("Maybe next month")).await;

        assert_eq!(result.sentiment_label(), "Neutral / Follow-up Required");
        assert_eq!(result.next_action_items(), "Follow up on Friday");
        // Primary: one failed classification attempt, then the action call.
        assert_eq!(primary.calls(), 2);
        assert_eq!(fallback.calls(), 1);
        let primary_prompts = primary.prompts.lock().unwrap();
        assert!(primary_prompts[0].contains("Classify the following"));
    }

    #[tokio::test]
    async fn calls_are_independent() {
        let primary = MockLlm::new(
            "primary",
            vec![Some("Negative"), Some("Positive"), Some("Book demo")],
        );
        let fallback = MockLlm::new("fallback", vec![]);
        let engine = engine(&primary, &fallback);

        let first = engine.process(&notes("No interest")).await;
        let second = engine.process(&notes("Great call")).await;

        assert_eq!(first.outcome(), Outcome::NegativeShortCircuit);
        assert_eq!(second.outcome(), Outcome::Actioned);
        assert_eq!(second.next_action_items(), "Book demo");
    }
}
