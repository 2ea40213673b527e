//! Ordered failover across LLM providers.
//!
//! `FailoverProvider` wraps a priority-ordered list of backends and is itself
//! an `LlmProvider`, so callers never see the try-then-try-next logic. Each
//! backend gets exactly one attempt per call; the first success wins. When
//! every backend fails the caller receives `LlmError::ChainExhausted` with the
//! underlying errors in the order they occurred.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider};

/// Tries providers in order, short-circuiting on the first success.
pub struct FailoverProvider {
    providers: Vec<Arc<dyn LlmProvider>>,
    name: String,
}

impl FailoverProvider {
    /// Build a chain from providers in priority order (primary first).
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>) -> Result<Self, LlmError> {
        if providers.is_empty() {
            return Err(LlmError::NoProviders);
        }
        let name = providers
            .iter()
            .map(|p| p.model_name())
            .collect::<Vec<_>>()
            .join(" -> ");
        Ok(Self { providers, name })
    }

    /// Convenience for the common primary/fallback pair.
    pub fn primary_fallback(primary: Arc<dyn LlmProvider>, fallback: Arc<dyn LlmProvider>) -> Self {
        let name = format!("{} -> {}", primary.model_name(), fallback.model_name());
        Self {
            providers: vec![primary, fallback],
            name,
        }
    }
}

#[async_trait]
impl LlmProvider for FailoverProvider {
    fn model_name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut errors = Vec::with_capacity(self.providers.len());

        for (idx, provider) in self.providers.iter().enumerate() {
            match provider.complete(request.clone()).await {
                Ok(response) => {
                    if idx > 0 {
                        debug!(
                            model = provider.model_name(),
                            attempt = idx + 1,
                            "Fallback provider succeeded"
                        );
                    }
                    return Ok(response);
                }
                Err(e) => {
                    let has_next = idx + 1 < self.providers.len();
                    warn!(
                        model = provider.model_name(),
                        error = %e,
                        fallback = has_next,
                        "LLM provider failed"
                    );
                    errors.push(e);
                }
            }
        }

        Err(LlmError::ChainExhausted { errors })
    }
}
