//! The two generation stages. Both share one `LlmProvider`, normally a
//! `FailoverProvider` chain, and differ only in the prompt they render.

use std::sync::Arc;

use tracing::debug;

use crate::error::LlmError;
use crate::llm::provider::{CompletionRequest, LlmProvider};
use crate::pipeline::prompts::{build_action_prompt, build_sentiment_prompt};
use crate::pipeline::types::{CallerNotes, SentimentLabel};

/// Sampling settings applied to every generation call.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 1024,
        }
    }
}

impl GenerationSettings {
    fn request(&self, prompt: String) -> CompletionRequest {
        CompletionRequest::prompt(prompt)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }
}

/// Classifies caller notes into a sentiment label.
pub struct ClassificationStage {
    llm: Arc<dyn LlmProvider>,
    settings: GenerationSettings,
}

impl ClassificationStage {
    pub fn new(llm: Arc<dyn LlmProvider>, settings: GenerationSettings) -> Self {
        Self { llm, settings }
    }

    /// Run the classification prompt. Errors only when the whole chain failed.
    pub async fn classify(&self, notes: &CallerNotes) -> Result<SentimentLabel, LlmError> {
        let request = self.settings.request(build_sentiment_prompt(notes));
        let response = self.llm.complete(request).await?;
        let label = SentimentLabel::from_backend(&response.content);
        debug!(
            model = %response.model,
            kind = label.kind().label(),
            "Sentiment classified"
        );
        Ok(label)
    }
}

/// Generates recommended next actions for non-negative notes.
pub struct ActionStage {
    llm: Arc<dyn LlmProvider>,
    settings: GenerationSettings,
}

impl ActionStage {
    pub fn new(llm: Arc<dyn LlmProvider>, settings: GenerationSettings) -> Self {
        Self { llm, settings }
    }

    /// Run the action prompt and return the trimmed text.
    pub async fn recommend(
        &self,
        notes: &CallerNotes,
        sentiment: &SentimentLabel,
    ) -> Result<String, LlmError> {
        let request = self.settings.request(build_action_prompt(notes, sentiment));
        let response = self.llm.complete(request).await?;
        debug!(
            model = %response.model,
            output_tokens = response.output_tokens,
            "Action items generated"
        );
        Ok(response.content.trim().to_string())
    }
}
