//! Configuration types, loaded from the environment.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{GROQ_BASE_URL, LlmBackend, LlmConfig};
use crate::pipeline::GenerationSettings;

const DEFAULT_PRIMARY_MODEL: &str = "llama3-8b-8192";
const DEFAULT_FALLBACK_MODEL: &str = "mistral-7b-instruct";

/// Stream loop settings.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Input topic name (labels logs; the transport decides what it means).
    pub input_topic: String,
    /// Output topic name.
    pub output_topic: String,
    /// How long a single poll waits for a record.
    pub poll_timeout: Duration,
    /// Pause after each processed record.
    pub record_delay: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            input_topic: "call-notes".to_string(),
            output_topic: "call-notes-enriched".to_string(),
            poll_timeout: Duration::from_millis(1000),
            record_delay: Duration::from_millis(250),
        }
    }
}

/// Full worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub primary: LlmConfig,
    pub fallback: LlmConfig,
    pub generation: GenerationSettings,
    pub stream: StreamConfig,
}

impl WorkerConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let request_timeout = Duration::from_secs(
            get("ENRICHER_REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
        );
        let base_url = get("GROQ_BASE_URL").unwrap_or_else(|| GROQ_BASE_URL.to_string());

        let llm = |role: &str, default_model: &str| -> Result<LlmConfig, ConfigError> {
            let backend_key = format!("ENRICHER_{role}_BACKEND");
            let backend = match get(&backend_key) {
                Some(raw) => raw
                    .parse::<LlmBackend>()
                    .map_err(|message| ConfigError::InvalidValue {
                        key: backend_key.clone(),
                        message,
                    })?,
                None => LlmBackend::Groq,
            };
            let api_key = get(backend.api_key_var())
                .ok_or_else(|| ConfigError::MissingEnvVar(backend.api_key_var().to_string()))?;
            let model =
                get(&format!("ENRICHER_{role}_MODEL")).unwrap_or_else(|| default_model.to_string());

            Ok(LlmConfig {
                backend,
                api_key: SecretString::from(api_key),
                model,
                base_url: base_url.clone(),
                request_timeout,
            })
        };

        let primary = llm("PRIMARY", DEFAULT_PRIMARY_MODEL)?;
        let fallback = llm("FALLBACK", DEFAULT_FALLBACK_MODEL)?;

        let defaults = GenerationSettings::default();
        let generation = GenerationSettings {
            temperature: get("ENRICHER_TEMPERATURE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.temperature),
            max_tokens: get("ENRICHER_MAX_TOKENS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_tokens),
        };

        let stream_defaults = StreamConfig::default();
        let stream = StreamConfig {
            input_topic: get("ENRICHER_INPUT_TOPIC").unwrap_or(stream_defaults.input_topic),
            output_topic: get("ENRICHER_OUTPUT_TOPIC").unwrap_or(stream_defaults.output_topic),
            poll_timeout: get("ENRICHER_POLL_TIMEOUT_MS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(stream_defaults.poll_timeout),
            record_delay: get("ENRICHER_RECORD_DELAY_MS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(stream_defaults.record_delay),
        };

        Ok(Self {
            primary,
            fallback,
            generation,
            stream,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_with_only_groq_key() {
        let config = WorkerConfig::from_lookup(lookup(&[("GROQ_API_KEY", "gsk-test")])).unwrap();

        assert_eq!(config.primary.backend, LlmBackend::Groq);
        assert_eq!(config.primary.model, "llama3-8b-8192");
        assert_eq!(config.fallback.model, "mistral-7b-instruct");
        assert_eq!(config.primary.api_key.expose_secret(), "gsk-test");
        assert_eq!(config.primary.base_url, GROQ_BASE_URL);
        assert_eq!(config.primary.request_timeout, Duration::from_secs(60));
        assert!((config.generation.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.generation.max_tokens, 1024);
        assert_eq!(config.stream.input_topic, "call-notes");
        assert_eq!(config.stream.poll_timeout, Duration::from_millis(1000));
        assert_eq!(config.stream.record_delay, Duration::from_millis(250));
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = WorkerConfig::from_lookup(lookup(&[])).unwrap_err();
        match err {
            ConfigError::MissingEnvVar(var) => assert_eq!(var, "GROQ_API_KEY"),
            other => panic!("Expected MissingEnvVar, got {:?}", other),
        }
    }

    #[test]
    fn blank_values_count_as_missing() {
        let err = WorkerConfig::from_lookup(lookup(&[("GROQ_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn mixed_backends_need_their_own_keys() {
        let err = WorkerConfig::from_lookup(lookup(&[
            ("GROQ_API_KEY", "gsk-test"),
            ("ENRICHER_FALLBACK_BACKEND", "anthropic"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "ANTHROPIC_API_KEY"));

        let config = WorkerConfig::from_lookup(lookup(&[
            ("GROQ_API_KEY", "gsk-test"),
            ("ANTHROPIC_API_KEY", "sk-ant-test"),
            ("ENRICHER_FALLBACK_BACKEND", "anthropic"),
            ("ENRICHER_FALLBACK_MODEL", "claude-3-5-haiku-latest"),
        ]))
        .unwrap();
        assert_eq!(config.fallback.backend, LlmBackend::Anthropic);
        assert_eq!(config.fallback.model, "claude-3-5-haiku-latest");
        assert_eq!(config.fallback.api_key.expose_secret(), "sk-ant-test");
    }

    #[test]
    fn unknown_backend_is_invalid() {
        let err = WorkerConfig::from_lookup(lookup(&[
            ("GROQ_API_KEY", "gsk-test"),
            ("ENRICHER_PRIMARY_BACKEND", "ollama"),
        ]))
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "ENRICHER_PRIMARY_BACKEND")
        );
    }

    #[test]
    fn overrides_are_applied() {
        let config = WorkerConfig::from_lookup(lookup(&[
            ("GROQ_API_KEY", "gsk-test"),
            ("ENRICHER_TEMPERATURE", "0.7"),
            ("ENRICHER_MAX_TOKENS", "256"),
            ("ENRICHER_OUTPUT_TOPIC", "enriched"),
            ("ENRICHER_RECORD_DELAY_MS", "0"),
            ("ENRICHER_POLL_TIMEOUT_MS", "not-a-number"),
        ]))
        .unwrap();
        assert!((config.generation.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.generation.max_tokens, 256);
        assert_eq!(config.stream.output_topic, "enriched");
        assert_eq!(config.stream.record_delay, Duration::ZERO);
        // Unparseable numbers fall back to the default.
        assert_eq!(config.stream.poll_timeout, Duration::from_millis(1000));
    }
}
