//! Error types for the enrichment worker.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
///
/// Every variant except `ChainExhausted` and `NoProviders` describes a single
/// backend call. The failover chain recovers from those by moving on to the
/// next backend.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("All {} providers failed: {}", .errors.len(), join_errors(.errors))]
    ChainExhausted { errors: Vec<LlmError> },

    #[error("No providers configured")]
    NoProviders,
}

fn join_errors(errors: &[LlmError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Stream transport and payload errors.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("Invalid payload: {0}")]
    Payload(String),

    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transport {transport} failed: {reason}")]
    Transport { transport: String, reason: String },
}
