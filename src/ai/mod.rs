//! Completion service integration.
//!
//! Sends a fixed system prompt plus a user message to a hosted chat-completion
//! model and turns the reply into a JSON object.
//!
//! ## Features
//!
//! - One request per call, no retries, no rate limiting
//! - JSON-object output requested at a fixed temperature
//! - Tagged [`CompletionError`] values that keep the raw reply for inspection

mod openai;
mod sanitizer;

pub use openai::{OpenAIProvider, DEFAULT_BASE_URL};
pub use sanitizer::{
    sanitize, Recovered, RecoveryStrategy, SanitizeFailure, StrategyAttempt, STRATEGIES,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sampling temperature used for every request.
pub const TEMPERATURE: f32 = 0.7;

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Trait for chat-completion providers.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send one system prompt and one user message, return the raw reply text.
    async fn complete(&self, system: &str, user_message: &str) -> anyhow::Result<String>;

    /// Get the provider name.
    fn name(&self) -> &str;

    /// Get the model identifier requests are sent to.
    fn model(&self) -> &str;
}

/// Failure of a single completion step.
///
/// Stored in project state next to successful results, so it serializes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompletionError {
    /// Network, authentication, quota or any other service failure.
    #[error("API error: {message}")]
    Transport { message: String },

    /// The reply held no recoverable JSON object.
    #[error("response is not valid JSON")]
    Malformed { raw: String },

    /// The reply parsed but does not have the expected shape.
    #[error("unexpected response format: {error}")]
    Schema { error: String, raw: String },
}

impl CompletionError {
    /// Raw reply text, when the service answered at all.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::Transport { .. } => None,
            Self::Malformed { raw } | Self::Schema { raw, .. } => Some(raw),
        }
    }
}

/// A reply that was recovered into a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonReply {
    /// Text exactly as the provider returned it
    pub raw: String,
    /// Recovered object
    pub object: Map<String, Value>,
    /// Strategy that recovered it
    pub strategy: RecoveryStrategy,
}

/// Issue one request and recover a JSON object from the reply.
pub async fn complete_json(
    provider: &dyn CompletionProvider,
    system: &str,
    user_message: &str,
) -> Result<JsonReply, CompletionError> {
    tracing::debug!(provider = provider.name(), model = provider.model(), "Sending completion request");

    let raw = provider.complete(system, user_message).await.map_err(|e| {
        tracing::warn!(provider = provider.name(), error = %e, "Completion request failed");
        CompletionError::Transport { message: format!("{e:#}") }
    })?;

    match sanitize(&raw) {
        Ok(Recovered { object, strategy }) => Ok(JsonReply { raw, object, strategy }),
        Err(failure) => {
            tracing::warn!(attempts = failure.attempts.len(), "Reply is not valid JSON");
            Err(CompletionError::Malformed { raw: failure.raw })
        }
    }
}
