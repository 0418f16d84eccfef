//! The remote completion call: one system instruction, one user message,
//! one reply.
//!
//! The call is metered, so this stage is deliberately blunt: no retries, no
//! streaming, no continuation. It is bounded by `api_timeout_secs`, and
//! dropping the returned future cancels the request.
//!
//! [`CompletionClient`] is the seam between the pipeline and the provider.
//! Production code uses [`LlmClient`] over an `edgequake-llm` provider; tests
//! plug in a fake that records what it was sent.

use crate::config::DigestConfig;
use crate::error::EssenceError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

/// Error type returned by [`CompletionClient`] implementations.
pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

/// Everything sent to the model for one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System instruction.
    pub system: String,
    /// The (possibly truncated) extracted text.
    pub user: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
}

/// The model's single reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// A remote completion service.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Issue exactly one completion request.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ClientError>;
}

/// [`CompletionClient`] backed by an `edgequake-llm` provider.
pub struct LlmClient {
    provider: Arc<dyn LLMProvider>,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl CompletionClient for LlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ClientError> {
        let messages = vec![
            ChatMessage::system(request.system.as_str()),
            ChatMessage::user(request.user.as_str()),
        ];
        let options = CompletionOptions {
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| e.to_string())?;

        Ok(Completion {
            content: response.content,
            prompt_tokens: response.prompt_tokens as usize,
            completion_tokens: response.completion_tokens as usize,
        })
    }
}

/// The first `max_chars` characters of `text` (Unicode scalar values, never
/// splitting a code point). Shorter text is returned unchanged.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Build the request for `text`, applying the character bound.
pub fn build_request(text: &str, config: &DigestConfig) -> CompletionRequest {
    CompletionRequest {
        system: config.effective_system_prompt(),
        user: truncate_chars(text, config.max_input_chars).to_string(),
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    }
}

/// Send `text` to the model and return its reply.
///
/// Input longer than `config.max_input_chars` is silently cut; it is never
/// rejected.
///
/// # Errors
/// * [`EssenceError::RemoteCall`]: any error reported by the client
/// * [`EssenceError::RemoteTimeout`]: no reply within `api_timeout_secs`
pub async fn summarize_and_map(
    client: &dyn CompletionClient,
    text: &str,
    config: &DigestConfig,
) -> Result<Completion, EssenceError> {
    let request = build_request(text, config);
    let sent = request.user.chars().count();
    if sent < text.chars().count() {
        info!("Input truncated to {} characters", sent);
    }

    let start = Instant::now();
    let secs = config.api_timeout_secs;

    let completion = match timeout(Duration::from_secs(secs), client.complete(&request)).await {
        Ok(Ok(c)) => c,
        Ok(Err(e)) => {
            warn!("Remote call failed: {}", e);
            return Err(EssenceError::RemoteCall {
                message: e.to_string(),
            });
        }
        Err(_) => {
            warn!("Remote call timed out after {}s", secs);
            return Err(EssenceError::RemoteTimeout { secs });
        }
    };

    debug!(
        "Reply: {} input tokens, {} output tokens, {:?}",
        completion.prompt_tokens,
        completion.completion_tokens,
        start.elapsed()
    );

    Ok(completion)
}
