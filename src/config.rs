//! Configuration for the digest pipeline.
//!
//! Everything the pipeline needs from the outside world, including the gate
//! secret, is carried by one [`DigestConfig`] handed to
//! [`crate::digest::DigestPipeline`] at construction. Nothing is read from
//! process-wide globals at request time.

use crate::error::EssenceError;
use crate::prompts::DEFAULT_DELIMITER;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Default model when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Default cap on characters sent to the model.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 12_000;

/// Configuration for one digest pipeline.
///
/// Built via [`DigestConfig::builder()`].
///
/// # Example
/// ```rust
/// use essence_map::DigestConfig;
///
/// let config = DigestConfig::builder()
///     .gate_secret("SKKU2026")
///     .model("gpt-4.1-mini")
///     .temperature(0.3)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_input_chars, 12_000);
/// ```
#[derive(Clone)]
pub struct DigestConfig {
    /// Shared secret every submission's code is compared against.
    pub gate_secret: String,

    /// LLM model identifier, e.g. "gpt-4.1-nano", "deepseek-chat".
    /// If None, uses [`DEFAULT_MODEL`] or the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. None leaves the service default in place.
    pub temperature: Option<f32>,

    /// Maximum tokens the model may generate. None leaves the service default.
    pub max_tokens: Option<usize>,

    /// Input longer than this many characters is cut to its first
    /// `max_input_chars` characters. Default: 12 000.
    pub max_input_chars: usize,

    /// Custom system prompt. If None, derived from `delimiter`.
    pub system_prompt: Option<String>,

    /// Marker splitting the reply into summary and diagram. Default: ```` ```mermaid ````.
    pub delimiter: String,

    /// Timeout for the completion call in seconds. Default: 120.
    pub api_timeout_secs: u64,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            gate_secret: String::new(),
            model: None,
            provider_name: None,
            provider: None,
            temperature: None,
            max_tokens: None,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            system_prompt: None,
            delimiter: DEFAULT_DELIMITER.to_string(),
            api_timeout_secs: 120,
        }
    }
}

impl fmt::Debug for DigestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigestConfig")
            .field("gate_secret", &"<redacted>")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_input_chars", &self.max_input_chars)
            .field("custom_system_prompt", &self.system_prompt.is_some())
            .field("delimiter", &self.delimiter)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl DigestConfig {
    /// Create a new builder for `DigestConfig`.
    pub fn builder() -> DigestConfigBuilder {
        DigestConfigBuilder {
            config: Self::default(),
        }
    }

    /// The system instruction actually sent: the override, or the default
    /// prompt generated for the configured delimiter.
    pub fn effective_system_prompt(&self) -> String {
        match self.system_prompt {
            Some(ref p) => p.clone(),
            None => crate::prompts::system_prompt_for(&self.delimiter),
        }
    }
}

/// Builder for [`DigestConfig`].
pub struct DigestConfigBuilder {
    config: DigestConfig,
}

impl DigestConfigBuilder {
    pub fn gate_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.gate_secret = secret.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 1.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn max_input_chars(mut self, n: usize) -> Self {
        self.config.max_input_chars = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.config.delimiter = delimiter.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<DigestConfig, EssenceError> {
        let c = &self.config;
        if c.gate_secret.is_empty() {
            return Err(EssenceError::InvalidConfig(
                "gate secret must not be empty".into(),
            ));
        }
        if c.delimiter.is_empty() {
            return Err(EssenceError::InvalidConfig(
                "section delimiter must not be empty".into(),
            ));
        }
        if c.max_input_chars == 0 {
            return Err(EssenceError::InvalidConfig(
                "max input chars must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(EssenceError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
