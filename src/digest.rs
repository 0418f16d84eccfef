//! The pipeline controller: one submission in, one digest out.
//!
//! [`DigestPipeline::digest`] runs the four steps in a fixed order:
//!
//! 1. extract text (PDF pages or pasted text)
//! 2. check the gate code
//! 3. make the single remote completion call
//! 4. split the reply into summary and diagram
//!
//! Every failure before step 3 returns without contacting the remote
//! service. Nothing is retried and nothing outlives the call: the extracted
//! text and the reply are dropped once [`DigestOutput`] is built.

use crate::config::{DigestConfig, DEFAULT_MODEL};
use crate::error::EssenceError;
use crate::output::{DigestOutput, DigestStats};
use crate::pipeline::input::Submission;
use crate::pipeline::llm::{CompletionClient, LlmClient};
use crate::pipeline::{extract, gate, llm, split};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Runs submissions against one configuration and one completion client.
///
/// Cheap to share: wrap it in an `Arc` and call [`digest`](Self::digest)
/// from as many tasks as needed. It holds no per-request state.
pub struct DigestPipeline {
    config: DigestConfig,
    client: Arc<dyn CompletionClient>,
}

impl DigestPipeline {
    /// Build a pipeline around an explicit client.
    pub fn new(config: DigestConfig, client: Arc<dyn CompletionClient>) -> Self {
        Self { config, client }
    }

    /// Build a pipeline whose client is the provider named by `config`
    /// (or detected from the environment).
    pub fn from_config(config: DigestConfig) -> Result<Self, EssenceError> {
        let provider = resolve_provider(&config)?;
        Ok(Self::new(config, Arc::new(LlmClient::new(provider))))
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    /// Process one submission end to end.
    ///
    /// # Errors
    /// * [`EssenceError::EmptyInput`] / [`EssenceError::DocumentParse`]: bad input
    /// * [`EssenceError::MissingCode`] / [`EssenceError::Unauthorized`]: gate
    /// * [`EssenceError::RemoteCall`] / [`EssenceError::RemoteTimeout`]: remote
    ///
    /// A reply without a diagram is still `Ok`; check
    /// [`DigestOutput::diagram`].
    pub async fn digest(&self, submission: Submission) -> Result<DigestOutput, EssenceError> {
        let total_start = Instant::now();
        let (input, code) = submission.into_parts();
        info!("Starting digest: {:?}", input);

        // ── Step 1: Extract text ─────────────────────────────────────────────
        let text = extract::extract_text(input).await?;
        let input_chars = text.chars().count();

        // ── Step 2: Gate ─────────────────────────────────────────────────────
        gate::check(&code, &self.config.gate_secret)?;

        // ── Step 3: Remote call ──────────────────────────────────────────────
        let llm_start = Instant::now();
        let completion = llm::summarize_and_map(self.client.as_ref(), &text, &self.config).await?;
        let llm_duration_ms = llm_start.elapsed().as_millis() as u64;
        drop(text);

        // ── Step 4: Split ────────────────────────────────────────────────────
        let split = split::split_reply(&completion.content, &self.config.delimiter);

        let transmitted_chars = input_chars.min(self.config.max_input_chars);
        let stats = DigestStats {
            input_chars,
            transmitted_chars,
            truncated: transmitted_chars < input_chars,
            model: self.config.model.clone(),
            prompt_tokens: completion.prompt_tokens,
            completion_tokens: completion.completion_tokens,
            llm_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        info!(
            "Digest complete: diagram={}, {}ms total",
            split.diagram.is_produced(),
            stats.total_duration_ms
        );

        Ok(DigestOutput {
            summary: split.summary,
            diagram: split.diagram,
            stats,
        })
    }

    /// Synchronous wrapper around [`digest`](Self::digest).
    ///
    /// Creates a temporary tokio runtime internally; do not call from inside
    /// an async context.
    pub fn digest_sync(&self, submission: Submission) -> Result<DigestOutput, EssenceError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| EssenceError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.digest(submission))
    }
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, EssenceError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        EssenceError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`); the factory reads
///    the matching API key from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI key present** (`OPENAI_API_KEY`), with the configured or
///    default model.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &DigestConfig) -> Result<Arc<dyn LLMProvider>, EssenceError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| EssenceError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
