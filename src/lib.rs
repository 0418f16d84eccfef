//! # essence-map
//!
//! Boil a document down to three blunt essence points and a Mermaid mind
//! map with one LLM call.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF upload / pasted text
//!  │
//!  ├─ 1. Extract  page text via pdfium (spawn_blocking), concatenated in order
//!  ├─ 2. Gate     shared access code; nothing is spent on a mismatch
//!  ├─ 3. LLM      one completion call, input cut to 12 000 characters
//!  ├─ 4. Split    reply cut at the first ```mermaid fence
//!  └─ 5. Output   summary (Markdown) + diagram source, or "no diagram"
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use essence_map::{DigestConfig, DigestPipeline, Submission};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = DigestConfig::builder().gate_secret("let-me-in").build()?;
//!     let pipeline = DigestPipeline::from_config(config)?;
//!
//!     let submission = Submission::new("let-me-in")
//!         .with_text("Monads are monoids in the category of endofunctors.");
//!     let output = pipeline.digest(submission).await?;
//!
//!     println!("{}", output.summary);
//!     if let Some(diagram) = output.diagram.source() {
//!         println!("{diagram}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | The `essence-map` binary (clap + anyhow + tracing-subscriber) |
//! | `server` | on      | The single-page web tool ([`web`], axum) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod digest;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
#[cfg(feature = "server")]
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{DigestConfig, DigestConfigBuilder};
pub use digest::DigestPipeline;
pub use error::EssenceError;
pub use output::{DiagramSegment, DigestOutput, DigestStats, SplitReply};
pub use pipeline::extract::extract_text;
pub use pipeline::gate::authorize;
pub use pipeline::input::{DocumentInput, Submission};
pub use pipeline::llm::{Completion, CompletionClient, CompletionRequest, LlmClient};
pub use pipeline::llm::summarize_and_map;
pub use pipeline::split::split_reply;
