//! Error types for the essence-map library.
//!
//! Every failure is terminal for the submission it belongs to: nothing in the
//! pipeline retries. The variants are grouped by the stage that raises them so
//! the display layer can tell "ask the user again" apart from "the remote
//! service let us down".
//!
//! A reply without a diagram is **not** an error; it surfaces as
//! [`crate::output::DiagramSegment::NotProduced`].

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the essence-map library.
#[derive(Debug, Error)]
pub enum EssenceError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Nothing left to send once the input was normalised.
    #[error("Input is empty: upload a PDF or paste some text first")]
    EmptyInput,

    /// The uploaded bytes are not a document pdfium can open.
    #[error("Could not parse the uploaded document: {detail}")]
    DocumentParse { detail: String },

    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'")]
    NotFound { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Gate errors ───────────────────────────────────────────────────────
    /// No gate code was supplied at all.
    #[error("An access code is required; ask the maintainer for one")]
    MissingCode,

    /// The supplied gate code does not match the configured secret.
    #[error("Invalid access code")]
    Unauthorized,

    // ── Remote errors ─────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The completion call failed (transport, auth, rate limit, bad response).
    #[error("Remote call failed: {message}")]
    RemoteCall { message: String },

    /// The completion call did not answer within the configured timeout.
    #[error("Remote call timed out after {secs}s")]
    RemoteTimeout { secs: u64 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EssenceError {
    /// Stable snake_case tag for the error, suitable for logs and JSON.
    pub fn kind(&self) -> &'static str {
        match self {
            EssenceError::EmptyInput => "empty_input",
            EssenceError::DocumentParse { .. } => "document_parse",
            EssenceError::NotFound { .. } => "not_found",
            EssenceError::DownloadFailed { .. } => "download_failed",
            EssenceError::DownloadTimeout { .. } => "download_timeout",
            EssenceError::MissingCode => "missing_code",
            EssenceError::Unauthorized => "unauthorized",
            EssenceError::ProviderNotConfigured { .. } => "provider_not_configured",
            EssenceError::RemoteCall { .. } => "remote_call",
            EssenceError::RemoteTimeout { .. } => "remote_timeout",
            EssenceError::InvalidConfig(_) => "invalid_config",
            EssenceError::PdfiumBindingFailed(_) => "pdfium_binding_failed",
            EssenceError::Internal(_) => "internal",
        }
    }

    /// True when the user can fix the problem by resubmitting different input.
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            EssenceError::EmptyInput
                | EssenceError::DocumentParse { .. }
                | EssenceError::NotFound { .. }
                | EssenceError::MissingCode
                | EssenceError::Unauthorized
        )
    }

    /// True when the failure came from the remote completion service.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            EssenceError::RemoteCall { .. } | EssenceError::RemoteTimeout { .. }
        )
    }
}
