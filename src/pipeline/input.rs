//! Input handling: what a user submits and how CLI arguments become input.
//!
//! A [`Submission`] carries an optional uploaded document, optional pasted
//! text and the gate code. When both a document and text are present the
//! document wins.
//!
//! For the CLI, [`resolve_input`] turns a path, an HTTP(S) URL or `-`
//! (stdin) into a [`DocumentInput`]. URLs are downloaded into memory; the
//! pipeline never touches the file system for uploads.

use crate::error::EssenceError;
use std::fmt;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// The normalised input for one submission.
#[derive(Clone, PartialEq, Eq)]
pub enum DocumentInput {
    /// Raw bytes of an uploaded PDF.
    Pdf(Vec<u8>),
    /// Pasted text, used as-is.
    Text(String),
}

impl fmt::Debug for DocumentInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentInput::Pdf(b) => write!(f, "Pdf({} bytes)", b.len()),
            DocumentInput::Text(t) => write!(f, "Text({} chars)", t.chars().count()),
        }
    }
}

/// One user submission.
#[derive(Clone, Default)]
pub struct Submission {
    /// Uploaded document bytes. An empty upload counts as absent.
    pub document: Option<Vec<u8>>,
    /// Pasted text.
    pub text: Option<String>,
    /// Gate code typed by the user.
    pub code: String,
}

impl fmt::Debug for Submission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submission")
            .field("document_bytes", &self.document.as_ref().map(Vec::len))
            .field("text_chars", &self.text.as_ref().map(|t| t.chars().count()))
            .field("code", &"<redacted>")
            .finish()
    }
}

impl Submission {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn with_document(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.document = Some(bytes.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_input(self, input: DocumentInput) -> Self {
        match input {
            DocumentInput::Pdf(bytes) => self.with_document(bytes),
            DocumentInput::Text(text) => self.with_text(text),
        }
    }

    /// Split into the input to extract and the gate code, applying the
    /// document-over-text precedence.
    pub fn into_parts(self) -> (DocumentInput, String) {
        let input = match (self.document, self.text) {
            (Some(bytes), _) if !bytes.is_empty() => DocumentInput::Pdf(bytes),
            (_, Some(text)) => DocumentInput::Text(text),
            _ => DocumentInput::Text(String::new()),
        };
        (input, self.code)
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a CLI argument to document input.
///
/// * `-` reads text from stdin
/// * `http://` / `https://` downloads the document into memory
/// * anything else is a local file: PDFs (by magic bytes or `.pdf`
///   extension) become [`DocumentInput::Pdf`], everything else is read as
///   UTF-8 text
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<DocumentInput, EssenceError> {
    if input == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .map_err(|e| EssenceError::Internal(format!("Failed to read stdin: {}", e)))?;
        debug!("Read {} bytes from stdin", text.len());
        return Ok(DocumentInput::Text(text));
    }

    if is_url(input) {
        let bytes = download_url(input, timeout_secs).await?;
        return Ok(DocumentInput::Pdf(bytes));
    }

    resolve_local(input).await
}

/// Read a local file, classifying it as PDF or text.
async fn resolve_local(path_str: &str) -> Result<DocumentInput, EssenceError> {
    let path = PathBuf::from(path_str);

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => EssenceError::NotFound { path: path.clone() },
        _ => EssenceError::Internal(format!("Failed to read '{}': {}", path.display(), e)),
    })?;

    let has_pdf_ext = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    debug!("Resolved local input: {} ({} bytes)", path.display(), bytes.len());

    if has_pdf_ext || bytes.starts_with(b"%PDF") {
        Ok(DocumentInput::Pdf(bytes))
    } else {
        Ok(DocumentInput::Text(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, EssenceError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| EssenceError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            EssenceError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            EssenceError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(EssenceError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| EssenceError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}
