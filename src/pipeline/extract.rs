//! Text extraction: turn a submission's input into one text blob.
//!
//! PDFs are decoded page by page through pdfium and the page texts are
//! concatenated in document order with no separator. A page without a text
//! layer (scans, pure figures) contributes nothing rather than failing the
//! whole document; only a file pdfium cannot open at all is an error.
//!
//! pdfium is a blocking C++ library, so decoding runs under
//! `tokio::task::spawn_blocking` to keep the async workers free.

use crate::error::EssenceError;
use crate::pipeline::input::DocumentInput;
use pdfium_render::prelude::*;
use tracing::{debug, info, warn};

/// Normalise `input` to the text that will be summarised.
///
/// # Errors
/// * [`EssenceError::DocumentParse`]: the bytes are not a PDF pdfium can open
/// * [`EssenceError::EmptyInput`]: nothing but whitespace after extraction
pub async fn extract_text(input: DocumentInput) -> Result<String, EssenceError> {
    let text = match input {
        DocumentInput::Pdf(bytes) => {
            tokio::task::spawn_blocking(move || extract_pdf_text_blocking(&bytes))
                .await
                .map_err(|e| EssenceError::Internal(format!("Extraction task panicked: {}", e)))??
        }
        DocumentInput::Text(text) => text,
    };

    if text.trim().is_empty() {
        return Err(EssenceError::EmptyInput);
    }

    debug!("Extracted {} characters", text.chars().count());
    Ok(text)
}

/// Concatenate per-page texts in order, with no separator.
///
/// `None` marks a page whose text layer could not be read; it contributes
/// an empty string.
pub fn concat_page_texts<I>(pages: I) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    pages.into_iter().map(Option::unwrap_or_default).collect()
}

/// Reject anything that does not start with the `%PDF` magic bytes.
pub fn check_pdf_magic(bytes: &[u8]) -> Result<(), EssenceError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        let shown = &bytes[..bytes.len().min(4)];
        return Err(EssenceError::DocumentParse {
            detail: format!("not a PDF (first bytes: {:?})", shown),
        });
    }
    Ok(())
}

/// Blocking implementation of PDF text extraction.
fn extract_pdf_text_blocking(bytes: &[u8]) -> Result<String, EssenceError> {
    check_pdf_magic(bytes)?;

    let pdfium = pdfium_auto::bind_pdfium_silent()
        .map_err(|e| EssenceError::PdfiumBindingFailed(e.to_string()))?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| EssenceError::DocumentParse {
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let texts = pages.iter().enumerate().map(|(idx, page)| match page.text() {
        Ok(text) => {
            let s = text.all();
            if s.trim().is_empty() {
                debug!("Page {} has no extractable text", idx + 1);
            }
            Some(s)
        }
        Err(e) => {
            warn!("Page {}: text layer unreadable ({:?}); skipping", idx + 1, e);
            None
        }
    });

    Ok(concat_page_texts(texts))
}
