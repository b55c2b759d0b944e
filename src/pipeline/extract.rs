//! PDF text extraction via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which is not safe
//! to call from async contexts. `tokio::task::spawn_blocking` moves the work
//! onto the blocking pool so Tokio worker threads never stall on a large
//! document.
//!
//! Only the embedded text layer is read. Scanned PDFs without one come back
//! empty and are reported by the orchestrator as
//! [`AnnotateError::EmptyText`].

use crate::error::AnnotateError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Concatenated text of every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Page texts joined in page order, each page ending with a newline.
    pub text: String,
    /// Number of pages in the document.
    pub page_count: usize,
}

/// Extract the text of every page of an in-memory PDF.
pub async fn extract_text(
    bytes: Vec<u8>,
    password: Option<&str>,
) -> Result<ExtractedText, AnnotateError> {
    let password = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_text_blocking(&bytes, password.as_deref()))
        .await
        .map_err(|e| AnnotateError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Blocking implementation of text extraction.
fn extract_text_blocking(
    bytes: &[u8],
    password: Option<&str>,
) -> Result<ExtractedText, AnnotateError> {
    let pdfium = pdfium_auto::bind_pdfium_silent()
        .map_err(|e| AnnotateError::PdfiumBindingFailed(e.to_string()))?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| classify_load_error(&format!("{:?}", e), password.is_some()))?;

    let pages = document.pages();
    let page_count = pages.len() as usize;
    info!("PDF loaded: {} pages", page_count);

    let mut texts = Vec::with_capacity(page_count);
    for (idx, page) in pages.iter().enumerate() {
        let page_text = page
            .text()
            .map_err(|e| AnnotateError::TextExtractionFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?
            .all();
        debug!("Page {}: {} chars", idx + 1, page_text.chars().count());
        texts.push(page_text);
    }

    Ok(ExtractedText {
        text: join_pages(&texts),
        page_count,
    })
}

/// Join page texts, terminating every page with a newline.
///
/// A running page number printed at the end of one page and the first line
/// of the next must stay on separate lines, or the cleaner cannot see the
/// number as a line of its own.
fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let mut out = String::with_capacity(pages.iter().map(|p| p.as_ref().len() + 1).sum());
    for page in pages {
        let page = page.as_ref();
        out.push_str(page);
        if !page.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Map a pdfium load failure to the matching fatal error.
fn classify_load_error(detail: &str, password_given: bool) -> AnnotateError {
    if detail.contains("Password") || detail.contains("password") {
        if password_given {
            AnnotateError::WrongPassword
        } else {
            AnnotateError::PasswordRequired
        }
    } else {
        AnnotateError::CorruptPdf {
            detail: detail.to_string(),
        }
    }
}
