//! Error types for the paper2abstract library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`AnnotateError`] — **Fatal**: the pipeline cannot produce a prompt at
//!   all (bad input file, wrong password, no text left after cleaning, no API
//!   key). Returned as `Err(AnnotateError)` from the top-level `annotate*`
//!   functions.
//!
//! * [`ClientError`] — **Non-fatal**: the article was read and cleaned, but
//!   the completion endpoint did not hand back an annotation. Stored inside
//!   [`crate::output::AnnotationOutput`] next to the cleaned text so callers
//!   still get everything the pipeline produced.
//!
//! A `ClientError` only becomes fatal when the caller asks for it, via
//! [`crate::output::AnnotationOutput::into_result`] or
//! [`crate::annotate::annotate_to_file`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the paper2abstract library.
#[derive(Debug, Error)]
pub enum AnnotateError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Reading the input (file or stdin) failed for another reason.
    #[error("Failed to read input '{input}': {source}")]
    ReadFailed {
        input: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The input is neither a PDF nor UTF-8 text.
    #[error("Input '{input}' is neither a PDF nor UTF-8 text\nFirst bytes: {magic:?}")]
    NotText { input: String, magic: Vec<u8> },

    /// No article text was supplied at all.
    #[error("No input provided: pass a PDF, a text file, a URL, or --text.")]
    NoInput,

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF")]
    WrongPassword,

    /// pdfium could not read the text layer of a page.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    /// Nothing was left after extraction and cleaning.
    #[error(
        "No text could be extracted from the {source_kind}.\n\
Scanned PDFs without a text layer are not supported; check the file."
    )]
    EmptyText { source_kind: String },

    // ── Completion errors ─────────────────────────────────────────────────
    /// The API key is not configured.
    #[error("OpenRouter API key is not configured.\nSet OPENROUTER_API_KEY or pass --api-key.")]
    MissingApiKey,

    /// The completion endpoint did not return an annotation.
    #[error("Annotation failed: {0}")]
    Annotation(#[from] ClientError),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure of the completion call.
///
/// Each variant keeps the information the caller needs to branch on the
/// failure kind instead of inspecting message text.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientError {
    /// The endpoint answered with a status other than 200.
    #[error("completion API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a readable answer (DNS, TLS, refused
    /// connection, timeout, truncated body).
    #[error("completion request failed: {message}")]
    Transport { message: String },

    /// HTTP 200, but the body has no `choices[0].message.content`.
    #[error("cannot obtain response from the completion API: {detail}")]
    MalformedResponse { detail: String },
}

impl ClientError {
    /// HTTP status code, when the endpoint answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::MalformedResponse { .. } => Some(200),
            ClientError::Transport { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display_embeds_status_and_body() {
        let e = ClientError::Http {
            status: 500,
            body: "server error".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("500"), "got: {msg}");
        assert!(msg.contains("server error"), "got: {msg}");
    }

    #[test]
    fn transport_error_display_embeds_message() {
        let e = ClientError::Transport {
            message: "connection refused".into(),
        };
        assert!(e.to_string().contains("connection refused"));
        assert_eq!(e.status(), None);
    }

    #[test]
    fn malformed_response_is_not_plain_text() {
        let e = ClientError::MalformedResponse {
            detail: "missing field `choices`".into(),
        };
        assert!(e.to_string().contains("cannot obtain response"));
        assert_eq!(e.status(), Some(200));
    }

    #[test]
    fn client_error_serialises_with_kind_tag() {
        let e = ClientError::Http {
            status: 429,
            body: "rate limited".into(),
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"], "http");
        assert_eq!(json["status"], 429);
    }

    #[test]
    fn annotation_wraps_client_error() {
        let e: AnnotateError = ClientError::Transport {
            message: "dns failure".into(),
        }
        .into();
        assert!(e.to_string().contains("dns failure"));
    }

    #[test]
    fn empty_text_display() {
        let e = AnnotateError::EmptyText {
            source_kind: "PDF".into(),
        };
        assert!(e.to_string().contains("PDF"));
    }
}
