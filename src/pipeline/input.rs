//! Input resolution: turn a user-supplied path, URL, or `-` into a document.
//!
//! The article can arrive as a PDF on disk, a PDF behind a URL, a plain-text
//! file, or text piped on stdin. All of them are read fully into memory and
//! sniffed: bytes starting with the `%PDF` magic go to the extractor, valid
//! UTF-8 goes straight to the cleaner, anything else is rejected here so the
//! user gets a meaningful error rather than a pdfium failure.

use crate::error::AnnotateError;
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// The raw article, before any extraction or cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawDocument {
    /// PDF bytes; text is extracted by pdfium.
    Pdf(Vec<u8>),
    /// Plain UTF-8 text (pasted, piped, or read from a text file).
    Text(String),
}

impl RawDocument {
    /// Sniff `bytes` and wrap them as a PDF or text document.
    ///
    /// `origin` only feeds the error message.
    pub fn from_bytes(bytes: Vec<u8>, origin: &str) -> Result<Self, AnnotateError> {
        if bytes.starts_with(PDF_MAGIC) {
            return Ok(RawDocument::Pdf(bytes));
        }
        match String::from_utf8(bytes) {
            Ok(text) => Ok(RawDocument::Text(text)),
            Err(e) => {
                let bytes = e.into_bytes();
                Err(AnnotateError::NotText {
                    input: origin.to_string(),
                    magic: bytes.iter().take(4).copied().collect(),
                })
            }
        }
    }

    /// True if the document still needs pdfium.
    pub fn is_pdf(&self) -> bool {
        matches!(self, RawDocument::Pdf(_))
    }

    /// Short name used in messages ("PDF" or "text").
    pub fn kind(&self) -> &'static str {
        match self {
            RawDocument::Pdf(_) => "PDF",
            RawDocument::Text(_) => "text",
        }
    }

    /// Size of the raw payload in bytes.
    pub fn len(&self) -> usize {
        match self {
            RawDocument::Pdf(b) => b.len(),
            RawDocument::Text(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an in-memory document.
///
/// * `http://…` / `https://…` — downloaded with `timeout_secs`
/// * `-` — read from stdin
/// * anything else — a local file path
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<RawDocument, AnnotateError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AnnotateError::NoInput);
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else if input == "-" {
        read_stdin().await
    } else {
        read_local(input).await
    }
}

/// Read a local file, mapping I/O failures to input errors.
async fn read_local(path_str: &str) -> Result<RawDocument, AnnotateError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AnnotateError::FileNotFound { path });
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(AnnotateError::PermissionDenied { path });
        }
        Err(e) => {
            return Err(AnnotateError::ReadFailed {
                input: path_str.to_string(),
                source: e,
            });
        }
    };

    let doc = RawDocument::from_bytes(bytes, path_str)?;
    debug!("Read {} bytes of {} from {}", doc.len(), doc.kind(), path.display());
    Ok(doc)
}

/// Read all of stdin. Blocking, so it runs on the blocking pool.
async fn read_stdin() -> Result<RawDocument, AnnotateError> {
    let bytes = tokio::task::spawn_blocking(|| {
        let mut buf = Vec::new();
        std::io::stdin().lock().read_to_end(&mut buf).map(|_| buf)
    })
    .await
    .map_err(|e| AnnotateError::Internal(format!("stdin task panicked: {}", e)))?
    .map_err(|e| AnnotateError::ReadFailed {
        input: "<stdin>".to_string(),
        source: e,
    })?;

    debug!("Read {} bytes from stdin", bytes.len());
    RawDocument::from_bytes(bytes, "<stdin>")
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<RawDocument, AnnotateError> {
    info!("Downloading article from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AnnotateError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            AnnotateError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            AnnotateError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(AnnotateError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            AnnotateError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            AnnotateError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    info!("Downloaded {} bytes", bytes.len());
    RawDocument::from_bytes(bytes.to_vec(), url)
}
