//! Output types returned by the annotation pipeline.

use crate::error::{AnnotateError, ClientError};
use serde::{Deserialize, Serialize};

/// Where the article text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Text layer extracted from a PDF.
    Pdf,
    /// Plain text supplied directly.
    Text,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Pdf => "PDF",
            SourceKind::Text => "text",
        }
    }
}

/// Result of one annotation run.
///
/// The cleaned text is always present. Exactly one of `annotation` and
/// `error` is `Some`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationOutput {
    pub source: SourceKind,
    /// Article text after the cleaning pass.
    pub cleaned_text: String,
    /// Generated annotation, when the completion call succeeded.
    pub annotation: Option<String>,
    /// Why the completion call failed, when it did.
    pub error: Option<ClientError>,
    pub stats: AnnotationStats,
}

impl AnnotationOutput {
    /// True if an annotation was produced.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.annotation.is_some()
    }

    /// What to show the user: the annotation, or the error message in its
    /// place.
    pub fn display_text(&self) -> String {
        match (&self.annotation, &self.error) {
            (_, Some(e)) => e.to_string(),
            (Some(a), None) => a.clone(),
            (None, None) => String::new(),
        }
    }

    /// Treat a completion failure as fatal.
    ///
    /// Returns the annotation text, or [`AnnotateError::Annotation`].
    pub fn into_result(self) -> Result<String, AnnotateError> {
        match (self.annotation, self.error) {
            (_, Some(e)) => Err(AnnotateError::Annotation(e)),
            (Some(a), None) => Ok(a),
            (None, None) => Err(AnnotateError::Internal(
                "annotation output has neither text nor error".into(),
            )),
        }
    }
}

/// Size and timing figures for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationStats {
    /// Page count, for PDF input.
    pub page_count: Option<usize>,
    /// Characters before cleaning.
    pub raw_chars: usize,
    /// Characters after cleaning.
    pub cleaned_chars: usize,
    /// Characters in the filled prompt.
    pub prompt_chars: usize,
    /// Wall-clock time spent in pdfium.
    pub extract_duration_ms: u64,
    /// Wall-clock time spent waiting for the completion endpoint.
    pub completion_duration_ms: u64,
    /// End-to-end wall-clock time.
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(annotation: Option<&str>, error: Option<ClientError>) -> AnnotationOutput {
        AnnotationOutput {
            source: SourceKind::Text,
            cleaned_text: "text".into(),
            annotation: annotation.map(str::to_string),
            error,
            stats: AnnotationStats::default(),
        }
    }

    #[test]
    fn display_text_prefers_error() {
        let out = output(
            None,
            Some(ClientError::Http {
                status: 502,
                body: "bad gateway".into(),
            }),
        );
        assert!(!out.is_success());
        assert!(out.display_text().contains("502"));
        assert!(out.display_text().contains("bad gateway"));
    }

    #[test]
    fn into_result_success() {
        let out = output(Some("В статье рассматривается…"), None);
        assert!(out.is_success());
        assert_eq!(out.into_result().unwrap(), "В статье рассматривается…");
    }

    #[test]
    fn into_result_error() {
        let out = output(
            None,
            Some(ClientError::Transport {
                message: "reset".into(),
            }),
        );
        assert!(matches!(
            out.into_result(),
            Err(AnnotateError::Annotation(ClientError::Transport { .. }))
        ));
    }

    #[test]
    fn serialises_to_json() {
        let out = output(Some("abstract"), None);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["source"], "text");
        assert_eq!(json["annotation"], "abstract");
        assert!(json["error"].is_null());
    }
}
