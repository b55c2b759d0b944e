//! Annotation entry points.
//!
//! Every entry point funnels into [`annotate_document`], which runs the
//! pipeline on an in-memory [`RawDocument`]:
//!
//! 1. extract the text layer (PDF only)
//! 2. clean it, and stop with [`AnnotateError::EmptyText`] if nothing is left
//! 3. fill the prompt template
//! 4. make one completion call
//!
//! A failed completion does not fail the run: the cleaned text is still
//! returned and the [`ClientError`](crate::error::ClientError) is stored in
//! [`AnnotationOutput::error`].

use crate::config::AnnotationConfig;
use crate::error::AnnotateError;
use crate::output::{AnnotationOutput, AnnotationStats, SourceKind};
use crate::pipeline::client::AnnotationClient;
use crate::pipeline::input::{self, RawDocument};
use crate::pipeline::{clean, extract};
use crate::progress::Stage;
use crate::prompts;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Annotate a PDF or text file, a URL, or stdin (`-`).
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(AnnotationOutput)` once the article has been read and cleaned, even
/// if the completion call failed (check `output.error`).
///
/// # Errors
/// Returns `Err(AnnotateError)` only for fatal errors:
/// - File not found / download failed / not a PDF or text
/// - PDF cannot be read
/// - No text left after cleaning
/// - No API key configured
pub async fn annotate(
    input_str: impl AsRef<str>,
    config: &AnnotationConfig,
) -> Result<AnnotationOutput, AnnotateError> {
    let input_str = input_str.as_ref();
    info!("Starting annotation: {}", input_str);

    let doc = staged(config, Stage::Resolve, async {
        input::resolve_input(input_str, config.download_timeout_secs).await
    })
    .await?;
    notify_complete(config, Stage::Resolve, doc.len());

    annotate_document(doc, config).await
}

/// Annotate pasted article text.
///
/// # Errors
/// [`AnnotateError::NoInput`] if `text` is blank.
pub async fn annotate_text(
    text: impl Into<String>,
    config: &AnnotationConfig,
) -> Result<AnnotationOutput, AnnotateError> {
    annotate_document(RawDocument::Text(text.into()), config).await
}

/// Annotate PDF bytes held in memory.
pub async fn annotate_pdf_bytes(
    bytes: impl Into<Vec<u8>>,
    config: &AnnotationConfig,
) -> Result<AnnotationOutput, AnnotateError> {
    annotate_document(RawDocument::Pdf(bytes.into()), config).await
}

/// Run the pipeline on an already-resolved document.
pub async fn annotate_document(
    doc: RawDocument,
    config: &AnnotationConfig,
) -> Result<AnnotationOutput, AnnotateError> {
    let total_start = Instant::now();

    // A blank paste is missing input, whether or not a key is configured.
    reject_blank(&doc, config)?;
    // Fail before touching pdfium if the run cannot finish anyway.
    let client = AnnotationClient::new(config)?;

    // ── Step 1-2: Extract and clean ──────────────────────────────────────
    let prepared = prepare(doc, config).await?;

    // ── Step 3: Build prompt ─────────────────────────────────────────────
    let prompt = match config.prompt_template {
        Some(ref template) => prompts::build_prompt_with(template, &prepared.cleaned_text),
        None => prompts::build_prompt(&prepared.cleaned_text),
    };
    debug!("Prompt: {} chars", prompt.chars().count());

    // ── Step 4: Completion ───────────────────────────────────────────────
    notify_start(config, Stage::Annotate);
    let completion_start = Instant::now();
    let result = client.generate_annotation(&prompt).await;
    let completion_duration_ms = completion_start.elapsed().as_millis() as u64;

    let (annotation, error) = match result {
        Ok(text) => {
            notify_complete(config, Stage::Annotate, text.chars().count());
            info!(
                "Annotation complete: {} chars in {}ms",
                text.chars().count(),
                completion_duration_ms
            );
            (Some(text), None)
        }
        Err(e) => {
            notify_error(config, Stage::Annotate, &e.to_string());
            warn!("Annotation failed: {}", e);
            (None, Some(e))
        }
    };

    let stats = AnnotationStats {
        page_count: prepared.page_count,
        raw_chars: prepared.raw_chars,
        cleaned_chars: prepared.cleaned_text.chars().count(),
        prompt_chars: prompt.chars().count(),
        extract_duration_ms: prepared.extract_duration_ms,
        completion_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    Ok(AnnotationOutput {
        source: prepared.source,
        cleaned_text: prepared.cleaned_text,
        annotation,
        error,
        stats,
    })
}

/// Read, extract and clean an article without calling the completion API.
///
/// Does not require an API key.
pub async fn extract_cleaned(
    input_str: impl AsRef<str>,
    config: &AnnotationConfig,
) -> Result<String, AnnotateError> {
    let doc = staged(config, Stage::Resolve, async {
        input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await
    })
    .await?;
    notify_complete(config, Stage::Resolve, doc.len());

    clean_document(doc, config).await
}

/// Extract and clean an already-resolved document.
///
/// Does not require an API key.
pub async fn clean_document(
    doc: RawDocument,
    config: &AnnotationConfig,
) -> Result<String, AnnotateError> {
    Ok(prepare(doc, config).await?.cleaned_text)
}

/// Annotate and write the annotation text to a file.
///
/// A completion failure is fatal here, since there is nothing to write.
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn annotate_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &AnnotationConfig,
) -> Result<AnnotationStats, AnnotateError> {
    let output = annotate(input_str, config).await?;
    let stats = output.stats.clone();
    let annotation = output.into_result()?;
    write_atomic(output_path.as_ref(), &annotation).await?;
    Ok(stats)
}

/// Synchronous wrapper around [`annotate`].
///
/// Creates a temporary tokio runtime internally.
pub fn annotate_sync(
    input_str: impl AsRef<str>,
    config: &AnnotationConfig,
) -> Result<AnnotationOutput, AnnotateError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AnnotateError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(annotate(input_str, config))
}

/// Write `contents` to `path` via a sibling temp file and a rename.
pub async fn write_atomic(path: &Path, contents: &str) -> Result<(), AnnotateError> {
    let write_err = |source| AnnotateError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    let mut body = contents.to_string();
    if !body.ends_with('\n') {
        body.push('\n');
    }

    tokio::fs::write(&tmp_path, body).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Cleaned article plus what the stats need to know about how it was made.
struct Prepared {
    source: SourceKind,
    cleaned_text: String,
    page_count: Option<usize>,
    raw_chars: usize,
    extract_duration_ms: u64,
}

/// Reject pasted text that is empty or whitespace only.
fn reject_blank(doc: &RawDocument, config: &AnnotationConfig) -> Result<(), AnnotateError> {
    match doc {
        RawDocument::Text(text) if text.trim().is_empty() => {
            notify_error(config, Stage::Resolve, "no input provided");
            Err(AnnotateError::NoInput)
        }
        _ => Ok(()),
    }
}

/// Extract (PDF only) and clean; reject documents that end up empty.
async fn prepare(doc: RawDocument, config: &AnnotationConfig) -> Result<Prepared, AnnotateError> {
    reject_blank(&doc, config)?;
    let extract_start = Instant::now();
    let (source, raw, page_count) = match doc {
        RawDocument::Pdf(bytes) => {
            let extracted = staged(config, Stage::Extract, async {
                extract::extract_text(bytes, config.password.as_deref()).await
            })
            .await?;
            notify_complete(config, Stage::Extract, extracted.text.chars().count());
            (SourceKind::Pdf, extracted.text, Some(extracted.page_count))
        }
        RawDocument::Text(text) => (SourceKind::Text, text, None),
    };
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    let raw_chars = raw.chars().count();

    notify_start(config, Stage::Clean);
    let cleaned_text = clean::clean_text(&raw);
    let cleaned_chars = cleaned_text.chars().count();
    info!(
        "Cleaned {} text: {} → {} chars",
        source.as_str(),
        raw_chars,
        cleaned_chars
    );

    if cleaned_text.is_empty() {
        let err = AnnotateError::EmptyText {
            source_kind: source.as_str().to_string(),
        };
        notify_error(config, Stage::Clean, &err.to_string());
        return Err(err);
    }
    notify_complete(config, Stage::Clean, cleaned_chars);

    Ok(Prepared {
        source,
        cleaned_text,
        page_count,
        raw_chars,
        extract_duration_ms,
    })
}

/// Run `fut` as `stage`, reporting start and failure to the callback.
async fn staged<T, F>(config: &AnnotationConfig, stage: Stage, fut: F) -> Result<T, AnnotateError>
where
    F: std::future::Future<Output = Result<T, AnnotateError>>,
{
    notify_start(config, stage);
    fut.await.inspect_err(|e| notify_error(config, stage, &e.to_string()))
}

fn notify_start(config: &AnnotationConfig, stage: Stage) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

fn notify_complete(config: &AnnotationConfig, stage: Stage, chars: usize) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage, chars);
    }
}

fn notify_error(config: &AnnotationConfig, stage: Stage, error: &str) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_error(stage, error);
    }
}
