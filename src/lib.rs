//! # paper2abstract
//!
//! Generate a formal abstract ("аннотация") for a scientific article with an
//! LLM served by an OpenRouter-compatible chat-completions endpoint.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / text / URL / stdin
//!  │
//!  ├─ 1. Input    read the file or download it, sniff PDF vs text
//!  ├─ 2. Extract  pdfium text layer, page by page (spawn_blocking)
//!  ├─ 3. Clean    drop page numbers and the bibliography, collapse blanks
//!  ├─ 4. Prompt   fill the fixed template with the cleaned text
//!  ├─ 5. Complete one chat-completion call, no retries
//!  └─ 6. Output   cleaned text + annotation (or a typed client error)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paper2abstract::{annotate, AnnotationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnnotationConfig::builder()
//!         .api_key_from_env() // OPENROUTER_API_KEY
//!         .build()?;
//!     let output = annotate("article.pdf", &config).await?;
//!     match output.error {
//!         None => println!("{}", output.annotation.unwrap_or_default()),
//!         Some(e) => eprintln!("completion failed: {e}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `paper2abstract` binary (clap + anyhow + tracing-subscriber) |
//! | `bundled` | off     | Embeds the pdfium shared library in the binary at compile time |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod annotate;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use annotate::{
    annotate, annotate_document, annotate_pdf_bytes, annotate_sync, annotate_text,
    annotate_to_file, clean_document, extract_cleaned,
};
pub use config::{AnnotationConfig, AnnotationConfigBuilder};
pub use error::{AnnotateError, ClientError};
pub use output::{AnnotationOutput, AnnotationStats, SourceKind};
pub use pipeline::clean::clean_text;
pub use pipeline::client::AnnotationClient;
pub use pipeline::input::{resolve_input, RawDocument};
pub use progress::{AnnotationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use prompts::{build_prompt, PROMPT_TEMPLATE};
