//! CLI binary for paper2abstract.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnnotationConfig`, drives the pipeline and prints the results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use paper2abstract::annotate::write_atomic;
use paper2abstract::{
    annotate_document, clean_document, resolve_input, AnnotationConfig,
    AnnotationProgressCallback, ProgressCallback, RawDocument, Stage,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner showing the current stage, with a
/// log line printed above it as each stage finishes.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl AnnotationProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_prefix("Working");
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: Stage, chars: usize) {
        let unit = if stage == Stage::Resolve { "bytes" } else { "chars" };
        self.bar.println(format!(
            "  {} {:<22} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{chars} {unit}")),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        // Keep the log line on one row; the full message is printed later.
        let first_line = error.lines().next().unwrap_or_default();
        let msg = if first_line.chars().count() > 80 {
            let cut: String = first_line.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            first_line.to_string()
        };
        self.bar.println(format!(
            "  {} {:<22} {}",
            red("✗"),
            stage.to_string(),
            red(&msg)
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Annotate a PDF (API key from OPENROUTER_API_KEY or .env)
  paper2abstract article.pdf

  # Annotate pasted text
  paper2abstract --text "$(cat article.txt)"

  # Read the article from stdin, write the annotation to a file
  cat article.txt | paper2abstract - -o abstract.txt

  # Download a PDF and show the cleaned text before the annotation
  paper2abstract --show-cleaned https://example.org/paper.pdf

  # Only extract and clean (no API key needed)
  paper2abstract --clean-only article.pdf

  # JSON output with stats
  paper2abstract --json article.pdf > result.json

CLEANING:
  Before prompting, lines holding only a page number are removed, everything
  from the first "Список литературы" / "Литература" / "References" heading on
  is dropped, and runs of blank lines are collapsed.

ENVIRONMENT VARIABLES:
  OPENROUTER_API_KEY       API key for the completion endpoint (required)
  PAPER2ABSTRACT_MODEL     Override model ID
  PAPER2ABSTRACT_ENDPOINT  Override the chat-completions URL
  PDFIUM_LIB_PATH          Path to an existing libpdfium — skips auto-download
  PDFIUM_AUTO_CACHE_DIR    Override the default pdfium cache directory

  Variables may also be set in a .env file in the working directory.
"#;

/// Generate a formal abstract for a scientific article using an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "paper2abstract",
    version,
    about = "Generate a formal abstract for a scientific article (PDF or text) using an LLM",
    long_about = "Extract the text of a scientific article (local PDF or text file, URL, stdin, \
or pasted text), strip page numbers and the bibliography, and ask an OpenRouter-compatible \
chat-completions endpoint for a formal abstract.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF or text file path, HTTP/HTTPS URL, or `-` for stdin.
    #[arg(required_unless_present = "text", conflicts_with = "text")]
    input: Option<String>,

    /// Article text given directly instead of a file.
    #[arg(long)]
    text: Option<String>,

    /// Write the annotation to this file instead of stdout.
    #[arg(short, long, env = "PAPER2ABSTRACT_OUTPUT")]
    output: Option<PathBuf>,

    /// API key for the completion endpoint.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model ID sent to the endpoint.
    #[arg(long, env = "PAPER2ABSTRACT_MODEL", default_value = paper2abstract::config::DEFAULT_MODEL)]
    model: String,

    /// Chat-completions endpoint URL.
    #[arg(long, env = "PAPER2ABSTRACT_ENDPOINT", default_value = paper2abstract::config::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// HTTP-Referer header value.
    #[arg(long, env = "PAPER2ABSTRACT_REFERER", default_value = paper2abstract::config::DEFAULT_REFERER)]
    referer: String,

    /// X-Title header value.
    #[arg(long, env = "PAPER2ABSTRACT_TITLE", default_value = paper2abstract::config::DEFAULT_TITLE)]
    title: String,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "PAPER2ABSTRACT_TEMPERATURE", default_value_t = 0.3)]
    temperature: f64,

    /// Nucleus-sampling top-p (0.0–1.0].
    #[arg(long, env = "PAPER2ABSTRACT_TOP_P", default_value_t = 0.9)]
    top_p: f64,

    /// Path to a text file with a custom prompt template containing `{text}`.
    #[arg(long, env = "PAPER2ABSTRACT_PROMPT_TEMPLATE")]
    prompt_template: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PAPER2ABSTRACT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Timeout for the completion call in seconds (default: wait indefinitely).
    #[arg(long, env = "PAPER2ABSTRACT_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PAPER2ABSTRACT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Only extract and clean the text; print it and exit.
    #[arg(long)]
    clean_only: bool,

    /// Print the cleaned article text before the annotation.
    #[arg(long)]
    show_cleaned: bool,

    /// Output structured JSON (AnnotationOutput) instead of plain text.
    #[arg(long, env = "PAPER2ABSTRACT_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PAPER2ABSTRACT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PAPER2ABSTRACT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long, env = "PAPER2ABSTRACT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is the normal case.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // spinner provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        progress.clone().map(|cb| cb as ProgressCallback),
    )
    .await?;

    let result = run(&cli, &config, progress.as_deref()).await;
    if let Some(ref cb) = progress {
        cb.finish();
    }
    result
}

async fn run(
    cli: &Cli,
    config: &AnnotationConfig,
    progress: Option<&CliProgressCallback>,
) -> Result<()> {
    // ── Resolve input ────────────────────────────────────────────────────
    let doc = match (&cli.text, &cli.input) {
        (Some(text), _) => RawDocument::Text(text.clone()),
        (None, Some(input)) => {
            let cb = config.progress_callback.as_ref();
            if let Some(cb) = cb {
                cb.on_stage_start(Stage::Resolve);
            }
            let doc = resolve_input(input, config.download_timeout_secs)
                .await
                .inspect_err(|e| {
                    if let Some(cb) = cb {
                        cb.on_stage_error(Stage::Resolve, &e.to_string());
                    }
                })
                .with_context(|| format!("Failed to read '{input}'"))?;
            if let Some(cb) = cb {
                cb.on_stage_complete(Stage::Resolve, doc.len());
            }
            doc
        }
        (None, None) => anyhow::bail!(paper2abstract::AnnotateError::NoInput),
    };

    if doc.is_pdf() {
        ensure_pdfium(cli.quiet)?;
    }

    // ── Clean-only mode ──────────────────────────────────────────────────
    if cli.clean_only {
        let cleaned = clean_document(doc, config)
            .await
            .context("Failed to prepare article text")?;
        if let Some(cb) = progress {
            cb.finish();
        }
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "cleaned_text": cleaned }))
                    .context("Failed to serialise output")?
            );
        } else {
            write_stdout(&cleaned)?;
        }
        return Ok(());
    }

    // ── Annotate ─────────────────────────────────────────────────────────
    let output = annotate_document(doc, config)
        .await
        .context("Annotation failed")?;

    // Stop the spinner before writing the result to the terminal.
    if let Some(cb) = progress {
        cb.finish();
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        if cli.show_cleaned {
            eprintln!("{}", bold("Cleaned article text:"));
            write_stdout(&output.cleaned_text)?;
            eprintln!();
            eprintln!("{}", bold("Generated annotation:"));
        }

        match (&output.annotation, &cli.output) {
            (Some(annotation), Some(path)) => {
                write_atomic(path, annotation)
                    .await
                    .context("Failed to write annotation")?;
                if !cli.quiet {
                    eprintln!(
                        "{}  {} chars  →  {}",
                        green("✔"),
                        annotation.chars().count(),
                        bold(&path.display().to_string()),
                    );
                }
            }
            (Some(annotation), None) => write_stdout(annotation)?,
            (None, _) => {}
        }
    }

    if !cli.quiet && !cli.json {
        let s = &output.stats;
        let pages = s
            .page_count
            .map(|p| format!("{p} pages, "))
            .unwrap_or_default();
        eprintln!(
            "   {}",
            dim(&format!(
                "{pages}{} → {} chars cleaned, completion {}ms, {}ms total",
                s.raw_chars, s.cleaned_chars, s.completion_duration_ms, s.total_duration_ms
            ))
        );
    }

    match output.error {
        None => Ok(()),
        Some(e) => Err(anyhow::Error::new(e).context("The completion API did not return an annotation")),
    }
}

/// Map CLI args to `AnnotationConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnnotationConfig> {
    let mut builder = AnnotationConfig::builder()
        .endpoint(&cli.endpoint)
        .model(&cli.model)
        .referer(&cli.referer)
        .title(&cli.title)
        .temperature(cli.temperature)
        .top_p(cli.top_p)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(secs) = cli.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(ref path) = cli.prompt_template {
        let template = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt template from {:?}", path))?;
        builder = builder.prompt_template(template);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Make sure a pdfium library is available before extracting a PDF.
///
/// With the `bundled` feature the library is embedded in the binary and only
/// needs extracting to the cache directory.
#[cfg(feature = "bundled")]
fn ensure_pdfium(_quiet: bool) -> Result<()> {
    tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_bundled())
        .context("Failed to extract bundled PDFium engine")?;
    Ok(())
}

/// Make sure a pdfium library is available before extracting a PDF.
///
/// The first run downloads it (~30 MB) to the pdfium-auto cache; later runs
/// only check the path.
#[cfg(not(feature = "bundled"))]
fn ensure_pdfium(quiet: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }
    if quiet {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    // block_in_place keeps the callback's borrow valid while moving the
    // blocking download off the async worker.
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

fn write_stdout(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}
