//! Pipeline stages for article annotation.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and the PDF backend can change without touching the
//! cleaner or the client.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ clean ──▶ client
//! (path/URL)  (pdfium)   (regex)   (HTTPS)
//! ```
//!
//! 1. [`input`]   — read the file, stdin, or URL and sniff PDF vs text
//! 2. [`extract`] — pull the text layer out of a PDF; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`clean`]   — drop page numbers and the bibliography, collapse blank
//!    lines
//! 4. [`client`]  — one chat-completion call; the only stage that talks to
//!    the model

pub mod clean;
pub mod client;
pub mod extract;
pub mod input;
