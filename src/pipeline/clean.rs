//! Cleaning pass: strip page numbers and the bibliography from article text.
//!
//! Text pulled out of a PDF carries noise that only costs tokens and confuses
//! the model: running page numbers on their own line, the reference list,
//! and runs of blank lines left over from the page layout. This module
//! removes them with four deterministic rules.
//!
//! ## Rule Order
//!
//! Page numbers go first so that a number sitting right above the
//! bibliography heading does not survive as the last line. Blank lines are
//! collapsed after truncation because the cut usually leaves a blank tail.

use once_cell::sync::Lazy;
use regex::Regex;

/// Clean raw article text.
///
/// Rules (applied in order):
/// 1. Remove lines holding nothing but a page number (`\n<digits>\n` → `\n`)
/// 2. Cut everything from the first bibliography heading onward
///    (`Список литературы`, `Литература`, `References`; case-insensitive)
/// 3. Collapse runs of blank lines into a single newline
/// 4. Trim leading/trailing whitespace
///
/// Never fails; the result may be empty. The function is idempotent.
pub fn clean_text(text: &str) -> String {
    let s = remove_page_numbers(text);
    let s = truncate_at_bibliography(&s);
    let s = collapse_blank_lines(s);
    s.trim().to_string()
}

// ── Rule 1: Page numbers ─────────────────────────────────────────────────────

static RE_PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\d+\n").unwrap());

fn remove_page_numbers(input: &str) -> String {
    // Adjacent numeric lines share a newline, so one replace_all pass only
    // removes every other one.
    let mut s = input.to_string();
    while RE_PAGE_NUMBER.is_match(&s) {
        s = RE_PAGE_NUMBER.replace_all(&s, "\n").into_owned();
    }
    s
}

// ── Rule 2: Bibliography ─────────────────────────────────────────────────────

static RE_BIBLIOGRAPHY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(Список литературы|Литература|References)").unwrap());

fn truncate_at_bibliography(input: &str) -> &str {
    match RE_BIBLIOGRAPHY.find(input) {
        Some(m) => &input[..m.start()],
        None => input,
    }
}

// ── Rule 3: Blank lines ──────────────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n").into_owned()
}
