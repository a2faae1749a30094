
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use regex::bytes::Regex as BytesRegex;
use tracing::{debug, warn};

use crate::document::Document;
use crate::{ChatError, Result};

/// Separator used when joining per-page text from a PDF.
const PAGE_SEPARATOR: &str = "\n";

/// More underscores than this in the extracted text means the rendered
/// stream is dominated by template blanks.
const BLANK_FORM_UNDERSCORE_THRESHOLD: usize = 20;

static BLANK_LINE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*)+").expect("valid regex"));
static BREAK_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*([:,.\-])").expect("valid regex"));
static BREAK_AFTER_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([:,.\-])\n[ \t]*(\S)").expect("valid regex"));
static HYPHEN_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w)- (\w)").expect("valid regex"));
static SPLIT_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)\n(\d)").expect("valid regex"));

/// AcroForm field-value entries in the raw byte stream: slash-V, optional
/// whitespace, parenthesized value.
static FORM_FIELD_VALUE: Lazy<BytesRegex> =
    Lazy::new(|| BytesRegex::new(r"/V\s*\(([^)]*)\)").expect("valid regex"));

/// Load a PDF from disk and normalize its text into a single [`Document`]
/// whose `source` metadata is the input path.
///
/// Blank fillable forms are recognized and their field values recovered from
/// the raw byte stream, since that data never appears in the rendered text.
/// Everything else goes through the cleanup pipeline in
/// [`clean_extracted_text`].
#[inline]
pub fn load_pdf<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let raw = fs::read(path)
        .map_err(|e| ChatError::DocumentRead(format!("Failed to read {}: {}", path.display(), e)))?;

    let text = extract_pdf_text(&raw)
        .map_err(|e| ChatError::DocumentRead(format!("Failed to parse {}: {}", path.display(), e)))?;

    let normalized = normalize_extracted(&raw, &text);
    debug!(
        "Normalized {} ({} raw chars -> {} chars)",
        path.display(),
        text.len(),
        normalized.len()
    );

    Ok(Document::new(normalized, path.display().to_string()))
}

/// Extract text per page, joined with a single separator.
fn extract_pdf_text(raw: &[u8]) -> anyhow::Result<String> {
    let pdf = lopdf::Document::load_mem(raw)?;

    let mut pages = Vec::new();
    for page_number in pdf.get_pages().keys() {
        match pdf.extract_text(&[*page_number]) {
            Ok(text) => pages.push(text),
            Err(e) => {
                warn!("Failed to extract text from page {}: {}", page_number, e);
                pages.push(String::new());
            }
        }
    }

    Ok(pages.join(PAGE_SEPARATOR))
}

/// Decide between form-value recovery and the regular cleanup pipeline.
fn normalize_extracted(raw: &[u8], text: &str) -> String {
    if is_blank_form(raw, text) {
        let values = recover_form_values(raw);
        if values.is_empty() {
            warn!("Blank form detected but no field values recovered, keeping raw text");
            text.to_string()
        } else {
            debug!("Recovered {} form field values", values.len());
            values.join("\n")
        }
    } else {
        clean_extracted_text(text)
    }
}

/// A document is a blank fillable form iff the raw bytes carry a
/// form-definition marker and the rendered text is dominated by underscores.
fn is_blank_form(raw: &[u8], text: &str) -> bool {
    let has_form_marker = raw.windows(b"/AcroForm".len()).any(|w| w == b"/AcroForm");
    has_form_marker && text.matches('_').count() > BLANK_FORM_UNDERSCORE_THRESHOLD
}

/// Collect non-empty field values from the raw byte stream, trimmed and
/// deduplicated in first-seen order.
fn recover_form_values(raw: &[u8]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut values = Vec::new();

    for capture in FORM_FIELD_VALUE.captures_iter(raw) {
        let Some(matched) = capture.get(1) else {
            continue;
        };
        let value = String::from_utf8_lossy(matched.as_bytes()).trim().to_string();
        if !value.is_empty() && seen.insert(value.clone()) {
            values.push(value);
        }
    }

    values
}

/// Deterministic text cleanup for extracted PDF text, applied in this exact
/// order. Each step is a pure transform.
#[inline]
pub fn clean_extracted_text(text: &str) -> String {
    let text = collapse_blank_lines(text);
    let text = rejoin_punctuation_breaks(&text);
    let text = join_hyphenated_words(&text);
    let text = join_split_numbers(&text);
    trim_lines(&text)
}

/// Collapse runs of blank lines down to a single blank line.
fn collapse_blank_lines(text: &str) -> String {
    BLANK_LINE_RUN.replace_all(text, "\n\n").into_owned()
}

/// Rejoin a line break immediately before or after a lone punctuation
/// character into the surrounding line. A blank line after the punctuation
/// is a paragraph boundary, not a wrap artifact, and is left alone.
fn rejoin_punctuation_breaks(text: &str) -> String {
    let text = BREAK_BEFORE_PUNCT.replace_all(text, "$1");
    BREAK_AFTER_PUNCT.replace_all(&text, "$1 $2").into_owned()
}

/// Join a hyphen-space sequence between two word characters into a plain
/// hyphen, fixing mid-word breaks introduced by line wrapping.
fn join_hyphenated_words(text: &str) -> String {
    HYPHEN_BREAK.replace_all(text, "$1-$2").into_owned()
}

/// Join a digit-newline-digit sequence into a contiguous number.
fn join_split_numbers(text: &str) -> String {
    SPLIT_NUMBER.replace_all(text, "$1$2").into_owned()
}

/// Trim every line and drop the empty ones.
fn trim_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
