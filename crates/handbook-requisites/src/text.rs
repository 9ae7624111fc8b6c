//! Shared text cleaning: whitespace normalisation and subject-code handling.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::warn;

use crate::types::RequisiteError;

/// Four letters followed by five digits, anywhere in a string.
static SUBJECT_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[a-z]{4}\d{5}").expect("subject code regex is valid"));

/// A string consisting of exactly one subject code.
static SUBJECT_CODE_EXACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{4}\d{5}$").expect("exact code regex is valid"));

/// Collapse runs of whitespace into a single space and trim.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Concatenated text content of an element, whitespace-collapsed.
pub fn element_text(el: &ElementRef<'_>) -> String {
    normalize_ws(&el.text().collect::<String>())
}

/// Compile a CSS selector literal.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

/// Whether `s` is exactly one subject code (case-insensitive).
pub fn is_subject_code(s: &str) -> bool {
    SUBJECT_CODE_EXACT.is_match(s)
}

/// Every subject code mentioned in `text`, uppercased, in order of first
/// appearance and without duplicates.
pub fn find_subject_codes(text: &str) -> Vec<String> {
    let mut codes: Vec<String> = Vec::new();
    for m in SUBJECT_CODE.find_iter(text) {
        let code = m.as_str().to_ascii_uppercase();
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    codes
}

/// Normalise a code list taken from a table or bullet list.
///
/// Entries that are not exactly a subject code are replaced by the first code
/// found inside them, or dropped with a format warning if they contain none.
/// `own_code` never survives, and duplicates are removed.
pub fn clean_subject_codes(entries: &[String], own_code: &str) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for entry in entries {
        let code = match canonical_code(entry) {
            Ok(code) => code,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };
        if code.eq_ignore_ascii_case(own_code) || cleaned.contains(&code) {
            continue;
        }
        cleaned.push(code);
    }
    cleaned
}

fn canonical_code(entry: &str) -> Result<String, RequisiteError> {
    let entry = entry.trim();
    if is_subject_code(entry) {
        return Ok(entry.to_ascii_uppercase());
    }
    SUBJECT_CODE
        .find(entry)
        .map(|m| m.as_str().to_ascii_uppercase())
        .ok_or_else(|| RequisiteError::Format(format!("strange subject format: {entry:?}")))
}
