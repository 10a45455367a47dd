//! Recovers a JSON value from raw model output.
//!
//! Models often wrap their answer in prose or a markdown fence even when told not
//! to. Extraction tries, in order:
//! 1. the whole text;
//! 2. the first fenced ```` ```json ```` object, else the first `{...}` span;
//! 3. when the step 2 candidate does not parse, the widest `{...}` span.
//!
//! Invalid JSON is never repaired. When several objects are present the first
//! candidate wins, which is a heuristic rather than a guarantee.
//!
//! Parsing keeps `serde_json`'s nesting limit of 128 levels. Model output nested
//! deeper than that is reported as [`ExtractError::NoJsonFound`] instead of being
//! parsed on an unbounded stack.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

static FENCED_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```").expect("fenced object pattern is valid")
});

static BARE_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(\{.*\})").expect("bare object pattern is valid"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Could not extract valid JSON from response")]
    NoJsonFound,
}

/// Parses `text` as JSON, falling back to the fenced / brace-delimited spans
/// described in the module docs.
pub fn extract_json(text: &str) -> Result<Value, ExtractError> {
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }

    let candidate = FENCED_OBJECT
        .captures(text)
        .or_else(|| BARE_OBJECT.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or(ExtractError::NoJsonFound)?;

    if let Ok(value) = serde_json::from_str(candidate) {
        return Ok(value);
    }
    debug!("First JSON candidate did not parse, trying widest brace span");

    widest_brace_span(text)
        .and_then(|span| serde_json::from_str(span).ok())
        .ok_or(ExtractError::NoJsonFound)
}

/// The span from the first `{` to the last `}`, if that range is non-empty.
fn widest_brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
