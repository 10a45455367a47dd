//! Upstream error classification for the model fallback loop.

/// Provider error code meaning the requested model does not exist.
pub const MODEL_NOT_FOUND_CODE: &str = "model_not_found";

/// Case-sensitive fragments that mark a message as "model unavailable".
const UNAVAILABLE_PHRASES: [&str; 4] = [
    "not found",
    "is not found",
    "not supported",
    "model_not_found",
];

/// What the fallback loop should do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The model is unusable right now; another model may succeed.
    Retryable,
    /// The request, key or account is at fault; stop immediately.
    Fatal,
}

/// Classifies an upstream failure from its HTTP status, decoded provider code and
/// message. Phrase matching is loose and case-sensitive.
pub fn classify(status: Option<u16>, code: Option<&str>, message: &str) -> Disposition {
    if status == Some(404) {
        return Disposition::Retryable;
    }
    if code == Some(MODEL_NOT_FOUND_CODE) {
        return Disposition::Retryable;
    }
    if UNAVAILABLE_PHRASES.iter().any(|p| message.contains(p)) {
        return Disposition::Retryable;
    }
    Disposition::Fatal
}
