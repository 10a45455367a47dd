//! Credential resolution for the completion gateway.
//!
//! The key is looked up on every call rather than cached, so rotating the value in
//! the environment takes effect without a restart.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error};

use crate::llm_client::LlmError;

/// Environment variable holding the gateway key.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
/// Legacy key from the pre-gateway setup. Only used to improve the diagnostic.
pub const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";
/// Every valid gateway key starts with this.
pub const API_KEY_PREFIX: &str = "sk-or-v1-";

const MAX_HINT_CHARS: usize = 9;

/// Where the completion client gets its key from.
pub trait CredentialSource: Send + Sync {
    /// Raw value configured for [`API_KEY_ENV`], if any.
    fn api_key(&self) -> Option<String>;

    /// Whether a legacy Gemini key is configured instead.
    fn has_gemini_key(&self) -> bool {
        false
    }
}

/// Reads credentials from the process environment (populated from `.env` at startup).
pub struct EnvCredentials;

impl CredentialSource for EnvCredentials {
    fn api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV).ok()
    }

    fn has_gemini_key(&self) -> bool {
        std::env::var(GEMINI_KEY_ENV)
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}

/// A fixed credential.
#[cfg(test)]
pub struct StaticCredential(pub Option<String>);

#[cfg(test)]
impl CredentialSource for StaticCredential {
    fn api_key(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Resolves and validates the gateway key.
///
/// Blank values count as missing. Surrounding whitespace is stripped before the
/// prefix check.
pub fn resolve_api_key(source: &dyn CredentialSource) -> Result<SecretString, LlmError> {
    let raw = source
        .api_key()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());

    let Some(key) = raw else {
        let gemini_key_found = source.has_gemini_key();
        error!(gemini_key_found, "{API_KEY_ENV} is not configured");
        return Err(LlmError::MissingCredential {
            key: API_KEY_ENV,
            gemini_key_found,
        });
    };

    let key = SecretString::new(key);
    let hint = key_hint(key.expose_secret());

    if !key.expose_secret().starts_with(API_KEY_PREFIX) {
        error!("Invalid {API_KEY_ENV} format: starts with {hint:?}, expected {API_KEY_PREFIX}...");
        return Err(LlmError::InvalidCredentialFormat {
            found_prefix: hint,
            expected: API_KEY_PREFIX,
        });
    }

    debug!("Using {API_KEY_ENV}: {hint}...");
    Ok(key)
}

/// Short, non-reversible hint of a secret: at most 9 characters and never more
/// than half of the key.
pub fn key_hint(key: &str) -> String {
    let len = key.chars().count();
    key.chars().take(MAX_HINT_CHARS.min(len / 2)).collect()
}
