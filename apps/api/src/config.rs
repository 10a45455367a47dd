use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::{
    LlmSettings, CLIENT_TITLE, DEFAULT_COMPLETION_URL, DEFAULT_MODELS_URL, DEFAULT_REFERER,
    MODEL_PRIORITY,
};

const DEFAULT_ATTEMPT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CALL_BUDGET_SECS: u64 = 180;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
///
/// The gateway key is intentionally absent: it is read on every completion call.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Sent as the referer header to the completion gateway.
    pub app_url: String,
    pub completion_url: String,
    pub models_url: String,
    pub model_priority: Vec<String>,
    pub attempt_timeout: Duration,
    pub call_budget: Duration,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let model_priority = match get("OPENROUTER_MODELS") {
            Some(list) => parse_model_list(&list)?,
            None => MODEL_PRIORITY.iter().map(|m| m.to_string()).collect(),
        };

        Ok(Config {
            port: parse_or(get("PORT"), 8080, "PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            app_url: get("APP_URL")
                .or_else(|| get("NEXTAUTH_URL"))
                .unwrap_or_else(|| DEFAULT_REFERER.to_string()),
            completion_url: get("OPENROUTER_API_URL")
                .unwrap_or_else(|| DEFAULT_COMPLETION_URL.to_string()),
            models_url: get("OPENROUTER_MODELS_URL")
                .unwrap_or_else(|| DEFAULT_MODELS_URL.to_string()),
            model_priority,
            attempt_timeout: Duration::from_secs(parse_or(
                get("LLM_ATTEMPT_TIMEOUT_SECS"),
                DEFAULT_ATTEMPT_TIMEOUT_SECS,
                "LLM_ATTEMPT_TIMEOUT_SECS must be a whole number of seconds",
            )?),
            call_budget: Duration::from_secs(parse_or(
                get("LLM_CALL_BUDGET_SECS"),
                DEFAULT_CALL_BUDGET_SECS,
                "LLM_CALL_BUDGET_SECS must be a whole number of seconds",
            )?),
            max_upload_bytes: parse_or(
                get("RESUME_MAX_UPLOAD_BYTES"),
                DEFAULT_MAX_UPLOAD_BYTES,
                "RESUME_MAX_UPLOAD_BYTES must be a number of bytes",
            )?,
        })
    }

    /// Completion client settings derived from this config.
    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            completion_url: self.completion_url.clone(),
            models_url: self.models_url.clone(),
            models: self.model_priority.clone(),
            referer: self.app_url.clone(),
            title: CLIENT_TITLE.to_string(),
            attempt_timeout: self.attempt_timeout,
            call_budget: self.call_budget,
        }
    }
}

fn parse_or<T>(value: Option<String>, default: T, message: &'static str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v.trim().parse::<T>().context(message),
        None => Ok(default),
    }
}

fn parse_model_list(list: &str) -> Result<Vec<String>> {
    let models: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();
    if models.is_empty() {
        bail!("OPENROUTER_MODELS must name at least one model");
    }
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.app_url, DEFAULT_REFERER);
        assert_eq!(config.completion_url, DEFAULT_COMPLETION_URL);
        assert_eq!(config.model_priority.len(), MODEL_PRIORITY.len());
        assert_eq!(config.attempt_timeout, Duration::from_secs(60));
        assert_eq!(config.call_budget, Duration::from_secs(180));
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_model_override_is_trimmed_and_ordered() {
        let config = config(&[("OPENROUTER_MODELS", " openai/gpt-4o-mini , ,google/gemini-pro-1.5")])
            .unwrap();
        assert_eq!(
            config.model_priority,
            vec!["openai/gpt-4o-mini", "google/gemini-pro-1.5"]
        );
    }

    #[test]
    fn test_model_override_without_models_is_rejected() {
        assert!(config(&[("OPENROUTER_MODELS", " , ")]).is_err());
    }

    #[test]
    fn test_nextauth_url_is_a_referer_fallback() {
        let fallback = config(&[("NEXTAUTH_URL", "https://workhub.example")]).unwrap();
        assert_eq!(fallback.app_url, "https://workhub.example");

        let both = config(&[
            ("APP_URL", "https://app.example"),
            ("NEXTAUTH_URL", "https://workhub.example"),
        ])
        .unwrap();
        assert_eq!(both.app_url, "https://app.example");
    }

    #[test]
    fn test_invalid_numbers_fail() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert!(config(&[("LLM_CALL_BUDGET_SECS", "-1")]).is_err());
    }

    #[test]
    fn test_llm_settings_carry_config() {
        let config = config(&[
            ("APP_URL", "https://app.example"),
            ("LLM_ATTEMPT_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        let settings = config.llm_settings();
        assert_eq!(settings.referer, "https://app.example");
        assert_eq!(settings.title, CLIENT_TITLE);
        assert_eq!(settings.attempt_timeout, Duration::from_secs(5));
        assert_eq!(settings.models, config.model_priority);
    }
}
