//! LLM client: the single point of entry for all completion-gateway calls in WorkHub.
//!
//! ARCHITECTURAL RULE: No other module may call the gateway directly.
//! All LLM interactions MUST go through this module.
//!
//! Models are tried in a fixed priority order. "Model unavailable" failures fall
//! through to the next model; anything else (auth, credits, rate limits, bad
//! requests) is returned immediately.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

pub mod classify;
pub mod credentials;
pub mod extract;
pub mod prompts;

use crate::llm_client::classify::{classify, Disposition};
use crate::llm_client::credentials::{resolve_api_key, CredentialSource, GEMINI_KEY_ENV};
use crate::llm_client::extract::{extract_json, ExtractError};

pub const DEFAULT_COMPLETION_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODELS_URL: &str = "https://openrouter.ai/api/v1/models";
pub const DEFAULT_REFERER: &str = "http://localhost:3000";
pub const CLIENT_TITLE: &str = "WorkHub Career Copilot";

/// Fastest/cheapest first, most capable later, free tier as the last resort.
pub const MODEL_PRIORITY: [&str; 6] = [
    "google/gemini-flash-1.5",
    "google/gemini-pro-1.5",
    "anthropic/claude-3.5-sonnet",
    "openai/gpt-4o-mini",
    "openai/gpt-3.5-turbo",
    "meta-llama/llama-3.1-8b-instruct:free",
];

/// Sampling temperature for every request. Not configurable.
pub const TEMPERATURE: f64 = 0.7;

const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_CALL_BUDGET: Duration = Duration::from_secs(180);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A failed attempt against one model, as reported by the gateway or transport.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamFailure {
    pub model: String,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Provider error code from `error.code`, rendered as a string.
    pub code: Option<String>,
    pub message: String,
    /// Decoded error body, when there was one.
    pub body: Option<Value>,
}

impl fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (model {}, HTTP {status})", self.message, self.model),
            None => write!(f, "{} (model {})", self.message, self.model),
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{}", missing_credential_message(.key, *.gemini_key_found))]
    MissingCredential {
        key: &'static str,
        gemini_key_found: bool,
    },

    #[error(
        "Invalid OpenRouter API key format. Keys should start with '{expected}'. \
         Your key starts with: {found_prefix}..."
    )]
    InvalidCredentialFormat {
        found_prefix: String,
        expected: &'static str,
    },

    #[error("OpenRouter API error: {0}")]
    Upstream(UpstreamFailure),

    #[error("{}", all_models_unavailable_message(*.attempted, .last_error.as_ref()))]
    AllModelsUnavailable {
        attempted: usize,
        last_error: Option<UpstreamFailure>,
    },

    #[error(
        "Completion did not finish within {}s. Last error: {}",
        .budget.as_secs(),
        describe_last(.last_error.as_ref())
    )]
    DeadlineExceeded {
        budget: Duration,
        last_error: Option<UpstreamFailure>,
    },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Model returned JSON in an unexpected shape: {0}")]
    UnexpectedShape(#[source] serde_json::Error),
}

fn missing_credential_message(key: &str, gemini_key_found: bool) -> String {
    if gemini_key_found {
        format!(
            "Found {GEMINI_KEY_ENV}, but this app uses OpenRouter and a Gemini key will not work. \
             Add {key}=\"sk-or-v1-...\" to your .env file and restart the server."
        )
    } else {
        format!(
            "{key} is not configured. Add {key}=\"sk-or-v1-...\" to your .env file \
             and restart the server."
        )
    }
}

fn all_models_unavailable_message(attempted: usize, last: Option<&UpstreamFailure>) -> String {
    format!(
        "All AI models unavailable ({attempted} tried). Check that your OpenRouter key is \
         valid, that the account has credits, and that the key has no model restrictions. \
         Last error: {}",
        describe_last(last)
    )
}

fn describe_last(last: Option<&UpstreamFailure>) -> String {
    last.map(ToString::to_string)
        .unwrap_or_else(|| "Unknown error".to_string())
}

/// Immutable client configuration. Tests substitute a short list of fake models and
/// a local endpoint.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub completion_url: String,
    pub models_url: String,
    pub models: Vec<String>,
    pub referer: String,
    pub title: String,
    pub attempt_timeout: Duration,
    pub call_budget: Duration,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            completion_url: DEFAULT_COMPLETION_URL.to_string(),
            models_url: DEFAULT_MODELS_URL.to_string(),
            models: MODEL_PRIORITY.iter().map(|m| m.to_string()).collect(),
            referer: DEFAULT_REFERER.to_string(),
            title: CLIENT_TITLE.to_string(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            call_budget: DEFAULT_CALL_BUDGET,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatResponse {
    /// Content of the first choice, if present and non-empty.
    fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Anything that turns a prompt into completion text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String, LlmError>;
}

/// The single LLM client used by all services in WorkHub.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    settings: Arc<LlmSettings>,
    credentials: Arc<dyn CredentialSource>,
}

/// Outcome of one attempt that did not produce text.
enum AttemptError {
    Failed(UpstreamFailure, Disposition),
    /// The overall call budget ran out mid-attempt.
    OutOfBudget,
}

impl LlmClient {
    pub fn new(
        settings: LlmSettings,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            client,
            settings: Arc::new(settings),
            credentials,
        })
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    /// Sends `prompt` to each model in priority order until one returns text.
    ///
    /// Fails immediately on credential problems and on fatal upstream errors. Fails
    /// with `AllModelsUnavailable` once every model has been tried, and with
    /// `DeadlineExceeded` if the call budget runs out first.
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let api_key = resolve_api_key(self.credentials.as_ref())?;
        let deadline = Instant::now() + self.settings.call_budget;
        let mut last_error: Option<UpstreamFailure> = None;

        for (index, model) in self.settings.models.iter().enumerate() {
            if Instant::now() >= deadline {
                return Err(self.deadline_exceeded(last_error));
            }
            debug!("Trying model {model} ({}/{})", index + 1, self.settings.models.len());

            match self.attempt(model, prompt, &api_key, deadline).await {
                Ok(text) => {
                    if index > 0 {
                        info!("Using fallback model: {model}");
                    }
                    return Ok(text);
                }
                Err(AttemptError::OutOfBudget) => {
                    return Err(self.deadline_exceeded(last_error));
                }
                Err(AttemptError::Failed(failure, Disposition::Retryable)) => {
                    warn!("Model {model} not available, trying next: {failure}");
                    last_error = Some(failure);
                }
                Err(AttemptError::Failed(failure, Disposition::Fatal)) => {
                    error!(body = ?failure.body, "OpenRouter API error with model {model}: {failure}");
                    return Err(LlmError::Upstream(failure));
                }
            }
        }

        error!(
            "All {} models failed, last error: {}",
            self.settings.models.len(),
            describe_last(last_error.as_ref())
        );
        Err(LlmError::AllModelsUnavailable {
            attempted: self.settings.models.len(),
            last_error,
        })
    }

    /// Lists the model ids the gateway currently offers to this key.
    pub async fn available_models(&self) -> Result<Vec<String>, LlmError> {
        let api_key = resolve_api_key(self.credentials.as_ref())?;
        let failure = |status: Option<u16>, message: String| {
            LlmError::Upstream(UpstreamFailure {
                model: "*".to_string(),
                status,
                code: None,
                message,
                body: None,
            })
        };

        let response = tokio::time::timeout(
            self.settings.attempt_timeout,
            self.client
                .get(&self.settings.models_url)
                .bearer_auth(api_key.expose_secret())
                .send(),
        )
        .await
        .map_err(|_| failure(None, "Timed out listing models".to_string()))?
        .map_err(|e| failure(None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failure(Some(status.as_u16()), format!("HTTP {}", status.as_u16())));
        }

        let list: ModelList = response
            .json()
            .await
            .map_err(|e| failure(Some(status.as_u16()), e.to_string()))?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }

    async fn attempt(
        &self,
        model: &str,
        prompt: &str,
        api_key: &SecretString,
        deadline: Instant,
    ) -> Result<String, AttemptError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let limit = remaining.min(self.settings.attempt_timeout);

        match tokio::time::timeout(limit, self.send(model, prompt, api_key)).await {
            Ok(result) => result,
            Err(_) if Instant::now() >= deadline => Err(AttemptError::OutOfBudget),
            Err(_) => {
                let failure = UpstreamFailure {
                    model: model.to_string(),
                    status: None,
                    code: None,
                    message: format!("Timed out after {limit:?}"),
                    body: None,
                };
                Err(AttemptError::Failed(failure, Disposition::Retryable))
            }
        }
    }

    async fn send(
        &self,
        model: &str,
        prompt: &str,
        api_key: &SecretString,
    ) -> Result<String, AttemptError> {
        let request_body = ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.settings.completion_url)
            .bearer_auth(api_key.expose_secret())
            .header("HTTP-Referer", &self.settings.referer)
            .header("X-Title", &self.settings.title)
            .json(&request_body)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                let failure = UpstreamFailure {
                    model: model.to_string(),
                    status: None,
                    code: None,
                    message: e.to_string(),
                    body: None,
                };
                let disposition = classify(None, None, &failure.message);
                return Err(AttemptError::Failed(failure, disposition));
            }
        };

        let status = response.status();

        if !status.is_success() {
            let body: Option<Value> = response.json().await.ok();
            let failure = error_from_body(model, status.as_u16(), body);
            let disposition =
                classify(failure.status, failure.code.as_deref(), &failure.message);
            return Err(AttemptError::Failed(failure, disposition));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            AttemptError::Failed(
                UpstreamFailure {
                    model: model.to_string(),
                    status: Some(status.as_u16()),
                    code: None,
                    message: format!("Malformed completion response: {e}"),
                    body: None,
                },
                Disposition::Fatal,
            )
        })?;

        parsed.into_text().ok_or_else(|| {
            AttemptError::Failed(
                UpstreamFailure {
                    model: model.to_string(),
                    status: Some(status.as_u16()),
                    code: None,
                    message: "No response text from OpenRouter API".to_string(),
                    body: None,
                },
                Disposition::Retryable,
            )
        })
    }

    fn deadline_exceeded(&self, last_error: Option<UpstreamFailure>) -> LlmError {
        error!(
            "Completion budget of {}s exhausted",
            self.settings.call_budget.as_secs()
        );
        LlmError::DeadlineExceeded {
            budget: self.settings.call_budget,
            last_error,
        }
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate_text(&self, prompt: &str) -> Result<String, LlmError> {
        self.complete(prompt).await
    }
}

/// Builds an `UpstreamFailure` from a best-effort decoded `{error: {message, code}}` body.
fn error_from_body(model: &str, status: u16, body: Option<Value>) -> UpstreamFailure {
    let error = body.as_ref().and_then(|b| b.get("error"));
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {status}"));
    let code = error.and_then(|e| e.get("code")).and_then(|c| match c {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    UpstreamFailure {
        model: model.to_string(),
        status: Some(status),
        code,
        message,
        body,
    }
}

/// Convenience helper that generates text and deserializes the JSON inside it.
/// The prompt must instruct the model to return JSON.
pub async fn generate_json<T: DeserializeOwned>(
    generator: &dyn TextGenerator,
    prompt: &str,
) -> Result<T, LlmError> {
    let text = generator.generate_text(prompt).await?;
    let value = extract_json(&text)?;
    serde_json::from_value(value).map_err(LlmError::UnexpectedShape)
}
