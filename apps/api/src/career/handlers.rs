//! Axum route handlers for the career features.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::career::analyzer::{analyze_job, JobAnalysis};
use crate::career::chat::{reply, ChatReply, ChatTurn};
use crate::career::interview::{prepare_interview, InterviewPrep};
use crate::career::resume::{extract_resume_text, tailor_resume, ResumeTailor};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub resume_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InterviewRequest {
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    /// The configured fallback order.
    pub priority: Vec<String>,
    /// What the gateway currently offers to this key.
    pub available: Vec<String>,
}

/// Returns the trimmed value, or a validation error naming the missing input.
fn required(value: Option<String>, what: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{what} is required")))
}

fn upload_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Invalid upload: {}", e.body_text()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<JobAnalysis>, AppError> {
    let job_description = required(request.job_description, "Job description")?;
    let analysis = analyze_job(&job_description, request.resume_text.as_deref(), &state.llm).await?;
    Ok(Json(analysis))
}

/// POST /api/v1/resume/tailor
///
/// Multipart upload with a single `file` field (PDF or plain text).
pub async fn handle_resume_tailor(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ResumeTailor>, AppError> {
    let mut upload: Option<(Bytes, Option<String>, Option<String>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(upload_error)?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(upload_error)?;
        upload = Some((data, file_name, content_type));
        break;
    }

    let (data, file_name, content_type) =
        upload.ok_or_else(|| AppError::Validation("No file provided".to_string()))?;
    info!(
        "Tailoring resume {:?} ({} bytes)",
        file_name.as_deref().unwrap_or("<unnamed>"),
        data.len()
    );

    let resume_text =
        extract_resume_text(data, file_name.as_deref(), content_type.as_deref()).await?;
    let tailored = tailor_resume(&resume_text, &state.llm).await?;
    Ok(Json(tailored))
}

/// POST /api/v1/interview
pub async fn handle_interview(
    State(state): State<AppState>,
    Json(request): Json<InterviewRequest>,
) -> Result<Json<InterviewPrep>, AppError> {
    let role = required(request.role, "Role")?;
    let prep = prepare_interview(&role, &state.llm).await?;
    Ok(Json(prep))
}

/// POST /api/v1/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let message = required(request.message, "Message")?;
    let chat_reply = reply(&message, &request.history, &state.llm).await?;
    Ok(Json(chat_reply))
}

/// GET /api/v1/models
///
/// Debug view of the fallback order next to what the gateway offers.
pub async fn handle_models(
    State(state): State<AppState>,
) -> Result<Json<ModelsResponse>, AppError> {
    let available = state.llm.available_models().await?;
    Ok(Json(ModelsResponse {
        priority: state.llm.settings().models.clone(),
        available,
    }))
}
