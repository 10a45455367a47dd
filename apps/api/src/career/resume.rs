//! Resume tailoring: text extraction from the uploaded file, then an LLM rewrite of
//! summary, experiences and skills.

use anyhow::anyhow;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::career::prompts::{RESUME_SHAPE, RESUME_TASK_TEMPLATE};
use crate::errors::AppError;
use crate::llm_client::prompts::{fill_template, json_prompt};
use crate::llm_client::{generate_json, TextGenerator};

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeTailor {
    pub summary: String,
    #[serde(default)]
    pub experiences: Vec<Experience>,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// How an uploaded resume should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    PlainText,
}

/// Detects the upload format from the declared content type, the file name and the
/// leading bytes. Anything that is not a PDF is treated as text.
pub fn detect_format(
    file_name: Option<&str>,
    content_type: Option<&str>,
    data: &[u8],
) -> ResumeFormat {
    let pdf_type = content_type.is_some_and(|t| t.eq_ignore_ascii_case("application/pdf"));
    let pdf_name = file_name.is_some_and(|n| n.to_ascii_lowercase().ends_with(".pdf"));
    if pdf_type || pdf_name || data.starts_with(PDF_MAGIC) {
        ResumeFormat::Pdf
    } else {
        ResumeFormat::PlainText
    }
}

/// Extracts plain text from an uploaded resume. PDF parsing runs on a blocking thread.
pub async fn extract_resume_text(
    data: Bytes,
    file_name: Option<&str>,
    content_type: Option<&str>,
) -> Result<String, AppError> {
    let text = match detect_format(file_name, content_type, &data) {
        ResumeFormat::Pdf => {
            debug!("Extracting text from PDF resume ({} bytes)", data.len());
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
                .await
                .map_err(|e| {
                    // pdf-extract panics on some malformed documents
                    if e.is_panic() {
                        AppError::Validation("Could not read PDF".to_string())
                    } else {
                        AppError::Internal(anyhow!("PDF extraction task failed: {e}"))
                    }
                })?
                .map_err(|e| AppError::Validation(format!("Could not read PDF: {e}")))?
        }
        ResumeFormat::PlainText => String::from_utf8(data.to_vec()).map_err(|_| {
            AppError::Validation("Resume must be a PDF or a UTF-8 text file".to_string())
        })?,
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::Validation(
            "No text could be extracted from the resume".to_string(),
        ));
    }
    Ok(text)
}

pub fn build_resume_prompt(resume_text: &str) -> String {
    json_prompt(
        &fill_template(RESUME_TASK_TEMPLATE, &[("resume_text", resume_text)]),
        RESUME_SHAPE,
    )
}

pub async fn tailor_resume(
    resume_text: &str,
    llm: &dyn TextGenerator,
) -> Result<ResumeTailor, AppError> {
    let prompt = build_resume_prompt(resume_text);
    Ok(generate_json::<ResumeTailor>(llm, &prompt).await?)
}
