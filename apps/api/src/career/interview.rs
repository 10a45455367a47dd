//! Interview preparation questions by role.

use serde::{Deserialize, Serialize};

use crate::career::prompts::{INTERVIEW_SHAPE, INTERVIEW_TASK_TEMPLATE};
use crate::errors::AppError;
use crate::llm_client::prompts::{fill_template, json_prompt};
use crate::llm_client::{generate_json, TextGenerator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewPrep {
    pub technical: Vec<Question>,
    pub behavioral: Vec<Question>,
    pub company_specific: Vec<Question>,
}

pub fn build_interview_prompt(role: &str) -> String {
    json_prompt(
        &fill_template(INTERVIEW_TASK_TEMPLATE, &[("role", role)]),
        INTERVIEW_SHAPE,
    )
}

pub async fn prepare_interview(
    role: &str,
    llm: &dyn TextGenerator,
) -> Result<InterviewPrep, AppError> {
    let prompt = build_interview_prompt(role);
    Ok(generate_json::<InterviewPrep>(llm, &prompt).await?)
}
