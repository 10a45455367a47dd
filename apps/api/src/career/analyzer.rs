//! Job posting analysis against a candidate resume.

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::career::prompts::{
    ANALYZE_SHAPE, ANALYZE_TASK_TEMPLATE, CANDIDATE_RESUME, RESUME_SECTION_TEMPLATE,
    TYPICAL_CANDIDATE,
};
use crate::errors::AppError;
use crate::llm_client::prompts::{fill_template, json_prompt};
use crate::llm_client::{generate_json, TextGenerator};

/// Structured analysis of a job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAnalysis {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    /// 0 to 100, as judged by the model. Numeric strings such as `"75"` or `"75%"`
    /// are accepted.
    #[serde(deserialize_with = "lenient_score")]
    pub match_score: f64,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub responsibilities: Vec<String>,
}

fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Score {
        Number(f64),
        Text(String),
    }

    match Score::deserialize(deserializer)? {
        Score::Number(n) => Ok(n),
        Score::Text(text) => text
            .trim()
            .trim_end_matches('%')
            .trim_end()
            .parse()
            .map_err(|_| de::Error::custom(format!("matchScore is not a number: {text:?}"))),
    }
}

/// Builds the analysis prompt. Missing skills are judged against `resume_text`
/// when given, otherwise against a typical candidate.
pub fn build_analyze_prompt(job_description: &str, resume_text: Option<&str>) -> String {
    let (comparison, resume_section) = match resume_text.map(str::trim).filter(|r| !r.is_empty()) {
        Some(resume) => (
            CANDIDATE_RESUME,
            fill_template(RESUME_SECTION_TEMPLATE, &[("resume_text", resume)]),
        ),
        None => (TYPICAL_CANDIDATE, String::new()),
    };
    let task = fill_template(
        ANALYZE_TASK_TEMPLATE,
        &[
            ("comparison", comparison),
            ("job_description", job_description),
            ("resume_section", resume_section.as_str()),
        ],
    );
    json_prompt(&task, ANALYZE_SHAPE)
}

pub async fn analyze_job(
    job_description: &str,
    resume_text: Option<&str>,
    llm: &dyn TextGenerator,
) -> Result<JobAnalysis, AppError> {
    let prompt = build_analyze_prompt(job_description, resume_text);
    Ok(generate_json::<JobAnalysis>(llm, &prompt).await?)
}
