// All LLM prompt constants for the career features.
// Templates use `{placeholder}` markers filled by `llm_client::prompts::fill_template`.
// Shapes are appended with `llm_client::prompts::json_prompt`.

/// Job analysis task. Replace `{comparison}`, `{job_description}` and `{resume_section}`.
pub const ANALYZE_TASK_TEMPLATE: &str = "Analyze this job description and provide:
1. Required skills (as a JSON array)
2. Missing skills compared to {comparison} (as a JSON array)
3. Match score (0-100 as a number)
4. Suggestions for improvement (as a JSON array)
5. Key responsibilities (as a JSON array)

Job Description:
{job_description}{resume_section}";

/// Used for `{comparison}` when no resume is supplied.
pub const TYPICAL_CANDIDATE: &str = "a typical candidate";

/// Used for `{comparison}` when a resume is supplied.
pub const CANDIDATE_RESUME: &str = "the candidate's resume below";

/// Used for `{resume_section}` when a resume is supplied. Replace `{resume_text}`.
pub const RESUME_SECTION_TEMPLATE: &str = "

Candidate Resume:
{resume_text}";

pub const ANALYZE_SHAPE: &str = r#"{
  "skills": ["skill1", "skill2"],
  "missingSkills": ["skill3", "skill4"],
  "matchScore": 75,
  "suggestions": ["suggestion1", "suggestion2"],
  "responsibilities": ["responsibility1", "responsibility2"]
}"#;

/// Resume tailoring task. Replace `{resume_text}`.
pub const RESUME_TASK_TEMPLATE: &str = "Analyze this resume and provide:
1. An optimized professional summary (2-3 sentences)
2. Rewritten key experiences with better impact (as JSON array of objects with title, company, description and duration when the resume states one)
3. Extracted and optimized skills list (as JSON array)

Resume Text:
{resume_text}";

pub const RESUME_SHAPE: &str = r#"{
  "summary": "optimized summary text",
  "experiences": [{"title": "Job Title", "company": "Company", "description": "description", "duration": "2021 - 2023"}],
  "skills": ["skill1", "skill2"]
}"#;

/// Interview preparation task. Replace `{role}`.
pub const INTERVIEW_TASK_TEMPLATE: &str = r#"Generate interview preparation questions for the role: {role}

Provide:
1. 10 technical questions (as JSON array of objects with "question" and optional "answer")
2. 10 behavioral questions (as JSON array of objects with "question" and optional "answer")
3. 5 company-specific questions (as JSON array of objects with "question" and optional "answer")"#;

pub const INTERVIEW_SHAPE: &str = r#"{
  "technical": [{"question": "question text", "answer": "sample answer"}],
  "behavioral": [{"question": "question text", "answer": "sample answer"}],
  "companySpecific": [{"question": "question text", "answer": "sample answer"}]
}"#;

/// Career assistant persona. Free-text reply, no JSON.
pub const CHAT_PREAMBLE: &str = "You are a career AI assistant helping with job search and career development.
Provide helpful, personalized advice based on the user's context.";

/// Chat prompt. Replace `{preamble}`, `{history}` and `{message}`.
pub const CHAT_TEMPLATE: &str = "{preamble}
{history}
User message: {message}

Provide a helpful response.";
