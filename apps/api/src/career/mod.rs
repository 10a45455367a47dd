// Job-seeker features: posting analysis, resume tailoring, interview prep, chat.
// Each feature builds a prompt, sends it through llm_client and returns the
// structured result. All LLM calls go through llm_client.

pub mod analyzer;
pub mod chat;
pub mod handlers;
pub mod interview;
pub mod prompts;
pub mod resume;
