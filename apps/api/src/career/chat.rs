//! Career assistant chat. Free-text replies; recent turns are replayed in the prompt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::career::prompts::{CHAT_PREAMBLE, CHAT_TEMPLATE};
use crate::errors::AppError;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::TextGenerator;

/// How many earlier turns are replayed to the model.
pub const MAX_HISTORY_TURNS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

pub fn build_chat_prompt(message: &str, history: &[ChatTurn]) -> String {
    let recent = &history[history.len().saturating_sub(MAX_HISTORY_TURNS)..];
    let history = if recent.is_empty() {
        String::new()
    } else {
        let lines: Vec<String> = recent
            .iter()
            .map(|turn| {
                let speaker = match turn.role {
                    ChatRole::User => "User",
                    ChatRole::Assistant => "Assistant",
                };
                format!("{speaker}: {}", turn.content.trim())
            })
            .collect();
        format!("\nConversation so far:\n{}\n", lines.join("\n"))
    };

    fill_template(
        CHAT_TEMPLATE,
        &[
            ("preamble", CHAT_PREAMBLE),
            ("history", history.as_str()),
            ("message", message),
        ],
    )
}

pub async fn reply(
    message: &str,
    history: &[ChatTurn],
    llm: &dyn TextGenerator,
) -> Result<ChatReply, AppError> {
    let prompt = build_chat_prompt(message, history);
    let response = llm.generate_text(&prompt).await?;
    Ok(ChatReply {
        response,
        timestamp: Utc::now(),
    })
}
