//! AI-assisted conversations: red-flag resolution and pre-screening.

pub mod orchestrator;
pub mod prescreening;
pub mod prompts;

pub use orchestrator::{ChatOrchestrator, tools_for_rule};
pub use prescreening::PreScreeningChat;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::intake::{ConversationMessage, ConversationRole};
use crate::llm::ChatMessage;

/// Shown to the end user whenever a chat turn fails. The cause is only logged.
pub const APOLOGY: &str = "I'm sorry, but something went wrong. Please try again later.";

/// `error` of a failed reply. The real cause only goes to the log.
pub const INTERNAL_ERROR: &str = "Internal server error";

/// Completion parameters shared by every chat.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            max_tokens: 2000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    Error,
}

/// One assistant message returned across the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub role: ConversationRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub status: ReplyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatReply {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            role: ConversationRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            status: ReplyStatus::Success,
            error: None,
        }
    }

    pub fn apology() -> Self {
        Self {
            role: ConversationRole::Assistant,
            content: APOLOGY.to_string(),
            timestamp: Utc::now(),
            status: ReplyStatus::Error,
            error: Some(INTERNAL_ERROR.to_string()),
        }
    }
}

/// Caller-held history as completion messages.
pub(crate) fn history_messages(
    history: &[ConversationMessage],
) -> impl Iterator<Item = ChatMessage> + '_ {
    history.iter().map(|turn| match turn.role {
        ConversationRole::User => ChatMessage::user(turn.content.clone()),
        ConversationRole::Assistant => ChatMessage::assistant(turn.content.clone()),
    })
}
