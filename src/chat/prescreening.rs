//! Pre-screening conversation about political exposure and US-person status.
//!
//! Runs before the form is submitted and is not tied to any red flag.

use std::sync::Arc;

use tracing::{error, info};

use crate::chat::prompts::PRESCREENING_PROMPT;
use crate::chat::{ChatConfig, ChatReply, history_messages};
use crate::error::ChatError;
use crate::intake::ConversationMessage;
use crate::llm::{ChatMessage, LlmProvider, Reasoning, RespondResult};

pub struct PreScreeningChat {
    reasoning: Reasoning,
}

impl PreScreeningChat {
    pub fn new(llm: Arc<dyn LlmProvider>, config: ChatConfig) -> Self {
        Self {
            reasoning: Reasoning::new(llm, config.temperature, config.max_tokens),
        }
    }

    pub async fn respond(
        &self,
        message: &str,
        history: &[ConversationMessage],
    ) -> Result<String, ChatError> {
        info!(history = history.len(), "Pre-screening turn");

        let mut messages = vec![ChatMessage::system(PRESCREENING_PROMPT)];
        messages.extend(history_messages(history));
        messages.push(ChatMessage::user(message));

        let output = self.reasoning.respond(messages).await?;
        let text = match output.result {
            RespondResult::Text(text) => Some(text),
            RespondResult::ToolCalls { content, .. } => content,
        };
        text.filter(|t| !t.trim().is_empty())
            .ok_or(ChatError::EmptyReply {
                stage: "pre-screening",
            })
    }

    pub async fn reply(&self, message: &str, history: &[ConversationMessage]) -> ChatReply {
        match self.respond(message, history).await {
            Ok(content) => ChatReply::success(content),
            Err(e) => {
                error!(error = %e, "Pre-screening chat failed");
                ChatReply::apology()
            }
        }
    }
}
