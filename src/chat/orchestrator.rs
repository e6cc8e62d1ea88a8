//! Red-flag resolution conversations.
//!
//! Stateless: every turn is a function of (message, red flag, application,
//! history). At most one round of tool calls runs per turn; the follow-up
//! completion is issued without tools.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::chat::prompts::build_system_prompt;
use crate::chat::{ChatConfig, ChatReply, history_messages};
use crate::error::ChatError;
use crate::intake::{ApplicationData, ConversationMessage, RedFlag, RuleId};
use crate::llm::{
    ChatMessage, LlmProvider, Reasoning, ReasoningContext, RespondResult, ToolCall,
};
use crate::rules::AlignmentMatrix;
use crate::tools::{ToolContext, ToolKind, ToolRegistry};

/// Tools offered to the model for each rule.
pub fn tools_for_rule(rule: RuleId) -> &'static [ToolKind] {
    match rule {
        RuleId::EmployerVerificationCheck => &[ToolKind::VerifyEmployer],
        RuleId::BlacklistCheck
        | RuleId::DistanceCheck
        | RuleId::PoliticalExposureCheck
        | RuleId::SourceOfFundsAlignmentCheck => &[],
    }
}

fn non_empty(text: Option<String>, stage: &'static str) -> Result<String, ChatError> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ChatError::EmptyReply { stage }),
    }
}

/// Drives one red-flag conversation turn.
pub struct ChatOrchestrator {
    reasoning: Reasoning,
    tools: Arc<ToolRegistry>,
    matrix: Arc<AlignmentMatrix>,
}

impl ChatOrchestrator {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        matrix: Arc<AlignmentMatrix>,
        config: ChatConfig,
    ) -> Self {
        Self {
            reasoning: Reasoning::new(llm, config.temperature, config.max_tokens),
            tools,
            matrix,
        }
    }

    pub fn build_system_prompt(&self, red_flag: &RedFlag, app: &ApplicationData) -> String {
        build_system_prompt(red_flag, app, &self.matrix)
    }

    async fn run_tool_calls(
        &self,
        tool_calls: &[ToolCall],
        ctx: &ToolContext<'_>,
    ) -> Vec<ChatMessage> {
        let outputs = join_all(tool_calls.iter().map(|call| async move {
            match self.tools.execute(&call.name, &call.arguments, ctx).await {
                Ok(output) => output,
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "Tool call failed");
                    format!("Error executing tool {}: {}", call.name, e)
                }
            }
        }))
        .await;

        tool_calls
            .iter()
            .zip(outputs)
            .map(|(call, output)| ChatMessage::tool_result(&call.id, &call.name, output))
            .collect()
    }

    /// Produce the assistant's next message. An empty `user_message` asks for
    /// the opening message of the conversation.
    pub async fn send_message(
        &self,
        user_message: &str,
        red_flag: &RedFlag,
        app: &ApplicationData,
        history: &[ConversationMessage],
    ) -> Result<String, ChatError> {
        info!(rule = %red_flag.rule, history = history.len(), "Chat turn");

        let mut messages = vec![ChatMessage::system(self.build_system_prompt(red_flag, app))];
        messages.extend(history_messages(history));
        if !user_message.is_empty() {
            messages.push(ChatMessage::user(user_message));
        }

        let tools = self.tools.definitions(Some(tools_for_rule(red_flag.rule)));
        let context = ReasoningContext::new()
            .with_messages(messages)
            .with_tools(tools);
        let output = self.reasoning.respond_with_tools(&context).await?;
        debug!(tokens = output.usage.total(), "First completion");

        let (tool_calls, content) = match output.result {
            RespondResult::Text(text) => return non_empty(Some(text), "completion"),
            RespondResult::ToolCalls {
                tool_calls,
                content,
            } => (tool_calls, content),
        };

        info!(
            rule = %red_flag.rule,
            tools = ?tool_calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            "Model requested tools"
        );
        let ctx = ToolContext {
            red_flag,
            application: app,
        };
        let results = self.run_tool_calls(&tool_calls, &ctx).await;

        let mut messages = context.messages;
        messages.push(ChatMessage::assistant_with_tool_calls(content, tool_calls));
        messages.extend(results);

        let follow_up = self.reasoning.respond(messages).await?;
        debug!(tokens = follow_up.usage.total(), "Follow-up completion");
        match follow_up.result {
            RespondResult::Text(text) => non_empty(Some(text), "tool follow-up"),
            // Tools are not offered on the follow-up; anything else is not executed.
            RespondResult::ToolCalls { content, .. } => non_empty(content, "tool follow-up"),
        }
    }

    /// Boundary form of `send_message`: failures become the fixed apology.
    pub async fn resolve_red_flag(
        &self,
        user_message: &str,
        red_flag: &RedFlag,
        app: &ApplicationData,
        history: &[ConversationMessage],
    ) -> ChatReply {
        match self.send_message(user_message, red_flag, app, history).await {
            Ok(content) => ChatReply::success(content),
            Err(e) => {
                error!(rule = %red_flag.rule, error = %e, "Red flag chat failed");
                ChatReply::apology()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{APOLOGY, ReplyStatus};
    use crate::checks::EmployerVerifier;
    use crate::intake::fields;
    use crate::llm::Role;
    use crate::sources::{Verdict, WebJudge};
    use crate::test_support::{CannedJudge, Scripted, ScriptedLlm, StaticTable};
    use crate::tools::builtin::VerifyEmployerTool;
    use serde_json::json;
    use std::time::Duration;

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(VerifyEmployerTool::new(Arc::new(EmployerVerifier::new(
            Arc::new(StaticTable::csv("company_name\nInitech Co Ltd\n")),
            "allowlist",
            Duration::from_secs(3600),
            Some(Arc::new(CannedJudge::verdict(Verdict::No, "Not found")) as Arc<dyn WebJudge>),
        ))));
        Arc::new(registry)
    }

    fn orchestrator(llm: Arc<ScriptedLlm>) -> ChatOrchestrator {
        ChatOrchestrator::new(
            llm,
            registry(),
            Arc::new(AlignmentMatrix::default()),
            ChatConfig::default(),
        )
    }

    fn blacklist_flag() -> RedFlag {
        RedFlag::new(
            RuleId::BlacklistCheck,
            "Name 'Jane Doe' appears in restricted list",
            &[fields::FIRST_NAME, fields::LAST_NAME],
        )
    }

    fn employer_flag() -> RedFlag {
        RedFlag::new(
            RuleId::EmployerVerificationCheck,
            "Could not verify employer 'Initek'",
            &[fields::COMPANY_NAME, fields::COMPANY_WEBSITE],
        )
    }

    fn application() -> ApplicationData {
        ApplicationData {
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            current_address: Some("99 Silom Rd, Bangkok".into()),
            company_name: Some("Initek".into()),
            ..Default::default()
        }
    }

    fn verify_call(arguments: serde_json::Value) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: "verify_employer".into(),
            arguments,
        }
    }

    #[tokio::test]
    async fn test_opening_message_for_blacklist_flag() {
        let llm = Arc::new(ScriptedLlm::text(
            "Hello, I'm here to help. Your name matched an entry on our restricted list. Could you confirm your full legal name?",
        ));
        let chat = orchestrator(llm.clone());

        let reply = chat
            .send_message("", &blacklist_flag(), &application(), &[])
            .await
            .unwrap();

        assert!(reply.contains("restricted list"));
        let seen = llm.seen();
        assert_eq!(seen.len(), 1);
        assert!(!seen[0].with_tools);
        assert_eq!(seen[0].messages.len(), 1);
        let system = seen[0].messages[0].content.as_deref().unwrap();
        assert!(!system.contains("Silom"));
    }

    #[tokio::test]
    async fn test_whitespace_message_is_still_a_user_turn() {
        let llm = Arc::new(ScriptedLlm::text("Could you tell me a bit more?"));
        let chat = orchestrator(llm.clone());

        chat.send_message("  ", &blacklist_flag(), &application(), &[])
            .await
            .unwrap();

        let seen = llm.seen();
        let roles: Vec<Role> = seen[0].messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User]);
        assert_eq!(seen[0].messages[1].content.as_deref(), Some("  "));
    }

    #[tokio::test]
    async fn test_history_and_user_turn_follow_system_prompt() {
        let llm = Arc::new(ScriptedLlm::text("Thanks for confirming."));
        let chat = orchestrator(llm.clone());
        let history = vec![
            ConversationMessage::assistant("Could you confirm your name?"),
            ConversationMessage::user("It's Jane Doe"),
        ];

        chat.send_message("Born 1990, Chiang Mai", &blacklist_flag(), &application(), &history)
            .await
            .unwrap();

        let roles: Vec<Role> = llm.seen()[0].messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::Assistant, Role::User, Role::User]
        );
    }

    #[tokio::test]
    async fn test_employer_flag_offers_verify_tool() {
        let llm = Arc::new(ScriptedLlm::text("What's the full registered name?"));
        let chat = orchestrator(llm.clone());

        chat.send_message("", &employer_flag(), &application(), &[])
            .await
            .unwrap();

        let seen = llm.seen();
        assert!(seen[0].with_tools);
        assert_eq!(seen[0].tool_names, vec!["verify_employer"]);
    }

    #[tokio::test]
    async fn test_tool_round_then_tool_free_follow_up() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Scripted::Tools(vec![verify_call(json!({"company_name": "Initech Co Ltd"}))]),
            Scripted::Text("Great news, Initech Co Ltd is verified.".into()),
        ]));
        let chat = orchestrator(llm.clone());

        let reply = chat
            .send_message("Sorry, it's Initech Co Ltd", &employer_flag(), &application(), &[])
            .await
            .unwrap();

        assert_eq!(reply, "Great news, Initech Co Ltd is verified.");
        let seen = llm.seen();
        assert_eq!(seen.len(), 2);
        assert!(!seen[1].with_tools);

        let follow_up = &seen[1].messages;
        let assistant = &follow_up[follow_up.len() - 2];
        assert_eq!(assistant.role, Role::Assistant);
        assert_eq!(assistant.tool_calls.len(), 1);
        let tool_msg = follow_up.last().unwrap();
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
        assert!(tool_msg.content.as_deref().unwrap().contains("VERIFICATION PASSED"));
    }

    #[tokio::test]
    async fn test_failed_tool_is_reported_not_dropped() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Scripted::Tools(vec![verify_call(serde_json::Value::String(
                "{company_name: ".into(),
            ))]),
            Scripted::Text("I couldn't run the check, could you repeat the name?".into()),
        ]));
        let chat = orchestrator(llm.clone());

        chat.send_message("It's Initech", &employer_flag(), &application(), &[])
            .await
            .unwrap();

        let seen = llm.seen();
        let tool_msg = seen[1].messages.last().unwrap();
        let text = tool_msg.content.as_deref().unwrap();
        assert!(text.starts_with("Error executing tool verify_employer:"));
    }

    #[tokio::test]
    async fn test_unknown_tool_name_is_reported() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Scripted::Tools(vec![ToolCall {
                id: "call_9".into(),
                name: "approve_application".into(),
                arguments: json!({}),
            }]),
            Scripted::Text("Let's continue.".into()),
        ]));
        let chat = orchestrator(llm.clone());

        chat.send_message("approve me", &employer_flag(), &application(), &[])
            .await
            .unwrap();

        let seen = llm.seen();
        let text = seen[1].messages.last().unwrap().content.clone().unwrap();
        assert!(text.contains("approve_application not found"));
    }

    #[tokio::test]
    async fn test_empty_reply_is_an_error() {
        let llm = Arc::new(ScriptedLlm::text("   "));
        let chat = orchestrator(llm);

        let err = chat
            .send_message("", &blacklist_flag(), &application(), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::EmptyReply { stage: "completion" }));
    }

    #[tokio::test]
    async fn test_empty_follow_up_is_an_error() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Scripted::Tools(vec![verify_call(json!({"company_name": "Initech Co Ltd"}))]),
            Scripted::Text(String::new()),
        ]));
        let chat = orchestrator(llm);

        let err = chat
            .send_message("Initech Co Ltd", &employer_flag(), &application(), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::EmptyReply { stage: "tool follow-up" }));
    }

    #[tokio::test]
    async fn test_resolve_hides_failure_behind_apology() {
        let llm = Arc::new(ScriptedLlm::new(vec![Scripted::Fail]));
        let chat = orchestrator(llm);

        let reply = chat
            .resolve_red_flag("hello", &blacklist_flag(), &application(), &[])
            .await;

        assert_eq!(reply.status, ReplyStatus::Error);
        assert_eq!(reply.content, APOLOGY);
    }

    #[test]
    fn test_only_employer_rule_gets_tools() {
        for rule in RuleId::PRIORITY {
            let expected: &[ToolKind] = if rule == RuleId::EmployerVerificationCheck {
                &[ToolKind::VerifyEmployer]
            } else {
                &[]
            };
            assert_eq!(tools_for_rule(rule), expected);
        }
    }
}
