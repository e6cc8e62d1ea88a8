//! Boundary service: validation plus the two chat flows.

use std::sync::Arc;

use crate::chat::{ChatOrchestrator, ChatReply, PreScreeningChat};
use crate::checks::{DistanceChecker, EmployerVerifier, NameBlacklist};
use crate::config::ServiceConfig;
use crate::error::Error;
use crate::intake::{ApplicationData, ConversationMessage, RedFlag};
use crate::llm::{LlmProvider, create_provider};
use crate::rules::{AlignmentMatrix, RuleEngine};
use crate::sources::{
    GoogleGeocoder, Geocoder, HttpCsvFetcher, TableFetcher, WebJudge, WebSearchJudge,
};
use crate::tools::ToolRegistry;
use crate::tools::builtin::VerifyEmployerTool;

/// External capabilities the service is built from.
pub struct Capabilities {
    pub tables: Arc<dyn TableFetcher>,
    pub geocoder: Arc<dyn Geocoder>,
    pub chat_llm: Arc<dyn LlmProvider>,
    pub judge: Option<Arc<dyn WebJudge>>,
}

/// Everything behind the HTTP surface. Holds no per-conversation state.
pub struct IntakeService {
    engine: RuleEngine,
    chat: ChatOrchestrator,
    prescreening: PreScreeningChat,
}

impl IntakeService {
    /// Wire the concrete HTTP-backed capabilities described by `config`.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, Error> {
        let judge = match &config.perplexity {
            Some(llm_config) => {
                let llm = create_provider(llm_config)?;
                Some(Arc::new(WebSearchJudge::new(llm)) as Arc<dyn WebJudge>)
            }
            None => {
                tracing::warn!("PERPLEXITY_API_KEY not set, web search verification disabled");
                None
            }
        };

        let capabilities = Capabilities {
            tables: Arc::new(HttpCsvFetcher::new()?),
            geocoder: Arc::new(GoogleGeocoder::new(config.google_maps_api_key.clone())?),
            chat_llm: create_provider(&config.openai)?,
            judge,
        };

        let matrix = match &config.alignment_matrix_path {
            Some(path) => AlignmentMatrix::load(path)?,
            None => AlignmentMatrix::default(),
        };

        Ok(Self::new(capabilities, config, matrix))
    }

    /// Build from already-constructed capabilities. Only the URLs, cache lifetime,
    /// distance limit and chat settings are read from `config`.
    pub fn new(capabilities: Capabilities, config: &ServiceConfig, matrix: AlignmentMatrix) -> Self {
        let matrix = Arc::new(matrix);
        let blacklist = Arc::new(NameBlacklist::new(
            capabilities.tables.clone(),
            config.blacklist_sheet_url.as_str(),
            config.reference_cache_ttl,
        ));
        let employer = Arc::new(EmployerVerifier::new(
            capabilities.tables,
            config.employer_allowlist_sheet_url.as_str(),
            config.reference_cache_ttl,
            capabilities.judge,
        ));
        let distance = Arc::new(DistanceChecker::new(capabilities.geocoder));

        let mut tools = ToolRegistry::new();
        tools.register(VerifyEmployerTool::new(employer.clone()));

        let engine = RuleEngine::new(
            blacklist,
            employer,
            distance,
            matrix.clone(),
            config.distance_limit_km,
        );
        let chat = ChatOrchestrator::new(
            capabilities.chat_llm.clone(),
            Arc::new(tools),
            matrix,
            config.chat.clone(),
        );
        let prescreening = PreScreeningChat::new(capabilities.chat_llm, config.chat.clone());

        Self {
            engine,
            chat,
            prescreening,
        }
    }

    pub async fn validate(&self, app: &ApplicationData) -> Vec<RedFlag> {
        self.engine.validate(app).await
    }

    pub async fn resolve_red_flag(
        &self,
        message: &str,
        red_flag: &RedFlag,
        app: &ApplicationData,
        history: &[ConversationMessage],
    ) -> ChatReply {
        self.chat
            .resolve_red_flag(message, red_flag, app, history)
            .await
    }

    pub async fn prescreening_reply(
        &self,
        message: &str,
        history: &[ConversationMessage],
    ) -> ChatReply {
        self.prescreening.reply(message, history).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ReplyStatus;
    use crate::intake::RuleId;
    use crate::test_support::{Scripted, ScriptedLlm, service_with};
    use crate::llm::ToolCall;

    #[tokio::test]
    async fn test_validate_uses_shared_reference_sheet() {
        let service = service_with(Arc::new(ScriptedLlm::new(vec![])));
        let app = ApplicationData {
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            company_name: Some("acme co".into()),
            ..Default::default()
        };

        let flags = service.validate(&app).await;
        let rules: Vec<RuleId> = flags.iter().map(|f| f.rule).collect();

        assert_eq!(rules, vec![RuleId::BlacklistCheck]);
    }

    #[tokio::test]
    async fn test_red_flag_chat_reaches_employer_tool() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Scripted::Tools(vec![ToolCall {
                id: "call_1".into(),
                name: "verify_employer".into(),
                arguments: serde_json::json!({"company_name": "Acme Co"}),
            }]),
            Scripted::Text("Your employer is verified.".into()),
        ]));
        let service = service_with(llm.clone());
        let app = ApplicationData {
            company_name: Some("Initech".into()),
            ..Default::default()
        };
        let flag = RedFlag::new(
            RuleId::EmployerVerificationCheck,
            "Could not verify employer 'Initech'",
            &["companyName"],
        );

        let reply = service
            .resolve_red_flag("I actually work at Acme Co", &flag, &app, &[])
            .await;

        assert_eq!(reply.status, ReplyStatus::Success);
        assert_eq!(reply.content, "Your employer is verified.");
        let seen = llm.seen();
        assert_eq!(seen[0].tool_names, vec!["verify_employer"]);
        let tool_output = seen[1]
            .messages
            .iter()
            .filter_map(|m| m.content.as_deref())
            .find(|c| c.starts_with("VERIFICATION"))
            .unwrap();
        assert!(tool_output.starts_with("VERIFICATION PASSED"));
    }

    #[tokio::test]
    async fn test_prescreening_failure_is_apology() {
        let service = service_with(Arc::new(ScriptedLlm::new(vec![Scripted::Fail])));

        let reply = service.prescreening_reply("hello", &[]).await;

        assert_eq!(reply.status, ReplyStatus::Error);
    }
}
