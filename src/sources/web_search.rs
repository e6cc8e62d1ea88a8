//! Web-search-grounded company legitimacy judgment.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

const JUDGE_TEMPERATURE: f32 = 0.0;
const JUDGE_MAX_TOKENS: u32 = 256;

const JUDGE_SYSTEM_PROMPT: &str = "\
You are assisting a licensed securities broker in Thailand to verify a client's declared employer from their trading account application.
Your only task is to decide whether the given employer is a legitimate business entity.

Use reliable public web sources such as:
- Google and Google Maps
- The company website and credible news sources
- Thailand DBD (Department of Business Development), DataForThai, SET and SEC registries
- Well-known international business directories (Bloomberg, Reuters, Crunchbase, LinkedIn company pages)

Guidelines:
- Answer YES only if there is clear, consistent evidence that the company exists as a real business or registered entity.
- If the name is too generic, ambiguous, or matches several different entities and you cannot tell which one is meant, answer NO.
- If there is strong evidence of a scam or a fake company, answer NO.
- When information is limited or conflicting, answer NO rather than guessing.
- Companies outside Thailand must plausibly have a presence in Thailand. A local bakery in rural America is NO; a Malaysian software company is YES.

Securities industry exclusion:
- Companies in the securities or brokerage industry must be NO (regulatory requirement).

Return a JSON object with exactly these fields:
{
  \"result\": \"YES or NO in uppercase\",
  \"explanation\": \"short explanation of the decision, referencing the evidence used\",
  \"closest_company_name\": \"closest matching company name found, or null\",
  \"closest_company_website\": \"main website of the closest match, or null\"
}";

/// Legitimacy verdict. Only `Yes` passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Yes,
    No,
}

/// Structured answer of the web-search model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyJudgment {
    pub result: Verdict,
    pub explanation: String,
    #[serde(default)]
    pub closest_company_name: Option<String>,
    #[serde(default)]
    pub closest_company_website: Option<String>,
}

impl CompanyJudgment {
    pub fn is_legitimate(&self) -> bool {
        self.result == Verdict::Yes
    }
}

/// Web-search-grounded structured-judgment capability.
#[async_trait]
pub trait WebJudge: Send + Sync {
    async fn judge_company(
        &self,
        company_name: &str,
        website: Option<&str>,
        additional_context: Option<&str>,
    ) -> Result<CompanyJudgment, LlmError>;
}

/// `WebJudge` backed by a search-augmented chat model.
pub struct WebSearchJudge {
    llm: Arc<dyn LlmProvider>,
}

impl WebSearchJudge {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    fn response_format() -> serde_json::Value {
        serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "schema": {
                    "type": "object",
                    "properties": {
                        "result": {"type": "string", "enum": ["YES", "NO"]},
                        "explanation": {"type": "string"},
                        "closest_company_name": {"type": ["string", "null"]},
                        "closest_company_website": {"type": ["string", "null"]}
                    },
                    "required": ["result", "explanation"],
                    "additionalProperties": false
                }
            }
        })
    }
}

fn user_prompt(company_name: &str, website: Option<&str>, additional_context: Option<&str>) -> String {
    let mut prompt = format!("Company name: \"{}\".", company_name);
    if let Some(site) = website.map(str::trim).filter(|s| !s.is_empty()) {
        prompt.push_str(&format!("\nTheir website is: {}.", site));
    }
    if let Some(context) = additional_context.map(str::trim).filter(|s| !s.is_empty()) {
        prompt.push_str(&format!("\nAdditional context: {}.", context));
    }
    prompt
}

/// Extract the JSON object from a reply that may be wrapped in prose or a code fence.
fn extract_json_object(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text.trim(),
    }
}

pub(crate) fn parse_judgment(provider: &str, content: &str) -> Result<CompanyJudgment, LlmError> {
    serde_json::from_str(extract_json_object(content)).map_err(|e| LlmError::InvalidResponse {
        provider: provider.to_string(),
        reason: format!("judgment did not match schema: {}", e),
    })
}

#[async_trait]
impl WebJudge for WebSearchJudge {
    async fn judge_company(
        &self,
        company_name: &str,
        website: Option<&str>,
        additional_context: Option<&str>,
    ) -> Result<CompanyJudgment, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(JUDGE_SYSTEM_PROMPT),
            ChatMessage::user(user_prompt(company_name, website, additional_context)),
        ])
        .with_temperature(JUDGE_TEMPERATURE)
        .with_max_tokens(JUDGE_MAX_TOKENS)
        .with_response_format(Self::response_format());

        let response = self.llm.complete(request).await?;
        let judgment = parse_judgment(self.llm.model_name(), &response.content)?;

        tracing::info!(
            company = company_name,
            result = ?judgment.result,
            matched = judgment.closest_company_name.as_deref().unwrap_or("-"),
            "Web search judgment"
        );
        Ok(judgment)
    }
}
