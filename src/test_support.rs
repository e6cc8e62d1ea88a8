//! In-memory capability fakes shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{LlmError, SourceError};
use crate::llm::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, ToolCall,
    ToolCompletionRequest, ToolCompletionResponse,
};
use crate::sources::{
    CompanyJudgment, Coordinates, GeoStatus, GeocodeResponse, Geocoder, TableFetcher, TableRow,
    Verdict, WebJudge, parse_csv,
};

/// Table fetcher serving a fixed CSV document, or always failing.
pub struct StaticTable {
    csv: Option<String>,
    calls: AtomicUsize,
}

impl StaticTable {
    pub fn csv(text: &str) -> Self {
        Self {
            csv: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            csv: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TableFetcher for StaticTable {
    async fn fetch_table(&self, _url: &str) -> Result<Vec<TableRow>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.csv {
            Some(text) => parse_csv(text).map_err(|e| SourceError::Malformed {
                source_name: "static".into(),
                reason: e.to_string(),
            }),
            None => Err(SourceError::Request {
                source_name: "static".into(),
                reason: "connection refused".into(),
            }),
        }
    }
}

enum GeocodeScript {
    Resolves(Coordinates),
    Status(String),
    Unreachable,
}

/// Geocoder answering from a per-address script. Unknown addresses read as `ZERO_RESULTS`.
pub struct ScriptedGeocoder {
    script: HashMap<String, GeocodeScript>,
    calls: AtomicUsize,
}

impl ScriptedGeocoder {
    pub fn new() -> Self {
        Self {
            script: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn resolves(mut self, address: &str, at: Coordinates) -> Self {
        self.script
            .insert(address.to_string(), GeocodeScript::Resolves(at));
        self
    }

    pub fn status(mut self, address: &str, status: &str) -> Self {
        self.script
            .insert(address.to_string(), GeocodeScript::Status(status.to_string()));
        self
    }

    pub fn unreachable(mut self, address: &str) -> Self {
        self.script
            .insert(address.to_string(), GeocodeScript::Unreachable);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for ScriptedGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodeResponse, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.get(address) {
            Some(GeocodeScript::Resolves(at)) => Ok(GeocodeResponse {
                status: GeoStatus::ok(),
                location: Some(*at),
            }),
            Some(GeocodeScript::Status(code)) => Ok(GeocodeResponse {
                status: GeoStatus::new(code.clone()),
                location: None,
            }),
            Some(GeocodeScript::Unreachable) => Err(SourceError::Request {
                source_name: "geocoder".into(),
                reason: "timed out".into(),
            }),
            None => Ok(GeocodeResponse {
                status: GeoStatus::zero_results(),
                location: None,
            }),
        }
    }
}

/// Web judge returning one fixed verdict, or always failing.
pub struct CannedJudge {
    judgment: Option<CompanyJudgment>,
    seen: Mutex<Vec<(String, Option<String>, Option<String>)>>,
}

impl CannedJudge {
    pub fn verdict(result: Verdict, explanation: &str) -> Self {
        Self {
            judgment: Some(CompanyJudgment {
                result,
                explanation: explanation.to_string(),
                closest_company_name: None,
                closest_company_website: None,
            }),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            judgment: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// `(company_name, website, additional_context)` of every call.
    pub fn seen(&self) -> Vec<(String, Option<String>, Option<String>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebJudge for CannedJudge {
    async fn judge_company(
        &self,
        company_name: &str,
        website: Option<&str>,
        additional_context: Option<&str>,
    ) -> Result<CompanyJudgment, LlmError> {
        self.seen.lock().unwrap().push((
            company_name.to_string(),
            website.map(str::to_string),
            additional_context.map(str::to_string),
        ));
        self.judgment.clone().ok_or_else(|| LlmError::RequestFailed {
            provider: "canned".into(),
            reason: "search backend unavailable".into(),
        })
    }
}

/// One scripted model turn.
pub enum Scripted {
    Text(String),
    Tools(Vec<ToolCall>),
    Fail,
}

/// A request as the scripted model saw it.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub messages: Vec<crate::llm::ChatMessage>,
    /// Names of the tools offered; empty for plain completions.
    pub tool_names: Vec<String>,
    pub with_tools: bool,
}

/// LLM provider replaying a queue of scripted turns and recording requests.
pub struct ScriptedLlm {
    turns: Mutex<VecDeque<Scripted>>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl ScriptedLlm {
    pub fn new(turns: Vec<Scripted>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn text(reply: &str) -> Self {
        Self::new(vec![Scripted::Text(reply.to_string())])
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    fn next(&self) -> Scripted {
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Scripted::Fail)
    }

    fn failure() -> LlmError {
        LlmError::RequestFailed {
            provider: "scripted".into(),
            reason: "no scripted turn".into(),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.seen.lock().unwrap().push(SeenRequest {
            messages: request.messages,
            tool_names: Vec::new(),
            with_tools: false,
        });
        match self.next() {
            Scripted::Text(content) => Ok(CompletionResponse {
                content,
                input_tokens: 10,
                output_tokens: 5,
                finish_reason: FinishReason::Stop,
            }),
            Scripted::Tools(_) | Scripted::Fail => Err(Self::failure()),
        }
    }

    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse, LlmError> {
        self.seen.lock().unwrap().push(SeenRequest {
            messages: request.messages,
            tool_names: request.tools.iter().map(|t| t.name.clone()).collect(),
            with_tools: true,
        });
        match self.next() {
            Scripted::Text(content) => Ok(ToolCompletionResponse {
                content: Some(content),
                tool_calls: Vec::new(),
                input_tokens: 10,
                output_tokens: 5,
                finish_reason: FinishReason::Stop,
            }),
            Scripted::Tools(tool_calls) => Ok(ToolCompletionResponse {
                content: None,
                tool_calls,
                input_tokens: 10,
                output_tokens: 5,
                finish_reason: FinishReason::ToolUse,
            }),
            Scripted::Fail => Err(Self::failure()),
        }
    }
}

/// Reference sheet served for both the blacklist and the employer allowlist.
pub const REFERENCE_CSV: &str = "First_name,Last_name,company_name\nJane,Doe,Acme Co\n";

/// A service over in-memory capabilities with default settings.
pub fn service_with(llm: std::sync::Arc<ScriptedLlm>) -> crate::service::IntakeService {
    use std::sync::Arc;

    let config = crate::config::ServiceConfig::from_lookup(|key: &str| match key {
        "OPENAI_API_KEY" => Some("sk-test".to_string()),
        "GOOGLE_MAPS_API_KEY" => Some("maps-test".to_string()),
        _ => None,
    })
    .unwrap();
    let capabilities = crate::service::Capabilities {
        tables: Arc::new(StaticTable::csv(REFERENCE_CSV)),
        geocoder: Arc::new(ScriptedGeocoder::new()),
        chat_llm: llm,
        judge: Some(Arc::new(CannedJudge::verdict(Verdict::No, "No public record"))),
    };
    crate::service::IntakeService::new(
        capabilities,
        &config,
        crate::rules::AlignmentMatrix::default(),
    )
}
