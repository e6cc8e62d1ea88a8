//! LLM integration.
//!
//! Supports:
//! - **OpenAI**: the conversational model that drives red-flag resolution
//! - **Perplexity**: the web-search-grounded model used for employer checks
//!
//! Both are reached through the OpenAI-compatible `OpenAiProvider`.

pub mod openai;
pub mod provider;
pub mod reasoning;

pub use openai::OpenAiProvider;
pub use provider::*;
pub use reasoning::{Reasoning, ReasoningContext, RespondOutput, RespondResult, TokenUsage};

use std::sync::Arc;
use std::time::Duration;

use crate::error::LlmError;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAi,
    Perplexity,
}

impl LlmBackend {
    pub fn label(&self) -> &'static str {
        match self {
            LlmBackend::OpenAi => "openai",
            LlmBackend::Perplexity => "perplexity",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmBackend::OpenAi => "https://api.openai.com/v1",
            LlmBackend::Perplexity => "https://api.perplexity.ai",
        }
    }
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
    /// Overrides the backend's default base URL.
    pub base_url: Option<String>,
    pub timeout: Duration,
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let base_url = config
        .base_url
        .as_deref()
        .unwrap_or_else(|| config.backend.default_base_url());

    let provider = OpenAiProvider::new(
        config.backend.label(),
        base_url,
        config.api_key.clone(),
        config.model.clone(),
        config.timeout,
    )?;
    tracing::info!(
        backend = config.backend.label(),
        model = %config.model,
        "LLM provider ready"
    );
    Ok(Arc::new(provider))
}
