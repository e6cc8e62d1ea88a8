//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::chat::ChatConfig;
use crate::checks::distance::DEFAULT_DISTANCE_LIMIT_KM;
use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

const DEFAULT_BLACKLIST_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/1fMGqPIbihu_Lr2YpgeIGhl1ypTBP7_hitBebu-yiKls/export?format=csv";
const DEFAULT_ALLOWLIST_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/1FIZ9GabtynZvnaXAcqaTtUG3hM1M4mt95gFc3YgxC9k/export?format=csv";

const OPENAI_TIMEOUT: Duration = Duration::from_secs(15);
const PERPLEXITY_TIMEOUT: Duration = Duration::from_secs(15);

/// Service configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Conversational model for red-flag and pre-screening chats.
    pub openai: LlmConfig,
    pub chat: ChatConfig,
    pub google_maps_api_key: SecretString,
    /// Web-search model. `None` disables that verification source.
    pub perplexity: Option<LlmConfig>,
    pub blacklist_sheet_url: String,
    pub employer_allowlist_sheet_url: String,
    /// Lifetime of the blacklist and allowlist snapshots.
    pub reference_cache_ttl: Duration,
    pub distance_limit_km: f64,
    /// JSON alignment matrix; the built-in table is used when unset.
    pub alignment_matrix_path: Option<PathBuf>,
    pub cors_origins: Vec<String>,
    pub port: u16,
}

impl ServiceConfig {
    /// Read from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.into()));

        let openai = LlmConfig {
            backend: LlmBackend::OpenAi,
            api_key: SecretString::from(require("OPENAI_API_KEY")?),
            model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
            base_url: get("OPENAI_BASE_URL"),
            timeout: OPENAI_TIMEOUT,
        };

        let chat = ChatConfig {
            max_tokens: parse_or(&get, "OPENAI_MAX_TOKENS", 2000)?,
            ..ChatConfig::default()
        };

        let perplexity = get("PERPLEXITY_API_KEY").map(|key| LlmConfig {
            backend: LlmBackend::Perplexity,
            api_key: SecretString::from(key),
            model: get("PERPLEXITY_MODEL").unwrap_or_else(|| "sonar".to_string()),
            base_url: None,
            timeout: PERPLEXITY_TIMEOUT,
        });

        let distance_limit_km: f64 =
            parse_or(&get, "DISTANCE_LIMIT_KM", DEFAULT_DISTANCE_LIMIT_KM)?;
        if !(distance_limit_km.is_finite() && distance_limit_km > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "DISTANCE_LIMIT_KM".into(),
                message: "must be a positive number of kilometres".into(),
            });
        }

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            openai,
            chat,
            google_maps_api_key: SecretString::from(require("GOOGLE_MAPS_API_KEY")?),
            perplexity,
            blacklist_sheet_url: get("BLACKLIST_SHEET_URL")
                .unwrap_or_else(|| DEFAULT_BLACKLIST_SHEET_URL.to_string()),
            employer_allowlist_sheet_url: get("EMPLOYER_ALLOWLIST_SHEET_URL")
                .unwrap_or_else(|| DEFAULT_ALLOWLIST_SHEET_URL.to_string()),
            reference_cache_ttl: Duration::from_secs(parse_or(
                &get,
                "REFERENCE_CACHE_TTL_SECS",
                3600,
            )?),
            distance_limit_km,
            alignment_matrix_path: get("ALIGNMENT_MATRIX_PATH").map(PathBuf::from),
            cors_origins,
            port: parse_or(&get, "CHATFORM_PORT", 8000)?,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{}': {}", raw, e),
        }),
    }
}
