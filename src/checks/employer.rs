//! Employer legitimacy verification across independent sources.
//!
//! Sources run concurrently and are OR-ed: one credible confirmation is
//! enough. A source that errors counts as that source failing.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::sources::{CachedSet, CompanyJudgment, TableFetcher, WebJudge};

const COMPANY_NAME_COLUMN: &str = "company_name";

/// A verification source, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VerificationSource {
    #[serde(rename = "google_sheet")]
    Allowlist,
    #[serde(rename = "perplexity")]
    WebSearch,
}

impl VerificationSource {
    pub const PRIORITY: [VerificationSource; 2] =
        [VerificationSource::Allowlist, VerificationSource::WebSearch];

    pub fn label(&self) -> &'static str {
        match self {
            VerificationSource::Allowlist => "Internal allowlist",
            VerificationSource::WebSearch => "AI web search",
        }
    }
}

/// Which source confirmed the employer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassedBy {
    #[serde(rename = "google_sheet")]
    Allowlist,
    #[serde(rename = "perplexity")]
    WebSearch,
    #[serde(rename = "none")]
    None,
}

impl PassedBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PassedBy::Allowlist => "google_sheet",
            PassedBy::WebSearch => "perplexity",
            PassedBy::None => "none",
        }
    }
}

impl From<VerificationSource> for PassedBy {
    fn from(source: VerificationSource) -> Self {
        match source {
            VerificationSource::Allowlist => PassedBy::Allowlist,
            VerificationSource::WebSearch => PassedBy::WebSearch,
        }
    }
}

/// Outcome of one verification call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub passed: bool,
    pub checks: BTreeMap<VerificationSource, bool>,
    pub passed_by: PassedBy,
    /// Present whenever the web-search judgment returned a verdict.
    #[serde(
        rename = "perplexity_details",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub web_search_details: Option<CompanyJudgment>,
}

impl VerificationResult {
    /// OR across sources; `passed_by` is the first passing source in priority order.
    pub fn aggregate(
        checks: BTreeMap<VerificationSource, bool>,
        web_search_details: Option<CompanyJudgment>,
    ) -> Self {
        let passed_by = VerificationSource::PRIORITY
            .iter()
            .find(|source| checks.get(source).copied().unwrap_or(false))
            .map(|source| PassedBy::from(*source))
            .unwrap_or(PassedBy::None);

        Self {
            passed: passed_by != PassedBy::None,
            checks,
            passed_by,
            web_search_details,
        }
    }

    pub fn source_passed(&self, source: VerificationSource) -> bool {
        self.checks.get(&source).copied().unwrap_or(false)
    }
}

/// Verifies employers against the allowlist sheet and an optional web-search judge.
pub struct EmployerVerifier {
    fetcher: Arc<dyn TableFetcher>,
    allowlist_url: String,
    allowlist: CachedSet<String>,
    judge: Option<Arc<dyn WebJudge>>,
}

impl EmployerVerifier {
    pub fn new(
        fetcher: Arc<dyn TableFetcher>,
        allowlist_url: impl Into<String>,
        ttl: Duration,
        judge: Option<Arc<dyn WebJudge>>,
    ) -> Self {
        Self {
            fetcher,
            allowlist_url: allowlist_url.into(),
            allowlist: CachedSet::new("employer_allowlist", ttl),
            judge,
        }
    }

    async fn fetch_allowlist(&self) -> Result<HashSet<String>, SourceError> {
        let rows = self.fetcher.fetch_table(&self.allowlist_url).await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get(COMPANY_NAME_COLUMN))
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect())
    }

    async fn check_allowlist(&self, company_name: &str) -> bool {
        self.allowlist.refresh_with(|| self.fetch_allowlist()).await;
        let listed = self
            .allowlist
            .contains(&company_name.trim().to_lowercase())
            .await;
        tracing::debug!(company = company_name, listed, "Allowlist check");
        listed
    }

    async fn check_web_search(
        &self,
        company_name: &str,
        website: Option<&str>,
        additional_context: Option<&str>,
    ) -> (bool, Option<CompanyJudgment>) {
        let Some(judge) = &self.judge else {
            tracing::debug!("Web search judge not configured, source counts as failed");
            return (false, None);
        };

        match judge
            .judge_company(company_name, website, additional_context)
            .await
        {
            Ok(judgment) => (judgment.is_legitimate(), Some(judgment)),
            Err(e) => {
                tracing::warn!(company = company_name, error = %e, "Web search judgment failed");
                (false, None)
            }
        }
    }

    pub async fn verify_employer(
        &self,
        company_name: &str,
        website: Option<&str>,
        additional_context: Option<&str>,
    ) -> VerificationResult {
        let (allowlisted, (web_passed, judgment)) = tokio::join!(
            self.check_allowlist(company_name),
            self.check_web_search(company_name, website, additional_context)
        );

        let checks = BTreeMap::from([
            (VerificationSource::Allowlist, allowlisted),
            (VerificationSource::WebSearch, web_passed),
        ]);
        let result = VerificationResult::aggregate(checks, judgment);

        tracing::info!(
            company = company_name,
            passed = result.passed,
            passed_by = result.passed_by.as_str(),
            "Employer verification"
        );
        result
    }
}
