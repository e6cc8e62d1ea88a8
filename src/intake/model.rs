//! Application, red-flag and conversation types.
//!
//! Wire names are camelCase to match the form payloads the frontend submits.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Form field names as they appear in `RedFlag::affected_fields`.
pub mod fields {
    pub const FIRST_NAME: &str = "firstName";
    pub const LAST_NAME: &str = "lastName";
    pub const CURRENT_ADDRESS: &str = "currentAddress";
    pub const COMPANY_ADDRESS: &str = "companyAddress";
    pub const COMPANY_NAME: &str = "companyName";
    pub const COMPANY_WEBSITE: &str = "companyWebsite";
    pub const EMPLOYMENT_TYPE: &str = "employmentType";
    pub const SOURCE_OF_FUNDS: &str = "sourceOfFunds";
    pub const PRE_SCREENING: &str = "preScreening";
}

/// The applicant's declared facts. Supplied fresh on every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationData {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub current_address: Option<String>,
    pub company_address: Option<String>,
    pub occupation: Option<String>,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub company_website: Option<String>,
    pub employment_type: Option<String>,
    pub source_of_funds: Option<String>,
    pub monthly_income: Option<f64>,
    pub income_source: Option<String>,
    pub current_assets: Option<f64>,
    pub country_income_sources: Option<String>,
    pub pre_screening: Option<PreScreening>,
}

/// Answer to the political-exposure pre-screening question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreScreening {
    /// `"yes"` or `"no"`.
    pub response: String,
    pub explanation: Option<String>,
    pub chat_history: Vec<ConversationMessage>,
}

impl PreScreening {
    /// Whether the applicant answered yes.
    pub fn is_yes(&self) -> bool {
        self.response.trim().eq_ignore_ascii_case("yes")
    }
}

/// Returns the trimmed value when it is present and not blank.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Identifier of a validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    BlacklistCheck,
    EmployerVerificationCheck,
    DistanceCheck,
    PoliticalExposureCheck,
    SourceOfFundsAlignmentCheck,
}

impl RuleId {
    /// Every rule, in the order flags are presented to the caller.
    pub const PRIORITY: [RuleId; 5] = [
        RuleId::BlacklistCheck,
        RuleId::EmployerVerificationCheck,
        RuleId::DistanceCheck,
        RuleId::PoliticalExposureCheck,
        RuleId::SourceOfFundsAlignmentCheck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::BlacklistCheck => "blacklist_check",
            RuleId::EmployerVerificationCheck => "employer_verification_check",
            RuleId::DistanceCheck => "distance_check",
            RuleId::PoliticalExposureCheck => "political_exposure_check",
            RuleId::SourceOfFundsAlignmentCheck => "source_of_funds_alignment_check",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A machine-raised concern about one or more application fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedFlag {
    pub rule: RuleId,
    pub message: String,
    pub affected_fields: Vec<String>,
    /// Rule-specific diagnostics, only read back when building chat prompts.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub debug_info: serde_json::Value,
}

impl RedFlag {
    pub fn new(rule: RuleId, message: impl Into<String>, affected: &[&str]) -> Self {
        let mut affected_fields: Vec<String> = Vec::with_capacity(affected.len());
        for field in affected {
            if !affected_fields.iter().any(|f| f == field) {
                affected_fields.push((*field).to_string());
            }
        }
        Self {
            rule,
            message: message.into(),
            affected_fields,
            debug_info: serde_json::Value::Null,
        }
    }

    pub fn with_debug_info(mut self, debug_info: serde_json::Value) -> Self {
        self.debug_info = debug_info;
        self
    }
}

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    User,
    Assistant,
}

/// One turn of caller-held chat history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: ConversationRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ConversationRole::User,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ConversationRole::Assistant,
            content: content.into(),
            timestamp: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_ids_serialize_as_snake_case() {
        let json = serde_json::to_string(&RuleId::SourceOfFundsAlignmentCheck).unwrap();
        assert_eq!(json, "\"source_of_funds_alignment_check\"");
        let parsed: RuleId = serde_json::from_str("\"blacklist_check\"").unwrap();
        assert_eq!(parsed, RuleId::BlacklistCheck);
    }

    #[test]
    fn application_data_accepts_camel_case_payload() {
        let app: ApplicationData = serde_json::from_value(serde_json::json!({
            "firstName": "Jane",
            "companyName": "Acme Co",
            "monthlyIncome": 45000.0,
            "preScreening": {"response": "yes", "explanation": "Former mayor"}
        }))
        .unwrap();

        assert_eq!(app.first_name.as_deref(), Some("Jane"));
        assert_eq!(app.company_name.as_deref(), Some("Acme Co"));
        assert_eq!(app.monthly_income, Some(45000.0));
        let pre = app.pre_screening.unwrap();
        assert!(pre.is_yes());
        assert!(pre.chat_history.is_empty());
    }

    #[test]
    fn red_flag_dedups_affected_fields_in_order() {
        let flag = RedFlag::new(
            RuleId::DistanceCheck,
            "far",
            &[fields::CURRENT_ADDRESS, fields::COMPANY_ADDRESS, fields::CURRENT_ADDRESS],
        );
        assert_eq!(flag.affected_fields, vec!["currentAddress", "companyAddress"]);
    }

    #[test]
    fn red_flag_omits_null_debug_info() {
        let flag = RedFlag::new(RuleId::BlacklistCheck, "listed", &[fields::FIRST_NAME]);
        let json = serde_json::to_value(&flag).unwrap();
        assert!(json.get("debugInfo").is_none());
        assert_eq!(json["affectedFields"][0], "firstName");
    }

    #[test]
    fn non_blank_trims_and_filters() {
        assert_eq!(non_blank(&Some("  Acme ".into())), Some("Acme"));
        assert_eq!(non_blank(&Some("   ".into())), None);
        assert_eq!(non_blank(&None), None);
    }
}
