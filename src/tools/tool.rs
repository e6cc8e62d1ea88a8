//! Tool kinds and the execution context handed to them.

use std::fmt;

use crate::error::ToolError;
use crate::intake::{ApplicationData, RedFlag};
use crate::llm::ToolDefinition;
use crate::tools::builtin::VerifyEmployerTool;

/// Every tool the model can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToolKind {
    VerifyEmployer,
}

impl ToolKind {
    pub const ALL: [ToolKind; 1] = [ToolKind::VerifyEmployer];

    /// Function name exposed to the model.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::VerifyEmployer => "verify_employer",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a tool may read about the conversation it runs in.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    pub red_flag: &'a RedFlag,
    pub application: &'a ApplicationData,
}

/// A registered tool instance.
pub enum Tool {
    VerifyEmployer(VerifyEmployerTool),
}

impl Tool {
    pub fn kind(&self) -> ToolKind {
        match self {
            Tool::VerifyEmployer(_) => ToolKind::VerifyEmployer,
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        let (description, parameters) = match self {
            Tool::VerifyEmployer(tool) => (tool.description(), tool.parameters_schema()),
        };
        ToolDefinition {
            name: self.kind().name().to_string(),
            description: description.to_string(),
            parameters,
        }
    }

    /// Run the tool and return the text the model reads back.
    pub async fn execute(
        &self,
        params: &serde_json::Value,
        ctx: &ToolContext<'_>,
    ) -> Result<String, ToolError> {
        match self {
            Tool::VerifyEmployer(tool) => tool.execute(params, ctx).await,
        }
    }
}

impl From<VerifyEmployerTool> for Tool {
    fn from(tool: VerifyEmployerTool) -> Self {
        Tool::VerifyEmployer(tool)
    }
}

/// Extract a required, non-blank string parameter.
pub fn require_str<'a>(
    kind: ToolKind,
    params: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str, ToolError> {
    if !params.is_object() {
        return Err(ToolError::InvalidParameters {
            name: kind.name().to_string(),
            reason: "arguments must be a JSON object".into(),
        });
    }
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolError::InvalidParameters {
            name: kind.name().to_string(),
            reason: format!("missing '{}' parameter", key),
        })
}

/// Extract an optional string parameter; blank and null read as absent.
pub fn optional_str<'a>(params: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names_round_trip() {
        assert_eq!(ToolKind::from_name("verify_employer"), Some(ToolKind::VerifyEmployer));
        assert_eq!(ToolKind::from_name("verify_employers"), None);
        assert_eq!(ToolKind::from_name(""), None);
    }

    #[test]
    fn test_require_str() {
        let params = json!({"company_name": "  Acme  ", "blank": " "});
        assert_eq!(
            require_str(ToolKind::VerifyEmployer, &params, "company_name").unwrap(),
            "Acme"
        );
        assert!(require_str(ToolKind::VerifyEmployer, &params, "blank").is_err());
        assert!(require_str(ToolKind::VerifyEmployer, &params, "absent").is_err());
    }

    #[test]
    fn test_unparsed_arguments_are_rejected() {
        let raw = serde_json::Value::String("{company_name: Acme".into());
        let err = require_str(ToolKind::VerifyEmployer, &raw, "company_name").unwrap_err();
        assert!(err.to_string().contains("JSON object"));
    }

    #[test]
    fn test_optional_str_treats_null_as_absent() {
        let params = json!({"company_website": null, "additional_context": "HQ in Rayong"});
        assert_eq!(optional_str(&params, "company_website"), None);
        assert_eq!(optional_str(&params, "additional_context"), Some("HQ in Rayong"));
    }
}
