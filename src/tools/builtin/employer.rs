//! Employer verification tool.
//!
//! Lets the model re-run employer verification mid-conversation, typically
//! after the applicant corrects or clarifies the company name.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::checks::{EmployerVerifier, VerificationResult, VerificationSource};
use crate::error::ToolError;
use crate::intake::non_blank;
use crate::tools::tool::{ToolContext, ToolKind, optional_str, require_str};

/// Tool wrapping `EmployerVerifier`.
pub struct VerifyEmployerTool {
    verifier: Arc<EmployerVerifier>,
}

impl VerifyEmployerTool {
    pub fn new(verifier: Arc<EmployerVerifier>) -> Self {
        Self { verifier }
    }

    pub fn description(&self) -> &'static str {
        "Verify whether a company/employer is legitimate by checking multiple sources \
         (internal allowlist and AI web search). Use this when you need to check that a \
         company name is real or when the applicant provides a corrected company name."
    }

    pub fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "company_name": {
                    "type": "string",
                    "description": "The company name to verify (e.g. 'SCB Bank', 'Google', 'บริษัท อัลฟ่า ยูนิเทรด จำกัด')"
                },
                "company_website": {
                    "type": "string",
                    "description": "Optional company website URL for additional verification context"
                },
                "additional_context": {
                    "type": "string",
                    "description": "Optional details from the applicant, such as industry, location or a registered Thai name"
                }
            },
            "required": ["company_name"],
            "additionalProperties": false
        })
    }

    pub async fn execute(
        &self,
        params: &serde_json::Value,
        ctx: &ToolContext<'_>,
    ) -> Result<String, ToolError> {
        let company_name = require_str(ToolKind::VerifyEmployer, params, "company_name")?;
        let additional_context = optional_str(params, "additional_context");

        // Same company as declared: fall back to the declared website.
        let website = optional_str(params, "company_website").or_else(|| {
            non_blank(&ctx.application.company_name)
                .filter(|declared| declared.eq_ignore_ascii_case(company_name))
                .and_then(|_| non_blank(&ctx.application.company_website))
        });

        let result = self
            .verifier
            .verify_employer(company_name, website, additional_context)
            .await;
        Ok(format_result(&result))
    }
}

fn pass_mark(passed: bool) -> &'static str {
    if passed { "Pass" } else { "Fail" }
}

/// Human-readable breakdown the model reads back.
pub fn format_result(result: &VerificationResult) -> String {
    let mut out = String::new();

    if result.passed {
        let verified_by = VerificationSource::PRIORITY
            .iter()
            .find(|source| result.source_passed(**source))
            .map(|source| source.label())
            .unwrap_or("none");
        let _ = writeln!(out, "VERIFICATION PASSED\n");
        let _ = writeln!(out, "The company was verified by: {}", verified_by);

        if let Some(details) = &result.web_search_details {
            let _ = writeln!(out, "\nWeb search found:");
            let _ = writeln!(out, "- Result: {:?}", details.result);
            let _ = writeln!(out, "- Explanation: {}", details.explanation);
            if let Some(name) = &details.closest_company_name {
                let _ = writeln!(out, "- Official name: {}", name);
            }
            if let Some(site) = &details.closest_company_website {
                let _ = writeln!(out, "- Website: {}", site);
            }
        }
    } else {
        let _ = writeln!(out, "VERIFICATION FAILED\n");
        let _ = writeln!(out, "The company could not be verified through:");
        for source in VerificationSource::PRIORITY {
            let _ = writeln!(
                out,
                "- {}: {}",
                source.label(),
                pass_mark(result.source_passed(source))
            );
        }
        match &result.web_search_details {
            Some(details) => {
                let _ = writeln!(out, "\nWeb search response:\n{}", details.explanation);
            }
            None => {
                let _ = writeln!(out, "\nWeb search response:\nNo explanation available");
            }
        }
    }

    out
}
