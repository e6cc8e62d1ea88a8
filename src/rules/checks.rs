//! One function per validation rule.
//!
//! Each rule decides its own applicability and converts every upstream
//! failure into an outcome before returning. Blacklist fails open, distance
//! fails closed, employer fails closed per source.

use serde_json::json;

use crate::checks::{DistanceChecker, EmployerVerifier, GeocodeResult, NameBlacklist};
use crate::intake::{ApplicationData, RedFlag, RuleId, fields, non_blank};
use crate::rules::alignment::{Alignment, AlignmentMatrix};

/// Characters of the political-exposure explanation quoted in the flag message.
const EXPLANATION_PREVIEW_CHARS: usize = 100;

pub async fn check_blacklist(app: &ApplicationData, blacklist: &NameBlacklist) -> Option<RedFlag> {
    let first = non_blank(&app.first_name)?;
    let last = non_blank(&app.last_name)?;

    if !blacklist.is_blacklisted(first, last).await {
        return None;
    }

    Some(RedFlag::new(
        RuleId::BlacklistCheck,
        format!("Name '{} {}' appears in restricted list", first, last),
        &[fields::FIRST_NAME, fields::LAST_NAME],
    ))
}

pub async fn check_employer(app: &ApplicationData, verifier: &EmployerVerifier) -> Option<RedFlag> {
    let company = non_blank(&app.company_name)?;
    let website = non_blank(&app.company_website);

    let result = verifier.verify_employer(company, website, None).await;
    if result.passed {
        return None;
    }

    let debug_info = serde_json::to_value(&result).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Could not serialize verification result");
        serde_json::Value::Null
    });
    Some(
        RedFlag::new(
            RuleId::EmployerVerificationCheck,
            format!("Could not verify employer '{}'", company),
            &[fields::COMPANY_NAME, fields::COMPANY_WEBSITE],
        )
        .with_debug_info(debug_info),
    )
}

fn address_debug(address: &str, geocoded: &GeocodeResult) -> serde_json::Value {
    json!({
        "address": address,
        "lat": geocoded.coordinates.map(|c| c.lat),
        "lng": geocoded.coordinates.map(|c| c.lng),
        "status": geocoded.status,
    })
}

pub async fn check_distance(
    app: &ApplicationData,
    checker: &DistanceChecker,
    limit_km: f64,
) -> Option<RedFlag> {
    let home = non_blank(&app.current_address)?;
    let work = non_blank(&app.company_address)?;

    let check = checker.check_distance_within_limit(home, work, limit_km).await;
    if check.within_limit {
        return None;
    }

    let message = match check.distance_km {
        Some(km) => format!(
            "Home and work addresses are {:.1}km apart (limit: {}km)",
            km, limit_km
        ),
        None => "Could not verify addresses. Please ensure both addresses are valid.".to_string(),
    };

    Some(
        RedFlag::new(
            RuleId::DistanceCheck,
            message,
            &[fields::CURRENT_ADDRESS, fields::COMPANY_ADDRESS],
        )
        .with_debug_info(json!({
            "currentAddress": address_debug(home, &check.origin),
            "companyAddress": address_debug(work, &check.destination),
            "distance_km": check.distance_km,
            "limit_km": limit_km,
        })),
    )
}

/// A "yes" always flags, whatever the explanation says.
pub fn check_political_exposure(app: &ApplicationData) -> Option<RedFlag> {
    let screening = app.pre_screening.as_ref().filter(|s| s.is_yes())?;

    let explanation = screening.explanation.as_deref().unwrap_or_default();
    let preview: String = explanation.chars().take(EXPLANATION_PREVIEW_CHARS).collect();

    Some(
        RedFlag::new(
            RuleId::PoliticalExposureCheck,
            format!("Applicant indicated political exposure: {}...", preview),
            &[fields::PRE_SCREENING],
        )
        .with_debug_info(json!({
            "response": screening.response,
            "explanation": screening.explanation,
            "chatMessageCount": screening.chat_history.len(),
        })),
    )
}

pub fn check_source_of_funds(app: &ApplicationData, matrix: &AlignmentMatrix) -> Option<RedFlag> {
    let employment_type = non_blank(&app.employment_type)?;
    let source = non_blank(&app.source_of_funds)?;
    let affected = [fields::EMPLOYMENT_TYPE, fields::SOURCE_OF_FUNDS];

    match matrix.check(employment_type, source) {
        Alignment::Aligned => None,
        Alignment::UnknownEmploymentType => Some(
            RedFlag::new(
                RuleId::SourceOfFundsAlignmentCheck,
                format!(
                    "Unable to validate source of funds alignment for employment type '{}'",
                    employment_type
                ),
                &affected,
            )
            .with_debug_info(json!({
                "employmentType": employment_type,
                "sourceOfFunds": source,
                "reason": "unknown_employment_type",
            })),
        ),
        Alignment::Misaligned { allowed } => Some(
            RedFlag::new(
                RuleId::SourceOfFundsAlignmentCheck,
                format!(
                    "The source of funds '{}' doesn't typically align with employment type '{}'. Can you provide more details?",
                    source, employment_type
                ),
                &affected,
            )
            .with_debug_info(json!({
                "employmentType": employment_type,
                "sourceOfFunds": source,
                "allowedSources": allowed,
            })),
        ),
    }
}
