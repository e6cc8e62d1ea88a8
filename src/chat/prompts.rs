//! System prompts for red-flag resolution and pre-screening chats.

use crate::intake::{ApplicationData, RedFlag, RuleId, non_blank};
use crate::rules::AlignmentMatrix;
use crate::sources::GeoStatus;

const ROLE: &str = "\
You are a helpful assistant helping the customer provide the right information to open their account.
To proceed, we must clear all validation red flags, as required by company policy and regulations.

**Your Role:**
- Help the user resolve the validation issue.
- Ask clarifying questions to understand the situation.
- Give the customer a chance to explain, justify, or correct their data.
- Be friendly, professional, and concise.";

const INSTRUCTIONS: &str = "\
**Instructions:**
1. If this is the first message (conversation history is empty), briefly introduce yourself, explain the issue, and ask the customer to explain the situation.
2. Listen carefully to the customer's explanation or correction.
3. Ask follow-up questions only if needed to fully understand the situation.
4. Provide clear and simple guidance on what the customer should do next.
5. Be empathetic and understanding. There are many legitimate reasons behind unusual data.
6. Once the customer provides a reasonable explanation or correction, acknowledge it positively. Otherwise, thank them for the clarification.

**Important:**
- Do not make up information.
- Do not assume the user is lying or committing fraud.
- Focus on helping them provide accurate information or valid explanations.
- If they give a reasonable explanation, accept it as valid unless the red flag explicitly requires more detail.";

pub const PRESCREENING_PROMPT: &str = "\
You are a helpful assistant gathering information for a pre-screening questionnaire.

The applicant has indicated they are either:
1. A US citizen, OR
2. They or a close relative hold a political position (e.g. Minister, Governor)

Your job is to:
- Ask clear, specific follow-up questions to gather relevant details for the review agent
- Understand their specific situation (which category applies, which position, relationship if relative, etc.)
- If they don't talk about a relative, assume they are talking about themselves
- Be professional, concise, and friendly
- When you have gathered sufficient information, thank the customer and acknowledge you have received enough details

Keep responses brief and focused. The information you collect will be passed to a review agent.";

/// `$1,234.56`.
pub fn format_money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// Populated application fields, one `Label: value` line each.
fn application_context(app: &ApplicationData) -> String {
    let text_fields = [
        ("Current Address", &app.current_address),
        ("Company Address", &app.company_address),
        ("Occupation", &app.occupation),
        ("Job Title", &app.job_title),
        ("Company Name", &app.company_name),
        ("Company Website", &app.company_website),
        ("Employment Type", &app.employment_type),
        ("Source of Funds", &app.source_of_funds),
    ];

    let mut lines: Vec<String> = text_fields
        .iter()
        .filter_map(|(label, value)| non_blank(value).map(|v| format!("{}: {}", label, v)))
        .collect();

    if let Some(income) = app.monthly_income.filter(|v| *v != 0.0) {
        lines.push(format!("Monthly Income: {}", format_money(income)));
    }
    if let Some(source) = non_blank(&app.income_source) {
        lines.push(format!("Income Source: {}", source));
    }
    if let Some(assets) = app.current_assets.filter(|v| *v != 0.0) {
        lines.push(format!("Current Assets: {}", format_money(assets)));
    }
    if let Some(countries) = non_blank(&app.country_income_sources) {
        lines.push(format!("Country Income Sources: {}", countries));
    }

    lines.join("\n")
}

fn geocode_line(label: &str, entry: &serde_json::Value) -> Option<String> {
    let status = GeoStatus::new(entry.get("status")?.as_str()?);
    if status.is_ok() {
        return None;
    }
    Some(format!(
        "- {} ({}): {} [{}]",
        label,
        entry.get("address").and_then(|a| a.as_str()).unwrap_or("unknown"),
        status.describe(),
        status
    ))
}

fn distance_guidance(red_flag: &RedFlag) -> String {
    let mut text = String::from(
        "\
**Guidance for this issue:**
- Home and work addresses far apart can be completely normal. Customers may work remotely, \
visit the office only a few days per week, travel for work, or have multiple residences.
- Your job is to help clarify the situation, not to assume anything is wrong.",
    );

    let debug = &red_flag.debug_info;
    let lookups: Vec<String> = [
        ("Home address", debug.get("currentAddress")),
        ("Work address", debug.get("companyAddress")),
    ]
    .into_iter()
    .filter_map(|(label, entry)| entry.and_then(|e| geocode_line(label, e)))
    .collect();

    if !lookups.is_empty() {
        text.push_str("\n\n**Address lookup results:**\n");
        text.push_str(&lookups.join("\n"));
        text.push_str(
            "\nAsk the customer to double-check and, if needed, correct the address that could not be located.",
        );
    } else if let Some(km) = debug.get("distance_km").and_then(|d| d.as_f64()) {
        text.push_str(&format!("\n- Computed distance: {:.1} km.", km));
    }
    text
}

fn employer_guidance(red_flag: &RedFlag) -> String {
    let mut text = String::from(
        "\
**Guidance for this issue:**
- The declared employer could not be confirmed automatically.
- Ask the customer to confirm the exact registered company name, and optionally its website or location.
- If the customer provides a corrected or more complete company name, call the `verify_employer` tool with it.
- Securities and brokerage companies cannot be accepted as employers for this account type.",
    );

    if let Some(explanation) = red_flag
        .debug_info
        .get("perplexity_details")
        .and_then(|d| d.get("explanation"))
        .and_then(|e| e.as_str())
    {
        text.push_str(&format!(
            "\n\n**Previous automated check found:**\n{}",
            explanation
        ));
    }
    text
}

const BLACKLIST_GUIDANCE: &str = "\
**Guidance for this issue:**
- The applicant's name matched an entry on a restricted list.
- Do not reveal details about the list or how it is maintained.
- Ask the customer to confirm the exact spelling of their full legal name.
- If they believe this is a case of mistaken identity, explain that a compliance officer will review the match.";

fn political_exposure_guidance(red_flag: &RedFlag, app: &ApplicationData) -> String {
    let mut text = String::from(
        "\
**Guidance for this issue:**
- The applicant indicated political exposure. This always requires manual review by the compliance team.
- Gather: the position held, who holds it (the applicant or a relative, and the relationship), and the dates in office.
- Only ask for details the pre-screening answer below does not already cover.
- Do not promise approval; explain that a reviewer will assess the information.",
    );

    let debug = &red_flag.debug_info;
    let screening = app.pre_screening.as_ref();
    let explanation = debug
        .get("explanation")
        .and_then(|e| e.as_str())
        .or_else(|| screening.and_then(|s| s.explanation.as_deref()))
        .map(str::trim)
        .filter(|e| !e.is_empty());
    let message_count = debug
        .get("chatMessageCount")
        .and_then(|c| c.as_u64())
        .or_else(|| screening.map(|s| s.chat_history.len() as u64))
        .unwrap_or(0);

    text.push_str("\n\n**Pre-screening answer:**\n");
    match explanation {
        Some(explanation) => text.push_str(explanation),
        None => text.push_str("(no explanation given)"),
    }
    text.push_str(&format!(
        "\n- Pre-screening chat messages: {}",
        message_count
    ));
    text
}

fn source_of_funds_guidance(matrix: &AlignmentMatrix) -> String {
    format!(
        "\
**Guidance for this issue:**
- The declared source of funds does not typically match the employment type.
- Ask the customer to explain how they obtain these funds, or to correct either field.
- Use this reference table of typical sources for each employment type:
{}",
        matrix.render()
    )
}

/// Build the system prompt for a red-flag conversation.
pub fn build_system_prompt(
    red_flag: &RedFlag,
    app: &ApplicationData,
    matrix: &AlignmentMatrix,
) -> String {
    let issue = format!(
        "**Validation Issue Details:**\n- Rule: {}\n- Message: {}\n- Affected Fields: {}",
        red_flag.rule,
        red_flag.message,
        red_flag.affected_fields.join(", ")
    );

    let guidance = match red_flag.rule {
        RuleId::BlacklistCheck => BLACKLIST_GUIDANCE.to_string(),
        RuleId::EmployerVerificationCheck => employer_guidance(red_flag),
        RuleId::DistanceCheck => distance_guidance(red_flag),
        RuleId::PoliticalExposureCheck => political_exposure_guidance(red_flag, app),
        RuleId::SourceOfFundsAlignmentCheck => source_of_funds_guidance(matrix),
    };

    let mut sections = vec![ROLE.to_string(), issue];
    if red_flag.rule != RuleId::BlacklistCheck {
        let context = application_context(app);
        if !context.is_empty() {
            sections.push(format!("**Application Context:**\n{}", context));
        }
    }
    sections.push(guidance);
    sections.push(INSTRUCTIONS.to_string());

    sections.join("\n\n")
}
