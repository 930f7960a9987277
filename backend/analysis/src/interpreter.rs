use labelguard_core::{canonical_rules, AnalysisError, ComplianceCheck, ComplianceResult};
use serde_json::Value;
use tracing::debug;

use crate::extract::extract_json_payload;
use crate::score::compliance_score;

/// Turn a raw model reply into a scored compliance result.
///
/// Malformed JSON or a non-object payload is an error; there is no default result.
pub fn interpret(raw: &str) -> Result<ComplianceResult, AnalysisError> {
    let payload = extract_json_payload(raw);
    debug!(payload_len = payload.len(), "Extracted JSON payload from model reply");

    let value: Value = serde_json::from_str(payload)
        .map_err(|e| AnalysisError::Parse(format!("invalid JSON: {}", e)))?;

    let Value::Object(mut object) = value else {
        return Err(AnalysisError::Parse(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    };

    let extracted_text = match object.remove("extractedText") {
        Some(Value::String(text)) => text,
        _ => String::new(),
    };

    let compliances = match object.remove("compliances") {
        Some(Value::Array(items)) => items.iter().map(lenient_check).collect(),
        _ => canonical_rules(),
    };

    let compliance_score = compliance_score(&compliances);

    Ok(ComplianceResult {
        extracted_text,
        compliances,
        compliance_score,
    })
}

/// Items are taken as the model wrote them; wrongly typed fields fall back to empty / not passed.
fn lenient_check(item: &Value) -> ComplianceCheck {
    let text = |key: &str| {
        item.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    ComplianceCheck {
        rule: text("rule"),
        passed: item.get("passed").and_then(Value::as_bool).unwrap_or(false),
        details: text("details"),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
