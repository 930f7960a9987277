use labelguard_core::{ComplianceCheck, ErrorCategory, RULE_COUNT};

/// Percentage of canonical rules passed, rounded half up.
///
/// Divides by [`RULE_COUNT`], not by `compliances.len()`: a truncated checklist
/// scores lower. Passing entries beyond the canonical count are ignored so the
/// score never exceeds 100.
pub fn compliance_score(compliances: &[ComplianceCheck]) -> u8 {
    let passed = compliances.iter().filter(|c| c.passed).count().min(RULE_COUNT);
    ((200 * passed + RULE_COUNT) / (2 * RULE_COUNT)) as u8
}

/// Map the text of a failed model call to an error category.
///
/// Rate-limit indicators win over auth indicators; everything else is `Unknown`.
pub fn classify_failure(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase().replace('_', " ");

    if lower.contains("429") || lower.contains("resource exhausted") {
        ErrorCategory::RateLimited
    } else if lower.contains("401") || lower.contains("unauthorized") {
        ErrorCategory::Unauthorized
    } else {
        ErrorCategory::Unknown
    }
}
