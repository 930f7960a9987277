//! JSON payload extraction from free-form model replies.

use once_cell::sync::Lazy;
use regex::Regex;

/// Fence patterns tried in order; the first one that matches wins.
/// Capture group 1 holds the payload.
static FENCE_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        // Fenced block tagged as JSON.
        Regex::new(r"(?s)```(?i:json)\s*(.*?)\s*```").unwrap(),
        // Any fenced block.
        Regex::new(r"(?s)```(.*?)```").unwrap(),
    ]
});

/// Pull the JSON candidate out of a model reply.
///
/// Returns the contents of the first JSON-tagged fence, else of the first fence
/// of any kind, else the whole reply. The result is always trimmed.
pub fn extract_json_payload(raw: &str) -> &str {
    FENCE_PATTERNS
        .iter()
        .find_map(|re| re.captures(raw).and_then(|c| c.get(1)))
        .map(|m| m.as_str())
        .unwrap_or(raw)
        .trim()
}
