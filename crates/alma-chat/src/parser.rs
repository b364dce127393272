//! Parsing of structured model output.
//!
//! Gate checks and suggestion calls ask the model for JSON, but providers
//! routinely wrap it in prose or code fences. Everything here extracts the
//! first JSON object or array substring before handing it to serde, and
//! degrades to a safe default instead of erroring.

use serde::Deserialize;

/// Outcome of the quiet-mode gate check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDecision {
    pub should_respond: bool,
    #[serde(default)]
    pub reasoning: String,
}

/// Return the first balanced JSON object or array substring, skipping any
/// surrounding prose. String literals and escapes are respected, so braces
/// inside quoted text do not end the scan.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let bytes = text.as_bytes();
    let open = bytes[start];
    let close = if open == b'{' { b'}' } else { b']' };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            _ if in_string => {}
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a gate decision from raw model output. `None` on any parse failure;
/// the caller treats that as "do not respond".
pub fn parse_gate_decision(text: &str) -> Option<GateDecision> {
    let json = extract_json(text)?;
    serde_json::from_str(json).ok()
}

/// Parse a suggestion list from raw model output. Blank entries are dropped
/// and the result is capped at `max`. Any parse failure yields an empty list.
pub fn parse_suggestions(text: &str, max: usize) -> Vec<String> {
    let Some(json) = extract_json(text) else {
        return Vec::new();
    };
    let Ok(items) = serde_json::from_str::<Vec<String>>(json) else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .take(max)
        .collect()
}
