//! Lenient parsing of LLM output.
//!
//! Models wrap JSON in prose and code fences no matter how firmly the prompt
//! forbids it; these helpers pull the payload out instead of failing.

use crate::error::LlmError;

/// Extracts the first top-level JSON object from free-form model output.
///
/// Scans for the outermost `{ .. }` span and parses it, so fenced or
/// prose-wrapped JSON still round-trips.
///
/// # Errors
///
/// Returns [`LlmError::Unparseable`] when no braces are present or the span
/// is not valid JSON.
pub fn extract_json_object(text: &str, context: &str) -> Result<serde_json::Value, LlmError> {
    let start = text.find('{');
    let end = text.rfind('}');

    let (Some(start), Some(end)) = (start, end) else {
        return Err(LlmError::Unparseable {
            context: context.to_owned(),
            reason: "no JSON object in output".to_owned(),
        });
    };
    if end <= start {
        return Err(LlmError::Unparseable {
            context: context.to_owned(),
            reason: "malformed JSON braces".to_owned(),
        });
    }

    serde_json::from_str(&text[start..=end]).map_err(|e| LlmError::Unparseable {
        context: context.to_owned(),
        reason: e.to_string(),
    })
}

/// Parses a comma-separated keyword list, trimming whitespace and dropping
/// empties, capped at `top_n` terms.
#[must_use]
pub fn parse_keyword_list(text: &str, top_n: usize) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .take(top_n)
        .map(ToOwned::to_owned)
        .collect()
}
