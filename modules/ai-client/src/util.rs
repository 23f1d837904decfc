use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;

/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Strip markdown code fences from a model response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Decode a structured model response: strip code fences, then parse as JSON.
///
/// Every stage that asks a model for structured data goes through this one
/// decoder, so fence handling lives in exactly one place.
pub fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let cleaned = strip_code_blocks(raw);
    serde_json::from_str(cleaned)
        .map_err(|e| anyhow!("model response is not valid structured data: {e}"))
}
