//! Pull the JSON object out of a raw model reply.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::{AssistantError, Result};

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("valid regex"));

/// Locate a single JSON object in `raw`: a fenced ```json block wins, then the
/// whole text. Truncated or otherwise broken JSON is never repaired; the call
/// fails instead.
pub fn extract_json(raw: &str) -> Result<Value> {
    let malformed = || AssistantError::MalformedCompletion {
        raw: raw.to_string(),
    };

    let candidate = match FENCED_JSON.captures(raw) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(raw),
        None => raw.trim(),
    };

    let value: Value = serde_json::from_str(candidate).map_err(|_| malformed())?;
    if !value.is_object() {
        return Err(malformed());
    }
    Ok(value)
}
