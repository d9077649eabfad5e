//! JSON parsing helpers for LLM responses
//!
//! Models often wrap the JSON payload in prose or code fences, so the payload
//! is located by its outermost brackets before deserializing.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{SourceMethod, Tip};

/// Category stamped on every generated tip
pub const GENERATED_CATEGORY: &str = "ai_generated";

#[derive(Debug, Deserialize)]
struct RawTip {
    title: String,
    content: String,
}

/// Parse a JSON array of `{title, content}` objects into tips
///
/// Ids are assigned by position starting at 1. An empty array or any entry
/// with a blank title or content is rejected.
pub fn parse_tips(response: &str, language: &str) -> Result<Vec<Tip>> {
    let json_str = extract_array(response)?;
    let raw: Vec<RawTip> = serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid tips JSON from AI: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })?;

    if raw.is_empty() {
        return Err(Error::InvalidData("AI returned an empty tip list".into()));
    }
    if raw
        .iter()
        .any(|t| t.title.trim().is_empty() || t.content.trim().is_empty())
    {
        return Err(Error::InvalidData("AI returned a tip without text".into()));
    }

    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(i, t)| Tip {
            id: (i + 1).to_string(),
            title: t.title.trim().to_string(),
            content: t.content.trim().to_string(),
            category: GENERATED_CATEGORY.to_string(),
            language: language.to_string(),
            source_method: SourceMethod::Llm,
        })
        .collect())
}

fn extract_array(response: &str) -> Result<&str> {
    let response = response.trim();
    match (response.find('['), response.rfind(']')) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(Error::InvalidData(format!(
            "No JSON array found in AI response | Raw: {}",
            truncate(response)
        ))),
    }
}

fn truncate(s: &str) -> String {
    match s.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
