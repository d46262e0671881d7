//! Parsing utilities for model responses.
//!
//! Defensive extraction of JSON and cleanup of messy LLM text. These
//! utilities are what make loosely-typed model output reliable enough for
//! the structured stages: every parse failure routes through one explicit
//! fallback per stage instead of ad hoc recovery.

use crate::error::Result;
use crate::PipelineError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Extract JSON content from markdown fenced code blocks.
///
/// Recognizes `` ```json ``, `` ```JSON ``, and plain `` ``` `` fences.
pub fn extract_json_block(text: &str) -> Option<String> {
    let markers = ["```json", "```JSON", "```"];
    for marker in markers {
        if let Some(start) = text.find(marker) {
            let content_start = start + marker.len();
            if let Some(end) = text[content_start..].find("```") {
                return Some(text[content_start..content_start + end].trim().to_string());
            }
        }
    }
    None
}

/// Try to locate and extract a JSON object or array from text that may
/// contain surrounding prose.
///
/// Tries, in order:
/// 1. Markdown code block extraction
/// 2. First `{` or `[` with matching closer
pub fn extract_json_candidate(text: &str) -> Option<String> {
    let trimmed = text.trim();

    if let Some(block) = extract_json_block(trimmed) {
        return Some(block);
    }

    if let Some(idx) = trimmed.find('{').or_else(|| trimmed.find('[')) {
        let candidate = &trimmed[idx..];
        if serde_json::from_str::<Value>(candidate).is_ok() {
            return Some(candidate.to_string());
        }
        let open = candidate.as_bytes()[0];
        let close = if open == b'{' { b'}' } else { b']' };
        if let Some(end) = candidate.rfind(close as char) {
            let substr = &candidate[..=end];
            if serde_json::from_str::<Value>(substr).is_ok() {
                return Some(substr.to_string());
            }
        }
    }

    None
}

/// Parse text into a typed `T` with defensive JSON extraction.
///
/// Tries direct parse, markdown fence stripping, and embedded JSON
/// detection. The idea and copy stages route every failure of this function
/// through their deterministic fallback constructors.
pub fn parse_as<T: DeserializeOwned>(text: &str) -> Result<T> {
    let trimmed = text.trim();

    if let Ok(val) = serde_json::from_str::<T>(trimmed) {
        return Ok(val);
    }

    if let Some(json_str) = extract_json_block(trimmed) {
        if let Ok(val) = serde_json::from_str::<T>(&json_str) {
            return Ok(val);
        }
    }

    if let Some(candidate) = extract_json_candidate(trimmed) {
        if let Ok(val) = serde_json::from_str::<T>(&candidate) {
            return Ok(val);
        }
    }

    let preview: String = trimmed.chars().take(200).collect();
    Err(PipelineError::Other(format!(
        "Failed to parse model output as expected type. Raw text (truncated): {}",
        preview
    )))
}

/// Strip markdown decoration characters and collapse whitespace.
///
/// Model-produced context summaries tend to come back as bullet lists with
/// bold markers. Downstream prompts want plain text, so `*`, `#`, `-`, and
/// `_` are removed and all whitespace runs collapse to single spaces.
pub fn scrub_markdown(text: &str) -> String {
    let stripped: String = text
        .chars()
        .map(|c| match c {
            '*' | '#' | '-' | '_' => ' ',
            other => other,
        })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split text into lowercase word tokens (alphanumeric runs).
///
/// Shared by the idea and copy fallbacks to derive a topic and hashtags
/// from the context string.
pub fn word_tokens(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            current.extend(c.to_lowercase());
        } else if !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_block() {
        let text = "text\n```json\n{\"a\":1}\n```\nmore";
        assert_eq!(extract_json_block(text), Some("{\"a\":1}".to_string()));
    }

    #[test]
    fn test_extract_json_block_none() {
        assert_eq!(extract_json_block("no code block"), None);
    }

    #[test]
    fn test_extract_json_candidate_embedded() {
        let text = "Here is the result: {\"name\": \"test\"} done.";
        let candidate = extract_json_candidate(text);
        assert!(candidate.is_some());
        let val: Value = serde_json::from_str(&candidate.unwrap()).unwrap();
        assert_eq!(val["name"], "test");
    }

    #[test]
    fn test_parse_as_direct() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct T {
            value: String,
        }
        let result: T = parse_as(r#"{"value": "hello"}"#).unwrap();
        assert_eq!(result.value, "hello");
    }

    #[test]
    fn test_parse_as_markdown_block() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct T {
            x: i32,
        }
        let text = "Here:\n```json\n{\"x\": 42}\n```\nDone.";
        let result: T = parse_as(text).unwrap();
        assert_eq!(result.x, 42);
    }

    #[test]
    fn test_parse_as_embedded() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct T {
            name: String,
        }
        let text = "Sure! {\"name\": \"test\"} hope that helps.";
        let result: T = parse_as(text).unwrap();
        assert_eq!(result.name, "test");
    }

    #[test]
    fn test_parse_as_failure() {
        #[derive(Debug, serde::Deserialize)]
        struct T {
            _x: i32,
        }
        let result = parse_as::<T>("not json at all");
        assert!(result.is_err());
    }

    #[test]
    fn test_scrub_markdown_strips_decoration() {
        let text = "**Main topic:** fitness\n- #keywords: _gym_, training";
        let scrubbed = scrub_markdown(text);
        assert_eq!(scrubbed, "Main topic: fitness keywords: gym , training");
    }

    #[test]
    fn test_scrub_markdown_collapses_whitespace() {
        assert_eq!(scrub_markdown("a\n\n  b\t c"), "a b c");
    }

    #[test]
    fn test_word_tokens() {
        let words = word_tokens("Vegan Cooking, for beginners!");
        assert_eq!(words, vec!["vegan", "cooking", "for", "beginners"]);
    }

    #[test]
    fn test_word_tokens_empty() {
        assert!(word_tokens("...!?").is_empty());
    }
}
