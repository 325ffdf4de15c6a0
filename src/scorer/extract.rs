//! @ai:module:intent Extract the workflow JSON document from raw model output
//! @ai:module:layer application
//! @ai:module:public_api WorkflowExtractor, WorkflowExtractorTrait
//! @ai:module:stateless true

use crate::error::{EvalError, Result};
use regex::Regex;
use serde_json::Value;

/// @ai:intent Trait for workflow extraction
pub trait WorkflowExtractorTrait: Send + Sync {
    /// @ai:intent Find and parse the workflow document in a model response
    fn extract(&self, response: &str) -> Result<Value>;
}

/// @ai:intent Extracts workflow JSON from markdown-formatted or bare responses
pub struct WorkflowExtractor {
    json_block_regex: Regex,
    any_block_regex: Regex,
}

impl WorkflowExtractor {
    /// @ai:intent Create a new workflow extractor
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            json_block_regex: Regex::new(r"(?i)```json[ \t]*\r?\n([\s\S]*?)```").unwrap(),
            any_block_regex: Regex::new(r"```\w*[ \t]*\r?\n([\s\S]*?)```").unwrap(),
        }
    }

    /// @ai:intent Candidate JSON texts in priority order
    /// @ai:effects pure
    fn candidates<'a>(&self, response: &'a str) -> Vec<&'a str> {
        let mut candidates = Vec::new();

        for regex in [&self.json_block_regex, &self.any_block_regex] {
            candidates.extend(
                regex
                    .captures_iter(response)
                    .filter_map(|cap| cap.get(1))
                    .map(|m| m.as_str()),
            );
        }

        candidates.push(response);

        if let Some(span) = outer_span(response, '{', '}') {
            candidates.push(span);
        }
        if let Some(span) = outer_span(response, '[', ']') {
            candidates.push(span);
        }

        candidates
    }
}

impl Default for WorkflowExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowExtractorTrait for WorkflowExtractor {
    /// @ai:intent Return the first candidate that parses as a JSON object or array
    /// @ai:effects pure
    fn extract(&self, response: &str) -> Result<Value> {
        self.candidates(response)
            .into_iter()
            .filter_map(|text| serde_json::from_str::<Value>(text.trim()).ok())
            .find(|value| value.is_object() || value.is_array())
            .ok_or(EvalError::NoWorkflowJson)
    }
}

/// @ai:intent Text between the first opening and the last closing delimiter
/// @ai:effects pure
fn outer_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;

    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_json_fence() {
        let extractor = WorkflowExtractor::new();
        let response = "Here you go:\n```json\n{\"steps\": []}\n```\nDone.";

        assert_eq!(extractor.extract(response).unwrap(), json!({ "steps": [] }));
    }

    #[test]
    fn test_json_fence_wins_over_earlier_plain_fence() {
        let extractor = WorkflowExtractor::new();
        let response = "```\nnot json\n```\n\n```json\n{\"name\": \"wf\"}\n```";

        assert_eq!(extractor.extract(response).unwrap(), json!({ "name": "wf" }));
    }

    #[test]
    fn test_extract_untagged_fence() {
        let extractor = WorkflowExtractor::new();
        let response = "```\n[{\"action\": \"CLICK\"}]\n```";

        assert!(extractor.extract(response).unwrap().is_array());
    }

    #[test]
    fn test_extract_bare_brace_span() {
        let extractor = WorkflowExtractor::new();
        let response = "The workflow is {\"steps\": [{\"action\": \"WAIT\"}]} as requested.";

        let value = extractor.extract(response).unwrap();
        assert_eq!(value["steps"][0]["action"], json!("WAIT"));
    }

    #[test]
    fn test_no_json_is_an_error() {
        let extractor = WorkflowExtractor::new();

        assert!(matches!(
            extractor.extract("I cannot help with that."),
            Err(EvalError::NoWorkflowJson)
        ));
        assert!(extractor.extract("```json\n{ broken\n```").is_err());
    }
}
