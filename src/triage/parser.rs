//! Structured-result parser
//!
//! Model output is treated as untyped text until it has been located as JSON,
//! decoded, and validated against the declared schema.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TriageError;

/// A type the model is asked to produce as JSON
pub trait StructuredOutput: DeserializeOwned {
    /// JSON Schema describing the expected shape
    fn json_schema() -> Value;

    /// Decode an already-parsed JSON value. Errors describe the schema mismatch.
    fn from_json(value: Value) -> Result<Self, String> {
        serde_json::from_value(value).map_err(|e| e.to_string())
    }

    /// Constraints serde cannot express (minimum lengths, non-empty fields)
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Instructions embedded in prompts so the model can self-check its output
    fn format_instructions() -> String {
        let schema = serde_json::to_string_pretty(&Self::json_schema())
            .unwrap_or_else(|_| Self::json_schema().to_string());
        format!(
            "The output must be a JSON instance that conforms to the JSON schema below.\n\
             For example, for the schema {{\"properties\": {{\"foo\": {{\"type\": \"array\", \"items\": {{\"type\": \"string\"}}}}}}, \"required\": [\"foo\"]}}\n\
             the object {{\"foo\": [\"bar\", \"baz\"]}} is a well-formatted instance of the schema, \
             while {{\"properties\": {{\"foo\": [\"bar\", \"baz\"]}}}} is not.\n\n\
             Here is the output schema:\n```\n{}\n```",
            schema
        )
    }
}

/// Parse raw model text into `T`.
///
/// `MalformedOutput` when no JSON can be found or decoded, `SchemaViolation`
/// when the JSON does not match `T`. Pure: the same text always yields the same
/// result.
pub fn parse<T: StructuredOutput>(raw: &str) -> Result<T, TriageError> {
    let json = extract_json(raw).ok_or_else(|| {
        TriageError::MalformedOutput("no JSON object found in model response".to_string())
    })?;

    let value: Value = serde_json::from_str(json)
        .map_err(|e| TriageError::MalformedOutput(format!("invalid JSON: {}", e)))?;

    let parsed = T::from_json(value).map_err(TriageError::SchemaViolation)?;
    parsed.validate().map_err(TriageError::SchemaViolation)?;
    Ok(parsed)
}

/// Locate the JSON object in a response that may wrap it in markdown fences
/// or surrounding prose.
///
/// A fenced block closes at the last fence in the text, since string values
/// (a draft reply with a code sample) may contain fences of their own. A
/// candidate that does not decode falls back to the brace slice.
pub fn extract_json(response: &str) -> Option<&str> {
    let trimmed = response.trim();

    let fenced = fenced_block(trimmed, "```json")
        .or_else(|| fenced_block(trimmed, "```").filter(|block| block.starts_with('{')));

    // First '{' to last '}'; start < end guards against inputs like "} {"
    let braces = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&trimmed[start..=end]),
        _ => None,
    };

    match (fenced, braces) {
        (Some(block), _) if decodes(block) => Some(block),
        (_, Some(slice)) if decodes(slice) => Some(slice),
        (fenced, braces) => fenced.or(braces),
    }
}

fn fenced_block<'a>(text: &'a str, open: &str) -> Option<&'a str> {
    let start = text.find(open)? + open.len();
    let end = text[start..].rfind("```")?;
    Some(text[start..start + end].trim())
}

fn decodes(candidate: &str) -> bool {
    serde_json::from_str::<Value>(candidate).is_ok()
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
