//! Pull structured data out of free-form model output.
//!
//! Models like to wrap JSON in prose or code fences, so the object is taken
//! as everything from the first `{` to the last `}`.

use flow_core::{FlowError, FlowResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub fn extract_json(text: &str) -> FlowResult<Value> {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(FlowError::Llm(
            "No JSON-like content found in response".to_string(),
        ));
    };
    if end < start {
        return Err(FlowError::Llm(
            "No JSON-like content found in response".to_string(),
        ));
    }
    serde_json::from_str(&text[start..=end])
        .map_err(|e| FlowError::Llm(format!("Failed to parse JSON: {e}")))
}

/// Extract and deserialize into `T`.
pub fn parse_reply<T: DeserializeOwned>(text: &str) -> FlowResult<T> {
    let value = extract_json(text)?;
    serde_json::from_value(value).map_err(|e| FlowError::Llm(format!("Unexpected reply shape: {e}")))
}

fn general_intent() -> String {
    "general".to_string()
}

/// What the parser agent understood the user to want.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedIntent {
    #[serde(default = "general_intent")]
    pub intent: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl ParsedIntent {
    pub fn general() -> Self {
        Self {
            intent: general_intent(),
            parameters: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoachReply {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_from_prose() {
        let text = "Sure! Here you go:\n```json\n{\"intent\": \"plan_exam\", \"parameters\": {\"subjects\": [\"math\"]}}\n```\nAnything else?";
        let parsed: ParsedIntent = parse_reply(text).unwrap();
        assert_eq!(parsed.intent, "plan_exam");
        assert_eq!(parsed.parameters["subjects"][0], "math");
    }

    #[test]
    fn test_no_braces_is_error() {
        let err = extract_json("no json here").unwrap_err();
        assert!(err.to_string().contains("No JSON-like content"));
        assert!(extract_json("} backwards {").is_err());
    }

    #[test]
    fn test_broken_json_is_error() {
        let err = extract_json("{\"intent\": }").unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }

    #[test]
    fn test_missing_intent_defaults_to_general() {
        let parsed: ParsedIntent = parse_reply("{\"parameters\": {}}").unwrap();
        assert_eq!(parsed, ParsedIntent::general());
    }

    #[test]
    fn test_coach_reply_without_message() {
        let reply: CoachReply =
            parse_reply(r#"{"intent": "plan_schedule", "parameters": {}}"#).unwrap();
        assert!(reply.message.is_none());
        assert!(reply.concerns.is_empty());
    }
}
