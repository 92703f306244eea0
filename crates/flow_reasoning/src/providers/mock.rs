//! Mock LLM Provider - deterministic responses for development without API keys.

use crate::api_types::{Message, MessagesResponse};
use crate::llm::{CompletionParams, LlmClient};
use anyhow::Result;

pub const MOCK_PLAN_REPLY: &str =
    r#"{"intent": "plan_schedule", "parameters": {"time_range": "evening", "priority": "high"}}"#;
pub const MOCK_COACH_REPLY: &str = r#"{"message": "I suggest scheduling DSA in the evening.", "concerns": ["Late night study session"]}"#;

#[derive(Debug, Clone, Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }

    /// Anything mentioning a schedule gets an intent; everything else gets
    /// coaching.
    pub fn reply_for(prompt: &str) -> &'static str {
        if prompt.to_lowercase().contains("schedule") {
            MOCK_PLAN_REPLY
        } else {
            MOCK_COACH_REPLY
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for MockProvider {
    async fn complete(
        &self,
        _system: &str,
        messages: Vec<Message>,
        _params: CompletionParams,
    ) -> Result<MessagesResponse> {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(MessagesResponse {
            text: Self::reply_for(&prompt).to_string(),
            stop_reason: Some("end_turn".to_string()),
            usage: None,
        })
    }
}
