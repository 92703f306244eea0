use crate::api_types::{Message, MessagesResponse};
use anyhow::Result;
use async_trait::async_trait;
use flow_core::config::LlmConfig;

/// Sampling parameters for a single completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    /// Upper bound on generated tokens
    pub max_tokens: u32,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            max_tokens: 8000,
            temperature: 0.7,
        }
    }
}

impl From<&LlmConfig> for CompletionParams {
    fn from(cfg: &LlmConfig) -> Self {
        Self {
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature.clamp(0.0, 2.0),
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a system prompt plus conversation and return the model's text.
    async fn complete(
        &self,
        system: &str,
        messages: Vec<Message>,
        params: CompletionParams,
    ) -> Result<MessagesResponse>;
}

/// Single-turn convenience wrapper around [`LlmClient::complete`].
pub async fn generate(
    client: &dyn LlmClient,
    system: &str,
    prompt: &str,
    params: CompletionParams,
) -> Result<String> {
    let response = client
        .complete(system, vec![Message::user(prompt)], params)
        .await?;
    Ok(response.text)
}
