pub mod gemini;
pub mod mock;
pub mod openai;

pub use gemini::GeminiClient;
pub use mock::MockProvider;
pub use openai::OpenAiClient;

use crate::llm::LlmClient;
use anyhow::Result;
use flow_core::config::LlmConfig;
use std::sync::Arc;
use std::time::Duration;

/// Pick a provider from config. A real provider without an API key degrades
/// to the mock so the app still runs offline.
pub fn build_client(cfg: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let provider = cfg.provider.to_ascii_lowercase();
    if provider == "mock" {
        return Ok(Arc::new(MockProvider::new()));
    }

    let api_key = std::env::var(&cfg.api_key_env)
        .ok()
        .filter(|k| !k.trim().is_empty());
    let Some(api_key) = api_key else {
        tracing::warn!(
            "{} is not set; falling back to the mock {} provider",
            cfg.api_key_env,
            provider
        );
        return Ok(Arc::new(MockProvider::new()));
    };

    let timeout = Duration::from_secs(cfg.request_timeout_secs);
    let base_url = cfg.base_url.as_deref();
    let client: Arc<dyn LlmClient> = match provider.as_str() {
        "gemini" => Arc::new(GeminiClient::new(api_key, &cfg.model, base_url, timeout)?),
        "openai" => Arc::new(OpenAiClient::new(api_key, &cfg.model, base_url, timeout)?),
        other => anyhow::bail!("Unknown LLM provider '{}'", other),
    };
    tracing::info!("Using {} provider with model {}", provider, cfg.model);
    Ok(client)
}
