//! Exponential backoff for provider HTTP calls.
//!
//! Only transient failures are retried: 408, 429, 5xx gateway/server errors
//! and transport errors. Anything else (400, 401, 403, 404) fails at once.

use anyhow::{Context, Result};
use rand::Rng;
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based), without jitter.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = self.backoff_factor.powi(retry.saturating_sub(1) as i32);
        let secs = self.initial_delay.as_secs_f64() * exp;
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

pub fn is_transient(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Random offset of up to a quarter of `delay`.
fn jitter(delay: Duration) -> Duration {
    let span = (delay.as_millis() as u64 / 4).max(1);
    Duration::from_millis(rand::thread_rng().gen_range(0..span))
}

/// Build and send a request until it succeeds or the policy gives up.
///
/// `make_request` is called once per attempt because a `RequestBuilder`
/// cannot be reused after `send`.
pub async fn send_with_retry<F>(
    policy: &RetryPolicy,
    provider: &str,
    make_request: F,
) -> Result<Response>
where
    F: Fn() -> RequestBuilder,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_error = String::from("no attempt made");

    for attempt in 1..=attempts {
        match make_request().send().await {
            Ok(response) if response.status().is_success() => {
                if attempt > 1 {
                    tracing::info!("{} succeeded on attempt {}", provider, attempt);
                }
                return Ok(response);
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                if !is_transient(status) {
                    anyhow::bail!("{} API error ({}): {}", provider, status, body);
                }
                tracing::warn!(
                    "{} returned {} on attempt {}/{}: {}",
                    provider,
                    status,
                    attempt,
                    attempts,
                    body.chars().take(200).collect::<String>()
                );
                last_error = format!("{} ({}): {}", provider, status, body);
            }
            Err(e) => {
                tracing::warn!(
                    "{} network error on attempt {}/{}: {}",
                    provider,
                    attempt,
                    attempts,
                    e
                );
                last_error = format!("{}: {}", provider, e);
            }
        }

        if attempt < attempts {
            let base = policy.delay_for(attempt);
            let wait = base + jitter(base);
            tracing::debug!("{} retrying in {:.2}s", provider, wait.as_secs_f64());
            tokio::time::sleep(wait).await;
        }
    }

    Err(anyhow::anyhow!(last_error))
        .with_context(|| format!("All {} attempts to {} failed", attempts, provider))
}
