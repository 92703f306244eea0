//! HTTP providers against a local mock server.

use std::time::Duration;

use flow_reasoning::api_types::Message;
use flow_reasoning::providers::{GeminiClient, OpenAiClient};
use flow_reasoning::retry::RetryPolicy;
use flow_reasoning::{CompletionParams, LlmClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(20),
        backoff_factor: 2.0,
    }
}

fn gemini_ok(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 7}
    })
}

#[tokio::test]
async fn test_gemini_complete() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "secret"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": "be brief"}]},
            "generationConfig": {"maxOutputTokens": 256}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_ok("{\"intent\": \"reschedule\"}")))
        .mount(&server)
        .await;

    let client = GeminiClient::new("secret", "gemini-2.5-flash", Some(&server.uri()), Duration::from_secs(5))
        .unwrap()
        .with_retry(fast_retry());
    let resp = client
        .complete(
            "be brief",
            vec![Message::user("move my study block")],
            CompletionParams {
                max_tokens: 256,
                temperature: 0.2,
            },
        )
        .await
        .unwrap();

    assert_eq!(resp.text, "{\"intent\": \"reschedule\"}");
    assert_eq!(resp.stop_reason.as_deref(), Some("STOP"));
    let usage = resp.usage.unwrap();
    assert_eq!((usage.input_tokens, usage.output_tokens), (12, 7));
}

#[tokio::test]
async fn test_gemini_retries_transient_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_ok("finally")))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new("k", "gemini-2.5-flash", Some(&server.uri()), Duration::from_secs(5))
        .unwrap()
        .with_retry(fast_retry());
    let resp = client
        .complete("", vec![Message::user("hi")], CompletionParams::default())
        .await
        .unwrap();
    assert_eq!(resp.text, "finally");
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new("k", "gemini-2.5-flash", Some(&server.uri()), Duration::from_secs(5))
        .unwrap()
        .with_retry(fast_retry());
    let err = client
        .complete("", vec![Message::user("hi")], CompletionParams::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_openai_complete() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": "sys"},
                {"role": "user", "content": "hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {"role": "assistant", "content": "{\"message\": \"ok\"}"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 3, "completion_tokens": 4}
        })))
        .mount(&server)
        .await;

    let client = OpenAiClient::new("sk-test", "gpt-4o-mini", Some(&server.uri()), Duration::from_secs(5))
        .unwrap()
        .with_retry(fast_retry());
    let resp = client
        .complete("sys", vec![Message::user("hello")], CompletionParams::default())
        .await
        .unwrap();
    assert_eq!(resp.text, "{\"message\": \"ok\"}");
    assert_eq!(resp.stop_reason.as_deref(), Some("stop"));
}
