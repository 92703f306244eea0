//! Backend that forwards every call to a Flow server over HTTP.
//!
//! Calls are made once; retries and degraded values are the caller's
//! business.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use flow_core::{
    ChatMessage, Class, FlowError, Goal, GoalPatch, Preferences, ScheduleEvent, Task, TaskPatch,
};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::backend::Backend;

#[derive(Deserialize)]
struct ScheduleEnvelope {
    #[serde(default)]
    schedule: Vec<ScheduleEvent>,
}

#[derive(Deserialize)]
struct ChatEnvelope {
    reply: String,
}

#[derive(Deserialize)]
struct OkEnvelope {
    #[serde(default)]
    ok: bool,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
}

pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid API URL: {base_url}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API URL cannot be a base: {base_url}");
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with `segments` appended, each percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("API URL cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn user_url(&self, user_id: &str, rest: &[&str]) -> Result<Url> {
        let mut segments = vec!["users", user_id];
        segments.extend_from_slice(rest);
        self.url(&segments)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, kind: &'static str, id: &str) -> Result<T> {
        let resp = self.client.get(url).send().await.context("Flow API request failed")?;
        decode(check(resp, kind, id).await?).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: Url,
        body: &impl serde::Serialize,
        kind: &'static str,
        id: &str,
    ) -> Result<T> {
        let resp = self
            .client
            .request(method, url)
            .json(body)
            .send()
            .await
            .context("Flow API request failed")?;
        decode(check(resp, kind, id).await?).await
    }

    async fn delete(&self, url: Url, kind: &'static str, id: &str) -> Result<()> {
        let resp = self
            .client
            .delete(url)
            .send()
            .await
            .context("Flow API request failed")?;
        check(resp, kind, id).await?;
        Ok(())
    }
}

/// Map non-success responses: 404 to `NotFound`, 400 to `Validation`,
/// anything else to a plain error carrying status and body.
async fn check(resp: Response, kind: &'static str, id: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error)
        .unwrap_or(body);
    match status {
        StatusCode::NOT_FOUND => Err(FlowError::not_found(kind, id).into()),
        StatusCode::BAD_REQUEST => Err(FlowError::Validation(message).into()),
        _ => anyhow::bail!("Flow API error {}: {}", status, message),
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    resp.json::<T>()
        .await
        .context("Failed to decode Flow API response")
}

#[async_trait]
impl Backend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn get_schedule(&self, user_id: &str, query: &str) -> Result<Vec<ScheduleEvent>> {
        let body = json!({"user_id": user_id, "query": query});
        let env: ScheduleEnvelope = self
            .send_json(reqwest::Method::POST, self.url(&["get_schedule"])?, &body, "schedule", user_id)
            .await?;
        Ok(env.schedule)
    }

    async fn chat_command(&self, user_id: &str, command: &str) -> Result<String> {
        let body = json!({"user_id": user_id, "command": command});
        let env: ChatEnvelope = self
            .send_json(reqwest::Method::POST, self.url(&["chat_command"])?, &body, "chat", user_id)
            .await?;
        Ok(env.reply)
    }

    async fn update_task(&self, user_id: &str, task: &Task) -> Result<bool> {
        let body = json!({"user_id": user_id, "task": task});
        let env: OkEnvelope = self
            .send_json(reqwest::Method::POST, self.url(&["update_task"])?, &body, "task", &task.id)
            .await?;
        Ok(env.ok)
    }

    async fn tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        self.get_json(self.user_url(user_id, &["tasks"])?, "user", user_id)
            .await
    }

    async fn add_task(&self, user_id: &str, task: Task) -> Result<Task> {
        let url = self.user_url(user_id, &["tasks"])?;
        self.send_json(reqwest::Method::POST, url, &task, "user", user_id)
            .await
    }

    async fn patch_task(&self, user_id: &str, task_id: &str, patch: TaskPatch) -> Result<Task> {
        let url = self.user_url(user_id, &["tasks", task_id])?;
        self.send_json(reqwest::Method::PATCH, url, &patch, "task", task_id)
            .await
    }

    async fn delete_task(&self, user_id: &str, task_id: &str) -> Result<()> {
        self.delete(self.user_url(user_id, &["tasks", task_id])?, "task", task_id)
            .await
    }

    async fn goals(&self, user_id: &str) -> Result<Vec<Goal>> {
        self.get_json(self.user_url(user_id, &["goals"])?, "user", user_id)
            .await
    }

    async fn add_goal(&self, user_id: &str, goal: Goal) -> Result<Goal> {
        let url = self.user_url(user_id, &["goals"])?;
        self.send_json(reqwest::Method::POST, url, &goal, "user", user_id)
            .await
    }

    async fn patch_goal(&self, user_id: &str, goal_id: &str, patch: GoalPatch) -> Result<Goal> {
        let url = self.user_url(user_id, &["goals", goal_id])?;
        self.send_json(reqwest::Method::PATCH, url, &patch, "goal", goal_id)
            .await
    }

    async fn delete_goal(&self, user_id: &str, goal_id: &str) -> Result<()> {
        self.delete(self.user_url(user_id, &["goals", goal_id])?, "goal", goal_id)
            .await
    }

    async fn classes(&self, user_id: &str) -> Result<Vec<Class>> {
        self.get_json(self.user_url(user_id, &["classes"])?, "user", user_id)
            .await
    }

    async fn add_class(&self, user_id: &str, class: Class) -> Result<Class> {
        let url = self.user_url(user_id, &["classes"])?;
        self.send_json(reqwest::Method::POST, url, &class, "user", user_id)
            .await
    }

    async fn messages(&self, user_id: &str) -> Result<Vec<ChatMessage>> {
        self.get_json(self.user_url(user_id, &["messages"])?, "user", user_id)
            .await
    }

    async fn send_message(&self, user_id: &str, content: &str) -> Result<Vec<ChatMessage>> {
        let url = self.user_url(user_id, &["messages"])?;
        self.send_json(
            reqwest::Method::POST,
            url,
            &json!({"content": content}),
            "user",
            user_id,
        )
        .await
    }

    async fn preferences(&self, user_id: &str) -> Result<Preferences> {
        self.get_json(self.user_url(user_id, &["preferences"])?, "user", user_id)
            .await
    }

    async fn set_preferences(&self, user_id: &str, prefs: &Preferences) -> Result<Preferences> {
        let url = self.user_url(user_id, &["preferences"])?;
        self.send_json(reqwest::Method::PUT, url, prefs, "user", user_id)
            .await
    }
}
