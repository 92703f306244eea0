use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use flow_core::config::ClientConfig;
use flow_core::{
    ChatMessage, Class, Goal, GoalPatch, Preferences, PreferencesPatch, ScheduleEvent, Task,
    TaskPatch,
};
use flow_memory::PreferenceStore;

use crate::backend::Backend;
use crate::http::HttpBackend;
use crate::mock::MockBackend;

/// Chat reply shown when the backend cannot be reached.
pub const CHAT_ERROR_REPLY: &str = "Sorry, I couldn't reach your coach right now. Please try again.";

/// The API adapter the screens talk to.
///
/// The three contract calls (`get_schedule`, `send_chat_command`,
/// `update_task`) never fail: a broken backend degrades to an empty
/// schedule, a canned chat reply or `false`. Collection CRUD returns
/// errors so a missing record can be reported.
///
/// Preferences are owned by the device: the local store is read first and
/// written first, and each change is then copied to the backend so the
/// server plans with the same settings. A failed copy is logged and the
/// local change stands.
pub struct ApiClient {
    backend: Arc<dyn Backend>,
    user_id: String,
    preferences: PreferenceStore,
}

impl ApiClient {
    pub fn new(
        backend: Arc<dyn Backend>,
        user_id: impl Into<String>,
        preferences: PreferenceStore,
    ) -> Self {
        Self {
            backend,
            user_id: user_id.into(),
            preferences,
        }
    }

    /// HTTP backend when `api_url` is set, sample data otherwise.
    pub fn from_config(config: &ClientConfig, preferences: PreferenceStore) -> Result<Self> {
        let backend: Arc<dyn Backend> = match config.api_url.as_deref() {
            Some(url) => Arc::new(HttpBackend::new(
                url,
                Duration::from_secs(config.request_timeout_secs),
            )?),
            None => {
                tracing::info!("No API URL configured, using mock data");
                Arc::new(MockBackend::new())
            }
        };
        Ok(Self::new(backend, config.user_id.clone(), preferences))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub async fn get_schedule(&self, query: &str) -> Vec<ScheduleEvent> {
        match self.backend.get_schedule(&self.user_id, query).await {
            Ok(schedule) => schedule,
            Err(e) => {
                tracing::warn!("get_schedule failed: {:#}", e);
                Vec::new()
            }
        }
    }

    pub async fn send_chat_command(&self, command: &str) -> String {
        match self.backend.chat_command(&self.user_id, command).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("chat_command failed: {:#}", e);
                CHAT_ERROR_REPLY.to_string()
            }
        }
    }

    pub async fn update_task(&self, task: &Task) -> bool {
        match self.backend.update_task(&self.user_id, task).await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!("update_task failed: {:#}", e);
                false
            }
        }
    }

    // -- tasks ---------------------------------------------------------------

    pub async fn tasks(&self) -> Result<Vec<Task>> {
        self.backend.tasks(&self.user_id).await
    }

    pub async fn add_task(&self, task: Task) -> Result<Task> {
        self.backend.add_task(&self.user_id, task).await
    }

    pub async fn patch_task(&self, task_id: &str, patch: TaskPatch) -> Result<Task> {
        self.backend.patch_task(&self.user_id, task_id, patch).await
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<()> {
        self.backend.delete_task(&self.user_id, task_id).await
    }

    // -- goals ---------------------------------------------------------------

    pub async fn goals(&self) -> Result<Vec<Goal>> {
        self.backend.goals(&self.user_id).await
    }

    pub async fn add_goal(&self, goal: Goal) -> Result<Goal> {
        self.backend.add_goal(&self.user_id, goal).await
    }

    pub async fn patch_goal(&self, goal_id: &str, patch: GoalPatch) -> Result<Goal> {
        self.backend.patch_goal(&self.user_id, goal_id, patch).await
    }

    pub async fn delete_goal(&self, goal_id: &str) -> Result<()> {
        self.backend.delete_goal(&self.user_id, goal_id).await
    }

    // -- classes & chat ------------------------------------------------------

    pub async fn classes(&self) -> Result<Vec<Class>> {
        self.backend.classes(&self.user_id).await
    }

    pub async fn add_class(&self, class: Class) -> Result<Class> {
        self.backend.add_class(&self.user_id, class).await
    }

    pub async fn messages(&self) -> Result<Vec<ChatMessage>> {
        self.backend.messages(&self.user_id).await
    }

    pub async fn send_message(&self, content: &str) -> Result<Vec<ChatMessage>> {
        self.backend.send_message(&self.user_id, content).await
    }

    // -- preferences ---------------------------------------------------------

    pub async fn preferences(&self) -> Preferences {
        self.preferences.get().await
    }

    pub async fn set_preferences(&self, prefs: Preferences) -> Result<Preferences> {
        let stored = self.preferences.set(prefs).await?;
        self.push_preferences(&stored).await;
        Ok(stored)
    }

    pub async fn update_preferences(&self, patch: PreferencesPatch) -> Result<Preferences> {
        let stored = self.preferences.update(patch).await?;
        self.push_preferences(&stored).await;
        Ok(stored)
    }

    /// The backend's copy, which may lag behind the local one.
    pub async fn remote_preferences(&self) -> Result<Preferences> {
        self.backend.preferences(&self.user_id).await
    }

    /// Copy the local preferences to the backend. Returns whether it took.
    pub async fn sync_preferences(&self) -> bool {
        let prefs = self.preferences.get().await;
        self.push_preferences(&prefs).await
    }

    async fn push_preferences(&self, prefs: &Preferences) -> bool {
        match self.backend.set_preferences(&self.user_id, prefs).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Failed to copy preferences to {}: {:#}", self.backend.name(), e);
                false
            }
        }
    }
}
