use anyhow::Result;
use async_trait::async_trait;
use flow_core::{
    ChatMessage, Class, Goal, GoalPatch, Preferences, ScheduleEvent, Task, TaskPatch,
};

/// Where API calls end up: the Flow server, or canned data when no server
/// is configured.
///
/// Missing records surface as `FlowError::NotFound` inside the `anyhow`
/// error so callers can tell them apart from transport failures.
#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get_schedule(&self, user_id: &str, query: &str) -> Result<Vec<ScheduleEvent>>;
    async fn chat_command(&self, user_id: &str, command: &str) -> Result<String>;
    async fn update_task(&self, user_id: &str, task: &Task) -> Result<bool>;

    async fn tasks(&self, user_id: &str) -> Result<Vec<Task>>;
    async fn add_task(&self, user_id: &str, task: Task) -> Result<Task>;
    async fn patch_task(&self, user_id: &str, task_id: &str, patch: TaskPatch) -> Result<Task>;
    async fn delete_task(&self, user_id: &str, task_id: &str) -> Result<()>;

    async fn goals(&self, user_id: &str) -> Result<Vec<Goal>>;
    async fn add_goal(&self, user_id: &str, goal: Goal) -> Result<Goal>;
    async fn patch_goal(&self, user_id: &str, goal_id: &str, patch: GoalPatch) -> Result<Goal>;
    async fn delete_goal(&self, user_id: &str, goal_id: &str) -> Result<()>;

    async fn classes(&self, user_id: &str) -> Result<Vec<Class>>;
    async fn add_class(&self, user_id: &str, class: Class) -> Result<Class>;

    async fn messages(&self, user_id: &str) -> Result<Vec<ChatMessage>>;
    /// Post a user message; returns what was appended to the history.
    async fn send_message(&self, user_id: &str, content: &str) -> Result<Vec<ChatMessage>>;

    async fn preferences(&self, user_id: &str) -> Result<Preferences>;
    /// Replace the backend's copy; returns what it stored.
    async fn set_preferences(&self, user_id: &str, prefs: &Preferences) -> Result<Preferences>;
}
