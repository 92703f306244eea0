//! In-memory backend used when no API URL is configured.

use anyhow::Result;
use async_trait::async_trait;
use flow_core::{
    new_id, sample, ChatMessage, Class, FlowError, Goal, GoalPatch, Preferences, ScheduleEvent,
    Task, TaskPatch,
};
use tokio::sync::RwLock;

use crate::backend::Backend;

pub const MOCK_ASSISTANT_REPLY: &str = "I understand. Let me help you with that.";

pub fn mock_chat_reply(command: &str) -> String {
    format!("I heard: {command}. (This is a stub response from the frontend.)")
}

struct MockData {
    schedule: Vec<ScheduleEvent>,
    tasks: Vec<Task>,
    goals: Vec<Goal>,
    classes: Vec<Class>,
    messages: Vec<ChatMessage>,
    preferences: Preferences,
}

/// Sample records shared by every user id.
pub struct MockBackend {
    data: RwLock<MockData>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(MockData {
                schedule: sample::schedule(),
                tasks: sample::tasks(),
                goals: sample::goals(),
                classes: sample::classes(),
                messages: vec![sample::greeting()],
                preferences: Preferences::default(),
            }),
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn get_schedule(&self, user_id: &str, query: &str) -> Result<Vec<ScheduleEvent>> {
        tracing::debug!("Mock schedule for {} ({:?})", user_id, query);
        Ok(self.data.read().await.schedule.clone())
    }

    async fn chat_command(&self, _user_id: &str, command: &str) -> Result<String> {
        Ok(mock_chat_reply(command))
    }

    async fn update_task(&self, _user_id: &str, task: &Task) -> Result<bool> {
        task.validate()?;
        let mut data = self.data.write().await;
        match data.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task.clone(),
            None => data.tasks.push(task.clone()),
        }
        Ok(true)
    }

    async fn tasks(&self, _user_id: &str) -> Result<Vec<Task>> {
        Ok(self.data.read().await.tasks.clone())
    }

    async fn add_task(&self, _user_id: &str, mut task: Task) -> Result<Task> {
        task.validate()?;
        task.id = new_id();
        self.data.write().await.tasks.push(task.clone());
        Ok(task)
    }

    async fn patch_task(&self, _user_id: &str, task_id: &str, patch: TaskPatch) -> Result<Task> {
        let mut data = self.data.write().await;
        let task = data
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| FlowError::not_found("task", task_id))?;
        let mut updated = task.clone();
        updated.apply(patch);
        updated.validate()?;
        *task = updated.clone();
        Ok(updated)
    }

    async fn delete_task(&self, _user_id: &str, task_id: &str) -> Result<()> {
        let mut data = self.data.write().await;
        let idx = data
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| FlowError::not_found("task", task_id))?;
        data.tasks.remove(idx);
        Ok(())
    }

    async fn goals(&self, _user_id: &str) -> Result<Vec<Goal>> {
        Ok(self.data.read().await.goals.clone())
    }

    /// New goals always start at 0% progress.
    async fn add_goal(&self, _user_id: &str, mut goal: Goal) -> Result<Goal> {
        goal.validate()?;
        goal.id = new_id();
        goal.progress = 0;
        self.data.write().await.goals.push(goal.clone());
        Ok(goal)
    }

    async fn patch_goal(&self, _user_id: &str, goal_id: &str, patch: GoalPatch) -> Result<Goal> {
        let mut data = self.data.write().await;
        let goal = data
            .goals
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| FlowError::not_found("goal", goal_id))?;
        let mut updated = goal.clone();
        updated.apply(patch);
        updated.validate()?;
        *goal = updated.clone();
        Ok(updated)
    }

    async fn delete_goal(&self, _user_id: &str, goal_id: &str) -> Result<()> {
        let mut data = self.data.write().await;
        let idx = data
            .goals
            .iter()
            .position(|g| g.id == goal_id)
            .ok_or_else(|| FlowError::not_found("goal", goal_id))?;
        data.goals.remove(idx);
        Ok(())
    }

    async fn classes(&self, _user_id: &str) -> Result<Vec<Class>> {
        Ok(self.data.read().await.classes.clone())
    }

    async fn add_class(&self, _user_id: &str, mut class: Class) -> Result<Class> {
        class.validate()?;
        class.id = new_id();
        self.data.write().await.classes.push(class.clone());
        Ok(class)
    }

    async fn messages(&self, _user_id: &str) -> Result<Vec<ChatMessage>> {
        Ok(self.data.read().await.messages.clone())
    }

    async fn send_message(&self, _user_id: &str, content: &str) -> Result<Vec<ChatMessage>> {
        let appended = vec![
            ChatMessage::user(content),
            ChatMessage::assistant(MOCK_ASSISTANT_REPLY),
        ];
        self.data
            .write()
            .await
            .messages
            .extend(appended.iter().cloned());
        Ok(appended)
    }

    async fn preferences(&self, _user_id: &str) -> Result<Preferences> {
        Ok(self.data.read().await.preferences.clone())
    }

    async fn set_preferences(&self, _user_id: &str, prefs: &Preferences) -> Result<Preferences> {
        prefs.validate()?;
        self.data.write().await.preferences = prefs.clone();
        Ok(prefs.clone())
    }
}
