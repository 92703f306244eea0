//! Per-user records: tasks, goals, classes, fixed events, chat history and
//! server-side preferences.
//!
//! Everything lives in one JSON document keyed by user id. Each mutation
//! writes the document back while still holding the write lock and rolls the
//! user back if the write fails, so memory and disk never disagree.

use anyhow::Result;
use flow_core::{
    new_id, sample, ChatMessage, Class, FlowError, Goal, GoalPatch, Preferences, PreferencesPatch,
    ScheduleEvent, Task, TaskPatch,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

use crate::json_file;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserWorkspace {
    pub tasks: Vec<Task>,
    pub goals: Vec<Goal>,
    pub classes: Vec<Class>,
    pub events: Vec<ScheduleEvent>,
    pub messages: Vec<ChatMessage>,
    pub preferences: Preferences,
    /// Last generated schedule.
    pub schedule: Vec<ScheduleEvent>,
}

impl UserWorkspace {
    pub fn sample() -> Self {
        Self {
            tasks: sample::tasks(),
            goals: sample::goals(),
            classes: sample::classes(),
            events: sample::schedule(),
            messages: vec![sample::greeting()],
            preferences: Preferences::default(),
            schedule: Vec::new(),
        }
    }

    /// Goals with their linked counts recomputed from the tasks that point at
    /// them and the classes those tasks belong to.
    fn goals_with_links(&self) -> Vec<Goal> {
        self.goals
            .iter()
            .cloned()
            .map(|mut goal| {
                let linked: Vec<&Task> = self
                    .tasks
                    .iter()
                    .filter(|t| t.goal_id.as_deref() == Some(goal.id.as_str()))
                    .collect();
                let mut class_ids: Vec<&str> =
                    linked.iter().filter_map(|t| t.class_id.as_deref()).collect();
                class_ids.sort_unstable();
                class_ids.dedup();
                goal.linked_task_count = linked.len() as u32;
                goal.linked_class_count = class_ids.len() as u32;
                goal
            })
            .collect()
    }
}

pub struct WorkspaceStore {
    path: Option<PathBuf>,
    seed_sample_data: bool,
    users: RwLock<BTreeMap<String, UserWorkspace>>,
}

fn assign_id(id: &mut String) {
    if id.trim().is_empty() {
        *id = new_id();
    }
}

impl WorkspaceStore {
    pub async fn open(path: impl Into<PathBuf>, seed_sample_data: bool) -> Self {
        let path = path.into();
        let users = json_file::read_or_default(&path).await;
        Self {
            path: Some(path),
            seed_sample_data,
            users: RwLock::new(users),
        }
    }

    /// Not backed by a file; used by tests and the offline client.
    pub fn in_memory(seed_sample_data: bool) -> Self {
        Self {
            path: None,
            seed_sample_data,
            users: RwLock::new(BTreeMap::new()),
        }
    }

    async fn save(&self, users: &BTreeMap<String, UserWorkspace>) -> Result<()> {
        match &self.path {
            Some(path) => json_file::write_atomic(path, users).await,
            None => Ok(()),
        }
    }

    fn fresh(&self) -> UserWorkspace {
        if self.seed_sample_data {
            UserWorkspace::sample()
        } else {
            UserWorkspace::default()
        }
    }

    /// Snapshot of a user's workspace (fresh one if the user is unknown).
    pub async fn snapshot(&self, user_id: &str) -> UserWorkspace {
        self.users
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| self.fresh())
    }

    /// Run `f` against a copy of the user's workspace, persist it and only
    /// then make it visible. A failed closure or write leaves memory as it was.
    async fn mutate<T>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut UserWorkspace) -> Result<T>,
    ) -> Result<T> {
        let mut users = self.users.write().await;
        let previous = users.get(user_id).cloned();
        let mut ws = previous.clone().unwrap_or_else(|| self.fresh());
        let out = f(&mut ws)?;

        users.insert(user_id.to_string(), ws);
        if let Err(e) = self.save(&users).await {
            match previous {
                Some(prev) => users.insert(user_id.to_string(), prev),
                None => users.remove(user_id),
            };
            return Err(e);
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    pub async fn tasks(&self, user_id: &str) -> Vec<Task> {
        self.snapshot(user_id).await.tasks
    }

    pub async fn add_task(&self, user_id: &str, mut task: Task) -> Result<Task> {
        task.validate()?;
        assign_id(&mut task.id);
        self.mutate(user_id, |ws| {
            ws.tasks.push(task.clone());
            Ok(task)
        })
        .await
    }

    /// Insert or replace by id.
    pub async fn upsert_task(&self, user_id: &str, mut task: Task) -> Result<Task> {
        task.validate()?;
        assign_id(&mut task.id);
        self.mutate(user_id, |ws| {
            match ws.tasks.iter_mut().find(|t| t.id == task.id) {
                Some(existing) => *existing = task.clone(),
                None => ws.tasks.push(task.clone()),
            }
            Ok(task)
        })
        .await
    }

    pub async fn update_task(&self, user_id: &str, task_id: &str, patch: TaskPatch) -> Result<Task> {
        self.mutate(user_id, |ws| {
            let task = ws
                .tasks
                .iter_mut()
                .find(|t| t.id == task_id)
                .ok_or_else(|| FlowError::not_found("task", task_id))?;
            let mut updated = task.clone();
            updated.apply(patch);
            updated.validate()?;
            *task = updated.clone();
            Ok(updated)
        })
        .await
    }

    pub async fn delete_task(&self, user_id: &str, task_id: &str) -> Result<()> {
        self.mutate(user_id, |ws| {
            let idx = ws
                .tasks
                .iter()
                .position(|t| t.id == task_id)
                .ok_or_else(|| FlowError::not_found("task", task_id))?;
            ws.tasks.remove(idx);
            Ok(())
        })
        .await
    }

    // ------------------------------------------------------------------
    // Goals
    // ------------------------------------------------------------------

    pub async fn goals(&self, user_id: &str) -> Vec<Goal> {
        self.snapshot(user_id).await.goals_with_links()
    }

    pub async fn add_goal(&self, user_id: &str, mut goal: Goal) -> Result<Goal> {
        goal.validate()?;
        assign_id(&mut goal.id);
        self.mutate(user_id, |ws| {
            ws.goals.push(goal.clone());
            Ok(goal)
        })
        .await
    }

    pub async fn update_goal(&self, user_id: &str, goal_id: &str, patch: GoalPatch) -> Result<Goal> {
        self.mutate(user_id, |ws| {
            let goal = ws
                .goals
                .iter_mut()
                .find(|g| g.id == goal_id)
                .ok_or_else(|| FlowError::not_found("goal", goal_id))?;
            let mut updated = goal.clone();
            updated.apply(patch);
            updated.validate()?;
            *goal = updated.clone();
            Ok(updated)
        })
        .await
    }

    pub async fn delete_goal(&self, user_id: &str, goal_id: &str) -> Result<()> {
        self.mutate(user_id, |ws| {
            let idx = ws
                .goals
                .iter()
                .position(|g| g.id == goal_id)
                .ok_or_else(|| FlowError::not_found("goal", goal_id))?;
            ws.goals.remove(idx);
            Ok(())
        })
        .await
    }

    // ------------------------------------------------------------------
    // Classes, fixed events, chat
    // ------------------------------------------------------------------

    pub async fn classes(&self, user_id: &str) -> Vec<Class> {
        self.snapshot(user_id).await.classes
    }

    pub async fn add_class(&self, user_id: &str, mut class: Class) -> Result<Class> {
        class.validate()?;
        assign_id(&mut class.id);
        self.mutate(user_id, |ws| {
            ws.classes.push(class.clone());
            Ok(class)
        })
        .await
    }

    pub async fn events(&self, user_id: &str) -> Vec<ScheduleEvent> {
        self.snapshot(user_id).await.events
    }

    pub async fn add_event(&self, user_id: &str, mut event: ScheduleEvent) -> Result<ScheduleEvent> {
        event.validate()?;
        assign_id(&mut event.id);
        event.is_ai_generated = false;
        self.mutate(user_id, |ws| {
            ws.events.push(event.clone());
            Ok(event)
        })
        .await
    }

    pub async fn messages(&self, user_id: &str) -> Vec<ChatMessage> {
        self.snapshot(user_id).await.messages
    }

    /// Append in order; the history is never reordered.
    pub async fn append_messages(&self, user_id: &str, messages: Vec<ChatMessage>) -> Result<()> {
        self.mutate(user_id, |ws| {
            ws.messages.extend(messages);
            Ok(())
        })
        .await
    }

    // ------------------------------------------------------------------
    // Preferences & last schedule
    // ------------------------------------------------------------------

    pub async fn preferences(&self, user_id: &str) -> Preferences {
        self.snapshot(user_id).await.preferences
    }

    pub async fn set_preferences(&self, user_id: &str, prefs: Preferences) -> Result<Preferences> {
        prefs.validate()?;
        self.mutate(user_id, |ws| {
            ws.preferences = prefs.clone();
            Ok(prefs)
        })
        .await
    }

    pub async fn update_preferences(
        &self,
        user_id: &str,
        patch: PreferencesPatch,
    ) -> Result<Preferences> {
        self.mutate(user_id, |ws| {
            let mut next = ws.preferences.clone();
            next.apply(patch);
            next.validate()?;
            ws.preferences = next.clone();
            Ok(next)
        })
        .await
    }

    pub async fn store_schedule(&self, user_id: &str, schedule: Vec<ScheduleEvent>) -> Result<()> {
        self.mutate(user_id, |ws| {
            ws.schedule = schedule;
            Ok(())
        })
        .await
    }
}
