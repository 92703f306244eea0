//! Domain records: tasks, schedule events, goals, classes and chat messages.
//!
//! All of these are plain value records. Wire names are camelCase so the
//! same JSON flows between the web client, the mobile client and the gateway.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FlowError, FlowResult};

/// Generate a fresh record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..12].to_string()
}

// ============================================================================
// Eisenhower quadrant
// ============================================================================

/// Declaration order is scheduling precedence.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Quadrant {
    UrgentImportant,
    NotUrgentImportant,
    UrgentNotImportant,
    #[default]
    NotUrgentNotImportant,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::UrgentImportant,
        Quadrant::NotUrgentImportant,
        Quadrant::UrgentNotImportant,
        Quadrant::NotUrgentNotImportant,
    ];

    pub fn from_flags(urgent: bool, important: bool) -> Self {
        match (urgent, important) {
            (true, true) => Quadrant::UrgentImportant,
            (false, true) => Quadrant::NotUrgentImportant,
            (true, false) => Quadrant::UrgentNotImportant,
            (false, false) => Quadrant::NotUrgentNotImportant,
        }
    }

    pub fn is_urgent(&self) -> bool {
        matches!(
            self,
            Quadrant::UrgentImportant | Quadrant::UrgentNotImportant
        )
    }

    pub fn is_important(&self) -> bool {
        matches!(
            self,
            Quadrant::UrgentImportant | Quadrant::NotUrgentImportant
        )
    }

    /// Priority label attached to an allocated event.
    pub fn schedule_priority(&self) -> SchedulePriority {
        match self {
            Quadrant::UrgentImportant => SchedulePriority::High,
            Quadrant::NotUrgentImportant => SchedulePriority::Medium,
            _ => SchedulePriority::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quadrant::UrgentImportant => "Do first",
            Quadrant::NotUrgentImportant => "Schedule",
            Quadrant::UrgentNotImportant => "Delegate",
            Quadrant::NotUrgentNotImportant => "Eliminate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulePriority {
    High,
    Medium,
    Low,
}

// ============================================================================
// Tasks
// ============================================================================

fn default_estimated_minutes() -> u32 {
    60
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_estimated_minutes")]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub priority: Quadrant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
}

impl Task {
    pub fn new(title: impl Into<String>, estimated_minutes: u32, priority: Quadrant) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            description: None,
            estimated_minutes,
            priority,
            category: None,
            completed: false,
            goal_id: None,
            class_id: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn validate(&self) -> FlowResult<()> {
        if self.title.trim().is_empty() {
            return Err(FlowError::validation("task title must not be empty"));
        }
        if self.estimated_minutes == 0 {
            return Err(FlowError::validation(
                "task estimated minutes must be positive",
            ));
        }
        Ok(())
    }

    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.description {
            self.description = Some(v);
        }
        if let Some(v) = patch.estimated_minutes {
            self.estimated_minutes = v;
        }
        if let Some(v) = patch.priority {
            self.priority = v;
        }
        if let Some(v) = patch.category {
            self.category = Some(v);
        }
        if let Some(v) = patch.completed {
            self.completed = v;
        }
        if let Some(v) = patch.goal_id {
            self.goal_id = Some(v);
        }
        if let Some(v) = patch.class_id {
            self.class_id = Some(v);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub estimated_minutes: Option<u32>,
    pub priority: Option<Quadrant>,
    pub category: Option<String>,
    pub completed: Option<bool>,
    pub goal_id: Option<String>,
    pub class_id: Option<String>,
}

// ============================================================================
// Schedule events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEvent {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(alias = "startTime")]
    pub start: NaiveDateTime,
    #[serde(alias = "endTime")]
    pub end: NaiveDateTime,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<SchedulePriority>,
    #[serde(default)]
    pub is_ai_generated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_weight: Option<f64>,
}

impl ScheduleEvent {
    /// A fixed (user-entered) event such as a lecture or an exam.
    pub fn fixed(
        title: impl Into<String>,
        category: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            start,
            end,
            category: category.into(),
            priority: None,
            is_ai_generated: false,
            task_id: None,
            completed: false,
            location: None,
            slot_weight: None,
        }
    }

    pub fn validate(&self) -> FlowResult<()> {
        if self.title.trim().is_empty() {
            return Err(FlowError::validation("event title must not be empty"));
        }
        if self.start >= self.end {
            return Err(FlowError::validation(format!(
                "event '{}' starts at {} which is not before its end {}",
                self.title, self.start, self.end
            )));
        }
        Ok(())
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Half-open interval overlap.
    pub fn overlaps(&self, other: &ScheduleEvent) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn is_break(&self) -> bool {
        self.category == "break"
    }

    /// (hour, weekday with Monday = 0) of the event start.
    pub fn slot_key(&self) -> (u32, u32) {
        (
            self.start.hour(),
            self.start.weekday().num_days_from_monday(),
        )
    }
}

// ============================================================================
// Goals & classes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    /// Percent, 0-100.
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub linked_task_count: u32,
    #[serde(default)]
    pub linked_class_count: u32,
}

impl Goal {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            description: None,
            deadline: None,
            progress: 0,
            linked_task_count: 0,
            linked_class_count: 0,
        }
    }

    pub fn validate(&self) -> FlowResult<()> {
        if self.title.trim().is_empty() {
            return Err(FlowError::validation("goal title must not be empty"));
        }
        if self.progress > 100 {
            return Err(FlowError::validation(format!(
                "goal progress must be 0-100, got {}",
                self.progress
            )));
        }
        Ok(())
    }

    pub fn apply(&mut self, patch: GoalPatch) {
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.description {
            self.description = Some(v);
        }
        if let Some(v) = patch.deadline {
            self.deadline = Some(v);
        }
        if let Some(v) = patch.progress {
            self.progress = v.min(100);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub progress: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, alias = "professor", skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syllabus: Option<String>,
}

impl Class {
    pub fn validate(&self) -> FlowResult<()> {
        if self.title.trim().is_empty() {
            return Err(FlowError::validation("class title must not be empty"));
        }
        Ok(())
    }
}

// ============================================================================
// Chat
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    #[serde(alias = "type")]
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

// ============================================================================
// Feedback
// ============================================================================

/// How a scheduled task actually went.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskFeedback {
    pub task_id: String,
    pub scheduled_start: NaiveDateTime,
    pub scheduled_end: NaiveDateTime,
    #[serde(default)]
    pub actual_start: Option<NaiveDateTime>,
    #[serde(default)]
    pub actual_end: Option<NaiveDateTime>,
    #[serde(default)]
    pub completed: bool,
    /// 1-5
    pub energy_level: u8,
    /// 1-5
    pub difficulty: u8,
    /// 1-5
    pub satisfaction: u8,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TaskFeedback {
    pub fn validate(&self) -> FlowResult<()> {
        for (name, value) in [
            ("energy_level", self.energy_level),
            ("difficulty", self.difficulty),
            ("satisfaction", self.satisfaction),
        ] {
            if !(1..=5).contains(&value) {
                return Err(FlowError::validation(format!(
                    "{name} must be between 1 and 5, got {value}"
                )));
            }
        }
        if self.scheduled_start >= self.scheduled_end {
            return Err(FlowError::validation(
                "feedback scheduled window is empty",
            ));
        }
        Ok(())
    }

    /// Actual minus scheduled duration, when both actual bounds are known.
    pub fn duration_delta_minutes(&self) -> Option<i64> {
        let (start, end) = (self.actual_start?, self.actual_end?);
        let actual = (end - start).num_minutes();
        let planned = (self.scheduled_end - self.scheduled_start).num_minutes();
        Some(actual - planned)
    }
}
