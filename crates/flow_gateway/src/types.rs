use flow_core::{Goal, Task, TaskFeedback, DEFAULT_USER};
use flow_reasoning::{AgentErrorRecord, Conflict, PlanState};
use flow_core::ScheduleEvent;
use serde::{Deserialize, Serialize};

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

/// POST /get_schedule
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleRequest {
    #[serde(default = "default_user")]
    pub user_id: String,
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub schedule: Vec<ScheduleEvent>,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub coach_messages: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
    #[serde(default)]
    pub errors: Vec<AgentErrorRecord>,
}

impl From<PlanState> for ScheduleResponse {
    fn from(state: PlanState) -> Self {
        Self {
            schedule: state.schedule,
            intent: state.parsed.map(|p| p.intent),
            coach_messages: state.coach_messages,
            concerns: state.concerns,
            suggestions: state.suggestions,
            conflicts: state.conflicts,
            errors: state.errors,
        }
    }
}

/// POST /chat_command
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCommandRequest {
    #[serde(default = "default_user")]
    pub user_id: String,
    #[serde(default)]
    pub command: String,
}

/// POST /update_task
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default = "default_user")]
    pub user_id: String,
    pub task: Option<Task>,
}

/// POST /add_goal
#[derive(Debug, Clone, Deserialize)]
pub struct AddGoalRequest {
    #[serde(default = "default_user")]
    pub user_id: String,
    pub goal: Option<Goal>,
}

/// POST /feedback
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
    #[serde(default = "default_user")]
    pub user_id: String,
    pub feedback: Option<TaskFeedback>,
}

/// POST /users/{user}/messages
#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageRequest {
    pub content: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub const OK: OkResponse = OkResponse { ok: true };
}
