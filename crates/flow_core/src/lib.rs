pub mod config;
pub mod error;
pub mod focus;
pub mod model;
pub mod preferences;
pub mod sample;

pub use config::FlowConfig;
pub use error::{FlowError, FlowResult};
pub use focus::{FocusPhase, FocusSnapshot, FocusStatus, FocusTimer, PhaseChange};
pub use model::{
    new_id, ChatMessage, ChatRole, Class, Goal, GoalPatch, Quadrant, ScheduleEvent,
    SchedulePriority, Task, TaskFeedback, TaskPatch,
};
pub use preferences::{
    BreakRatio, CoachPersonality, EnergyTracking, Preferences, PreferencesPatch,
};

/// Fallback user id when a request does not name one.
pub const DEFAULT_USER: &str = "default";

use async_trait::async_trait;

/// Long-term memory the planner draws context from.
#[async_trait]
pub trait Memory: Send + Sync {
    /// Append an item for `user_id`.
    async fn persist(
        &self,
        user_id: &str,
        item: serde_json::Value,
        tags: Vec<String>,
    ) -> anyhow::Result<()>;

    /// Up to `limit` items relevant to `query`, falling back to the most
    /// recent ones.
    async fn retrieve(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<serde_json::Value>>;
}
