//! Planning agents and the state they pass along.
//!
//! Each agent reads what earlier agents left in [`PlanState`] and adds its
//! own piece: intent, free slots, allocated events, conflicts, coaching.

pub mod allocator;
pub mod coach;
pub mod conflict;
pub mod constraint;
pub mod parser;

pub use allocator::AllocatorAgent;
pub use coach::CoachAgent;
pub use conflict::{Conflict, ConflictResolverAgent};
pub use constraint::{ConstraintAgent, Slot};
pub use parser::ParserAgent;

use async_trait::async_trait;
use flow_core::{FlowResult, Preferences, ScheduleEvent, Task};
use serde::{Deserialize, Serialize};

pub use crate::response::ParsedIntent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The agent itself failed.
    AgentError,
    /// The model answered but its output was unusable.
    ParseError,
    /// Failure outside any agent (context building).
    SystemError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentErrorRecord {
    pub agent: String,
    pub error: String,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanState {
    pub user_id: String,
    pub query: String,
    pub context: Vec<String>,
    pub tasks: Vec<Task>,
    pub fixed_events: Vec<ScheduleEvent>,
    pub preferences: Preferences,
    pub parsed: Option<ParsedIntent>,
    pub available_slots: Vec<Slot>,
    pub schedule: Vec<ScheduleEvent>,
    pub conflicts: Vec<Conflict>,
    pub coach_messages: Vec<String>,
    pub concerns: Vec<String>,
    pub suggestions: Vec<String>,
    pub errors: Vec<AgentErrorRecord>,
    pub completed_agents: Vec<String>,
}

impl PlanState {
    pub fn new(user_id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn record_error(&mut self, agent: &str, error: impl ToString, kind: ErrorKind) {
        self.errors.push(AgentErrorRecord {
            agent: agent.to_string(),
            error: error.to_string(),
            kind,
        });
    }

    /// Allocated work, breaks excluded.
    pub fn planned_tasks(&self) -> impl Iterator<Item = &ScheduleEvent> {
        self.schedule.iter().filter(|e| !e.is_break())
    }
}

#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &'static str;

    /// Mutate the shared state. A returned error is recorded by the router;
    /// only [`flow_core::FlowError::Fatal`] stops the chain.
    async fn run(&self, state: &mut PlanState) -> FlowResult<()>;
}
