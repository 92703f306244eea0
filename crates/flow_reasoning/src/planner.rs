//! Entry points the gateway calls: plan a day, answer a chat command, record
//! tasks, goals and feedback.

use std::sync::Arc;

use anyhow::Result;
use flow_core::{ChatMessage, FlowError, Goal, Memory, Task, TaskFeedback};
use flow_memory::{LocalMemory, SchedulingInsights, WorkspaceStore};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::agents::{
    Agent, AllocatorAgent, CoachAgent, ConflictResolverAgent, ConstraintAgent, ParserAgent,
    PlanState,
};
use crate::llm::{CompletionParams, LlmClient};
use crate::router::run_agent_chain;

pub const DEFAULT_CONTEXT_ITEMS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default)]
    pub concerns: Vec<String>,
}

pub struct Planner {
    llm: Arc<dyn LlmClient>,
    memory: Arc<LocalMemory>,
    workspace: Arc<WorkspaceStore>,
    params: CompletionParams,
    context_items: usize,
}

impl Planner {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        memory: Arc<LocalMemory>,
        workspace: Arc<WorkspaceStore>,
    ) -> Self {
        Self {
            llm,
            memory,
            workspace,
            params: CompletionParams::default(),
            context_items: DEFAULT_CONTEXT_ITEMS,
        }
    }

    pub fn with_params(mut self, params: CompletionParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_context_items(mut self, n: usize) -> Self {
        self.context_items = n;
        self
    }

    pub fn memory(&self) -> &Arc<LocalMemory> {
        &self.memory
    }

    pub fn workspace(&self) -> &Arc<WorkspaceStore> {
        &self.workspace
    }

    fn agents(&self) -> Vec<Box<dyn Agent>> {
        vec![
            Box::new(ParserAgent::new(self.llm.clone(), self.params)),
            Box::new(ConstraintAgent),
            Box::new(AllocatorAgent),
            Box::new(ConflictResolverAgent),
            Box::new(CoachAgent::new(self.llm.clone(), self.params)),
        ]
    }

    async fn initial_state(&self, user_id: &str, query: &str) -> PlanState {
        let ws = self.workspace.snapshot(user_id).await;
        let mut state = PlanState::new(user_id, query);
        state.tasks = ws.tasks.into_iter().filter(|t| !t.completed).collect();
        state.fixed_events = ws.events;
        state.preferences = ws.preferences;
        state
    }

    /// Run the full agent chain for `query` and remember the result.
    #[tracing::instrument(skip(self), fields(user = %user_id))]
    pub async fn get_schedule(&self, user_id: &str, query: &str) -> Result<PlanState> {
        if query.trim().is_empty() {
            return Err(FlowError::validation("Query is required").into());
        }
        let state = self.initial_state(user_id, query).await;
        let mut state =
            run_agent_chain(state, &self.agents(), self.memory.as_ref(), self.context_items).await;

        self.memory
            .adjust_schedule_weights(user_id, &mut state.schedule)
            .await;
        self.workspace
            .store_schedule(user_id, state.schedule.clone())
            .await?;

        let intent = state.parsed.as_ref().map(|p| p.intent.clone());
        self.memory
            .persist(
                user_id,
                json!({"type": "query", "query": query, "intent": intent}),
                vec!["query".to_string()],
            )
            .await?;

        tracing::info!(
            "Planned {} events with {} errors",
            state.schedule.len(),
            state.errors.len()
        );
        Ok(state)
    }

    /// Chat goes through the same chain; the coach's words are the reply.
    pub async fn chat_command(&self, user_id: &str, command: &str) -> Result<ChatReply> {
        if command.trim().is_empty() {
            return Err(FlowError::validation("Command is required").into());
        }
        let state = self.get_schedule(user_id, command).await?;
        let reply = if state.coach_messages.is_empty() {
            crate::agents::coach::fallback_message(state.planned_tasks().count())
        } else {
            state.coach_messages.join("\n")
        };
        Ok(ChatReply {
            reply,
            concerns: state.concerns,
        })
    }

    /// Append a user message and the coach's answer to the chat history.
    pub async fn converse(&self, user_id: &str, content: &str) -> Result<Vec<ChatMessage>> {
        let user_msg = ChatMessage::user(content);
        let reply = self.chat_command(user_id, content).await?;
        let messages = vec![user_msg, ChatMessage::assistant(reply.reply)];
        self.workspace
            .append_messages(user_id, messages.clone())
            .await?;
        Ok(messages)
    }

    /// Insert or replace a task, and remember it.
    pub async fn update_task(&self, user_id: &str, task: Task) -> Result<Task> {
        let task = self.workspace.upsert_task(user_id, task).await?;
        let mut item = serde_json::to_value(&task)?;
        item["type"] = json!("task");
        self.memory.persist(user_id, item, vec!["task".into()]).await?;
        Ok(task)
    }

    pub async fn add_goal(&self, user_id: &str, goal: Goal) -> Result<Goal> {
        let goal = self.workspace.add_goal(user_id, goal).await?;
        let mut item = serde_json::to_value(&goal)?;
        item["type"] = json!("goal");
        self.memory.persist(user_id, item, vec!["goal".into()]).await?;
        Ok(goal)
    }

    pub async fn record_feedback(&self, user_id: &str, feedback: TaskFeedback) -> Result<()> {
        self.memory.add_feedback(user_id, feedback).await
    }

    pub async fn insights(&self, user_id: &str) -> SchedulingInsights {
        self.memory.scheduling_insights(user_id).await
    }
}
