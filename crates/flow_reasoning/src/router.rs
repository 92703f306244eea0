use flow_core::Memory;

use crate::agents::{Agent, ErrorKind, PlanState};
use crate::context::build_context;

/// Run `agents` in order over `state`.
///
/// Context is loaded from memory first. An agent error is recorded in
/// `state.errors` and the chain moves on, unless the error is fatal.
pub async fn run_agent_chain(
    mut state: PlanState,
    agents: &[Box<dyn Agent>],
    memory: &dyn Memory,
    context_items: usize,
) -> PlanState {
    state.errors.clear();
    state.context = build_context(memory, &state.user_id, &state.query, context_items).await;

    for agent in agents {
        match agent.run(&mut state).await {
            Ok(()) => state.completed_agents.push(agent.name().to_string()),
            Err(e) => {
                tracing::warn!("Agent {} failed: {}", agent.name(), e);
                let fatal = e.is_fatal();
                state.record_error(agent.name(), e, ErrorKind::AgentError);
                if fatal {
                    break;
                }
            }
        }
    }
    state
}
