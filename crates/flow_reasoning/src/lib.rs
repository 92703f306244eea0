pub mod agents;
pub mod api_types;
pub mod context;
pub mod llm;
pub mod planner;
pub mod prompts;
pub mod providers;
pub mod response;
pub mod retry;
pub mod router;

pub use agents::{Agent, AgentErrorRecord, Conflict, ErrorKind, ParsedIntent, PlanState, Slot};
pub use llm::{CompletionParams, LlmClient};
pub use planner::{ChatReply, Planner};
pub use router::run_agent_chain;
