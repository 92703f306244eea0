use std::sync::Arc;

use async_trait::async_trait;
use flow_core::{FlowError, FlowResult};

use super::{Agent, ErrorKind, PlanState};
use crate::llm::{generate, CompletionParams, LlmClient};
use crate::prompts;
use crate::response::{parse_reply, CoachReply};

pub struct CoachAgent {
    llm: Arc<dyn LlmClient>,
    params: CompletionParams,
}

impl CoachAgent {
    pub fn new(llm: Arc<dyn LlmClient>, params: CompletionParams) -> Self {
        Self { llm, params }
    }
}

pub fn fallback_message(planned: usize) -> String {
    format!("Planned {planned} tasks. Good luck!")
}

#[async_trait]
impl Agent for CoachAgent {
    fn name(&self) -> &'static str {
        "coach"
    }

    async fn run(&self, state: &mut PlanState) -> FlowResult<()> {
        let planned = state.planned_tasks().count();
        let system = prompts::coach_system(&state.preferences);
        let prompt = prompts::coach_prompt(&state.context, &state.schedule, &state.preferences);

        let text = match generate(self.llm.as_ref(), &system, &prompt, self.params).await {
            Ok(text) => text,
            Err(e) => {
                state.coach_messages.push(fallback_message(planned));
                return Err(FlowError::Llm(format!("{e:#}")));
            }
        };

        match parse_reply::<CoachReply>(&text) {
            Ok(reply) => {
                state
                    .coach_messages
                    .push(reply.message.unwrap_or_else(|| fallback_message(planned)));
                state.concerns.extend(reply.concerns);
                state.suggestions.extend(reply.suggestions);
            }
            Err(e) => {
                state.coach_messages.push(fallback_message(planned));
                state.record_error(self.name(), e, ErrorKind::ParseError);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_types::{Message, MessagesResponse};

    struct Canned(&'static str);

    #[async_trait]
    impl LlmClient for Canned {
        async fn complete(
            &self,
            _system: &str,
            _messages: Vec<Message>,
            _params: CompletionParams,
        ) -> anyhow::Result<MessagesResponse> {
            Ok(MessagesResponse {
                text: self.0.to_string(),
                stop_reason: None,
                usage: None,
            })
        }
    }

    #[tokio::test]
    async fn test_reply_collected() {
        let coach = CoachAgent::new(
            Arc::new(Canned(r#"{"message": "Nice plan", "concerns": ["late"], "suggestions": ["sleep"]}"#)),
            CompletionParams::default(),
        );
        let mut state = PlanState::new("u", "q");
        coach.run(&mut state).await.unwrap();
        assert_eq!(state.coach_messages, vec!["Nice plan"]);
        assert_eq!(state.concerns, vec!["late"]);
        assert_eq!(state.suggestions, vec!["sleep"]);
    }

    #[tokio::test]
    async fn test_garbage_falls_back() {
        let coach = CoachAgent::new(Arc::new(Canned("I am not JSON")), CompletionParams::default());
        let mut state = PlanState::new("u", "q");
        coach.run(&mut state).await.unwrap();
        assert_eq!(state.coach_messages, vec!["Planned 0 tasks. Good luck!"]);
        assert_eq!(state.errors.len(), 1);
        assert_eq!(state.errors[0].kind, ErrorKind::ParseError);
    }
}
