use std::sync::Arc;

use async_trait::async_trait;
use flow_core::{FlowError, FlowResult};

use super::{Agent, ErrorKind, ParsedIntent, PlanState};
use crate::llm::{generate, CompletionParams, LlmClient};
use crate::prompts;
use crate::response::parse_reply;

pub struct ParserAgent {
    llm: Arc<dyn LlmClient>,
    params: CompletionParams,
}

impl ParserAgent {
    pub fn new(llm: Arc<dyn LlmClient>, params: CompletionParams) -> Self {
        Self { llm, params }
    }
}

#[async_trait]
impl Agent for ParserAgent {
    fn name(&self) -> &'static str {
        "parser"
    }

    async fn run(&self, state: &mut PlanState) -> FlowResult<()> {
        let prompt = prompts::parser_prompt(&state.context, &state.query);
        let text = match generate(self.llm.as_ref(), prompts::PARSER_SYSTEM, &prompt, self.params).await
        {
            Ok(text) => text,
            Err(e) => {
                state.parsed = Some(ParsedIntent::general());
                return Err(FlowError::Llm(format!("{e:#}")));
            }
        };

        match parse_reply::<ParsedIntent>(&text) {
            Ok(parsed) => {
                tracing::debug!("Parsed intent: {}", parsed.intent);
                state.parsed = Some(parsed);
            }
            Err(e) => {
                state.parsed = Some(ParsedIntent::general());
                state.record_error(self.name(), e, ErrorKind::ParseError);
            }
        }
        Ok(())
    }
}
