use std::sync::Arc;

use crate::errors::{AgentError, AgentResult};
use crate::models::content::ToolPayload;
use crate::models::message::Message;
use crate::models::tool::ToolCall;
use crate::providers::base::{Provider, Usage};
use crate::registry::ToolRegistry;

pub const DEFAULT_MAX_STEPS: usize = 20;
pub const DEFAULT_DONE_PHRASE: &str = "Job's done.";

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Seeded as the first conversation entry when set
    pub system_prompt: Option<String>,
    /// Maximum number of backend round-trips in one run
    pub max_steps: usize,
    /// Substring of assistant text that ends the run
    pub done_phrase: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: None,
            max_steps: DEFAULT_MAX_STEPS,
            done_phrase: DEFAULT_DONE_PHRASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The completion marker appeared in assistant text
    Done,
    /// The step budget ran out first; the text is the last one captured
    StepBudgetExhausted,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub text: String,
    pub status: RunStatus,
    pub usage: Usage,
    /// Number of round-trips performed
    pub steps: usize,
    pub messages: Vec<Message>,
}

/// Agent drives a provider through repeated round-trips, running the tools it asks for
pub struct Agent {
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    pub fn new(provider: Arc<dyn Provider>, registry: Arc<ToolRegistry>, config: AgentConfig) -> Self {
        Self {
            provider,
            registry,
            config,
        }
    }

    /// Run the loop for a single prompt.
    ///
    /// Only a failing provider ends the run with an error. Tool problems are
    /// recorded in the conversation as error payloads and the loop carries on.
    pub async fn run(&self, prompt: &str) -> AgentResult<RunOutcome> {
        let mut messages = Vec::new();
        if let Some(system_prompt) = &self.config.system_prompt {
            messages.push(Message::system(system_prompt.as_str()));
        }
        messages.push(Message::user(prompt));

        let tools = self.registry.tools();
        let mut usage = Usage::default();
        let mut final_response = String::new();

        for step in 0..self.config.max_steps {
            let response = self.provider.chat(&messages, tools).await?;

            if let Some(step_usage) = response.usage {
                usage += step_usage;
            }
            tracing::info!(
                step,
                model = %self.provider.model(),
                input_tokens = response.usage.map_or(0, |u| u.input_tokens),
                output_tokens = response.usage.map_or(0, |u| u.output_tokens),
                tool_calls = response.tool_calls.len(),
                "round-trip complete"
            );

            if !response.assistant_text.is_empty() {
                tracing::info!(step, text = %response.assistant_text, "assistant");
                messages.push(Message::assistant(response.assistant_text.as_str()));
                final_response = response.assistant_text;

                if final_response.contains(&self.config.done_phrase) {
                    if !response.tool_calls.is_empty() {
                        tracing::debug!(
                            discarded = response.tool_calls.len(),
                            "completion marker seen, skipping pending tool calls"
                        );
                    }
                    return Ok(self.finish(final_response, RunStatus::Done, usage, step + 1, messages));
                }
            }

            for call in response.tool_calls {
                let payload = self.dispatch_tool_call(&call).await;
                messages.push(Message::tool(call.name, call.id, &payload)?);
            }
        }

        Ok(self.finish(
            final_response,
            RunStatus::StepBudgetExhausted,
            usage,
            self.config.max_steps,
            messages,
        ))
    }

    /// Execute a single tool call, folding every failure into an error payload
    async fn dispatch_tool_call(&self, call: &ToolCall) -> ToolPayload {
        tracing::info!(tool = %call.name, "calling tool");

        let result = match self.registry.get(&call.name) {
            Some(tool) => tool.call(call.arguments.clone()).await,
            None => Err(AgentError::ToolNotFound(call.name.clone())),
        };

        match result {
            Ok(value) => ToolPayload::Result(value),
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "tool call failed");
                ToolPayload::Error(e.to_string())
            }
        }
    }

    fn finish(
        &self,
        text: String,
        status: RunStatus,
        usage: Usage,
        steps: usize,
        messages: Vec<Message>,
    ) -> RunOutcome {
        tracing::info!(
            model = %self.provider.model(),
            ?status,
            steps,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "run finished"
        );
        RunOutcome {
            text,
            status,
            usage,
            steps,
            messages,
        }
    }
}
