use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

use crate::errors::ProviderResult;
use crate::models::message::Message;
use crate::models::tool::{Tool, ToolCall};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, other: Self) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// The outcome of one round-trip with a backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Text produced by the assistant, possibly empty
    pub assistant_text: String,
    /// Tool calls requested by the assistant, in the order the backend issued them
    pub tool_calls: Vec<ToolCall>,
    /// Token usage, when the backend reports it
    pub usage: Option<Usage>,
}

impl Response {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            assistant_text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_tool_call(mut self, tool_call: ToolCall) -> Self {
        self.tool_calls.push(tool_call);
        self
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Base trait for AI providers (Gemini, Ollama, etc)
#[async_trait]
pub trait Provider: Send + Sync {
    /// The model identifier requests are sent to
    fn model(&self) -> &str;

    /// Send the conversation and the available tools to the backend and
    /// translate its reply. Implementations must not mutate their inputs.
    async fn chat(&self, messages: &[Message], tools: &[Tool]) -> ProviderResult<Response>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_usage_accumulates() {
        let mut total = Usage::default();
        total += Usage::new(10, 20);
        total += Usage::new(5, 1);
        assert_eq!(total, Usage::new(15, 21));
        assert_eq!(total.total_tokens(), 36);
    }

    #[test]
    fn test_usage_serialization() -> anyhow::Result<()> {
        let usage = Usage::new(10, 20);
        let serialized = serde_json::to_string(&usage)?;
        let deserialized: Usage = serde_json::from_str(&serialized)?;
        assert_eq!(usage, deserialized);

        let json_value: serde_json::Value = serde_json::from_str(&serialized)?;
        assert_eq!(json_value["input_tokens"], json!(10));
        assert_eq!(json_value["output_tokens"], json!(20));
        Ok(())
    }

    #[test]
    fn test_negative_usage_is_rejected() {
        assert!(serde_json::from_value::<Usage>(json!({"input_tokens": -1, "output_tokens": 0})).is_err());
    }

    #[test]
    fn test_response_builder() {
        let response = Response::text("Working on it")
            .with_tool_call(ToolCall::new("get_files_info", Default::default()))
            .with_usage(Usage::new(3, 4));
        assert_eq!(response.assistant_text, "Working on it");
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.usage, Some(Usage::new(3, 4)));
    }
}
