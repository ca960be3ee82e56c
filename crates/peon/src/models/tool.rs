use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

use crate::errors::AgentResult;

/// Named arguments passed to a tool, keyed by parameter name
pub type ToolArguments = Map<String, Value>;

/// The callable bound to a tool descriptor
pub type ToolFunction =
    Arc<dyn Fn(ToolArguments) -> BoxFuture<'static, AgentResult<Value>> + Send + Sync>;

/// A tool that can be used by a model.
#[derive(Clone)]
pub struct Tool {
    /// The name of the tool
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// A json schema of the function signature
    pub parameters: Value,
    /// The function that powers the tool
    pub function: ToolFunction,
}

impl Tool {
    /// Create a new tool from its declaration and the async function implementing it
    pub fn new<N, D, F, Fut>(name: N, description: D, parameters: Value, function: F) -> Self
    where
        N: Into<String>,
        D: Into<String>,
        F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AgentResult<Value>> + Send + 'static,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            parameters,
            function: Arc::new(move |args| function(args).boxed()),
        }
    }

    /// Invoke the bound function with the given named arguments
    pub async fn call(&self, arguments: ToolArguments) -> AgentResult<Value> {
        (self.function)(arguments).await
    }
}

impl Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("function", &"<function>")
            .finish()
    }
}

/// A request from the model to execute a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id, when the backend protocol issues one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The name of the tool to execute
    pub name: String,
    /// The arguments for the execution
    #[serde(default)]
    pub arguments: ToolArguments,
}

impl ToolCall {
    pub fn new<S: Into<String>>(name: S, arguments: ToolArguments) -> Self {
        Self {
            id: None,
            name: name.into(),
            arguments,
        }
    }

    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AgentError;
    use serde_json::json;

    fn get_current_weather() -> Tool {
        Tool::new(
            "get_current_weather",
            "Get the current weather in a given location",
            json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "The city and state, e.g. San Francisco, CA"
                    }
                },
                "required": ["location"],
                "additionalProperties": false
            }),
            |args| async move {
                let location = args
                    .get("location")
                    .and_then(Value::as_str)
                    .ok_or_else(|| AgentError::InvalidParameters("Missing 'location'".into()))?;
                Ok(json!({ "location": location, "temperature": 72 }))
            },
        )
    }

    #[tokio::test]
    async fn test_basic_tool_call() {
        let tool = get_current_weather();
        assert_eq!(tool.name, "get_current_weather");

        let args = json!({"location": "Chicago, IL"}).as_object().cloned().unwrap();
        let result = tool.call(args).await.unwrap();
        assert_eq!(result["temperature"], 72);
        assert_eq!(result["location"], "Chicago, IL");
    }

    #[tokio::test]
    async fn test_tool_reports_its_own_argument_errors() {
        let tool = get_current_weather();
        let err = tool.call(ToolArguments::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidParameters(_)));
    }

    #[test]
    fn test_tool_debug_output() {
        let tool = Tool::new("test_tool", "Test description", json!({}), |_| async {
            Ok(json!({}))
        });

        let debug_output = format!("{:?}", tool);
        assert!(debug_output.contains("test_tool"));
        assert!(debug_output.contains("Test description"));
        assert!(debug_output.contains("<function>"));
    }

    #[test]
    fn test_tool_call_without_id_deserializes() {
        let call: ToolCall =
            serde_json::from_value(json!({"name": "write_file", "arguments": {"content": "x"}}))
                .unwrap();
        assert_eq!(call.id, None);
        assert_eq!(call.arguments["content"], "x");
    }
}
