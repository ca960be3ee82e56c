use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashSet;

use super::base::{Response, Usage};
use crate::errors::{ProviderError, ProviderResult};
use crate::models::message::Message;
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolArguments, ToolCall};

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            let mut converted = json!({
                "role": message.role,
                "content": message.content,
            });
            if message.role == Role::Tool {
                if let Some(id) = &message.tool_call_id {
                    converted["tool_call_id"] = json!(id);
                }
                if let Some(name) = &message.name {
                    converted["name"] = json!(name);
                }
            }
            converted
        })
        .collect()
}

/// Convert internal Tool format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> ProviderResult<Vec<Value>> {
    let mut result = Vec::new();

    for tool in unique_declarations(tools)? {
        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }));
    }

    Ok(result)
}

/// Check that the tools can be declared to a backend: valid and distinct names
pub fn unique_declarations(tools: &[Tool]) -> ProviderResult<&[Tool]> {
    let mut tool_names = HashSet::new();
    for tool in tools {
        if !is_valid_function_name(&tool.name) {
            return Err(ProviderError::InvalidRequest(format!(
                "The tool name '{}' has invalid characters, it must match this regex [a-zA-Z0-9_-]+",
                tool.name
            )));
        }
        if !tool_names.insert(tool.name.as_str()) {
            return Err(ProviderError::InvalidRequest(format!(
                "Duplicate tool name: {}",
                tool.name
            )));
        }
    }
    Ok(tools)
}

/// Convert OpenAI's API response to the provider-agnostic response
pub fn openai_response_to_response(response: &Value) -> ProviderResult<Response> {
    let original = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| {
            ProviderError::MalformedResponse("No message in the first choice".to_string())
        })?;

    let assistant_text = original
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut tool_calls = Vec::new();
    if let Some(tool_calls_array) = original.get("tool_calls").and_then(Value::as_array) {
        for tool_call in tool_calls_array {
            let function_name = tool_call["function"]["name"]
                .as_str()
                .filter(|name| !name.is_empty())
                .ok_or_else(|| {
                    ProviderError::MalformedResponse("Tool call without a function name".into())
                })?;
            let arguments = parse_openai_arguments(&tool_call["function"]["arguments"])?;

            let mut call = ToolCall::new(function_name, arguments);
            if let Some(id) = tool_call.get("id").and_then(Value::as_str) {
                call = call.with_id(id);
            }
            tool_calls.push(call);
        }
    }

    Ok(Response {
        assistant_text,
        tool_calls,
        usage: get_openai_usage(response),
    })
}

// Arguments arrive JSON-encoded as a string; some compatible servers send the object itself
fn parse_openai_arguments(arguments: &Value) -> ProviderResult<ToolArguments> {
    let decoded = match arguments {
        Value::Null => return Ok(ToolArguments::new()),
        Value::String(raw) if raw.trim().is_empty() => return Ok(ToolArguments::new()),
        Value::String(raw) => serde_json::from_str::<Value>(raw).map_err(|e| {
            ProviderError::MalformedResponse(format!(
                "Could not interpret tool use parameters: {}",
                e
            ))
        })?,
        other => other.clone(),
    };

    match decoded {
        Value::Object(map) => Ok(map),
        other => Err(ProviderError::MalformedResponse(format!(
            "Tool use parameters must be an object, got: {}",
            other
        ))),
    }
}

pub fn get_openai_usage(data: &Value) -> Option<Usage> {
    let usage = data.get("usage")?;
    let input_tokens = usage.get("prompt_tokens").and_then(Value::as_u64);
    let output_tokens = usage.get("completion_tokens").and_then(Value::as_u64);
    if input_tokens.is_none() && output_tokens.is_none() {
        return None;
    }
    Some(Usage::new(
        input_tokens.unwrap_or_default(),
        output_tokens.unwrap_or_default(),
    ))
}

pub fn is_valid_function_name(name: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    re.is_match(name)
}

pub fn check_openai_context_length_error(error: &Value) -> Option<ProviderError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ProviderError::ContextLengthExceeded(message))
    } else {
        None
    }
}
