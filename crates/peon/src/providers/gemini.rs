use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{Provider, Response, Usage};
use super::configs::GeminiProviderConfig;
use super::utils::unique_declarations;
use crate::errors::{ProviderError, ProviderResult};
use crate::models::content::ToolPayload;
use crate::models::message::Message;
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolArguments, ToolCall};

pub const GEMINI_HOST: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Provider for the Gemini `generateContent` API.
///
/// Gemini has no system turn: system entries are folded into the request's
/// `systemInstruction`, falling back to the configured system prompt when the
/// conversation has none. Tool results are sent back as `functionResponse`
/// parts in a user turn, tagged by tool name.
pub struct GeminiProvider {
    client: Client,
    config: GeminiProviderConfig,
}

impl GeminiProvider {
    pub fn new(config: GeminiProviderConfig) -> ProviderResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::Configuration(
                "Gemini API key must be set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn system_instruction(&self, messages: &[Message]) -> Option<Value> {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let text = if system.is_empty() {
            self.config.system_prompt.clone()?
        } else {
            system.join("\n\n")
        };

        (!text.is_empty()).then(|| json!({ "parts": [{ "text": text }] }))
    }

    async fn post(&self, payload: &Value) -> ProviderResult<Value> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.host.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(ProviderError::Server(status))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ProviderError::Status { status, body })
            }
        }
    }
}

/// Convert the conversation into Gemini `contents`, skipping system entries
pub fn messages_to_gemini_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .filter_map(|message| match message.role {
            Role::System => None,
            Role::User => Some(json!({
                "role": "user",
                "parts": [{ "text": message.content }]
            })),
            Role::Assistant => Some(json!({
                "role": "model",
                "parts": [{ "text": message.content }]
            })),
            Role::Tool => {
                let name = message.name.as_deref().unwrap_or_default();
                let response = match serde_json::from_str::<Value>(&message.content) {
                    Ok(value @ Value::Object(_)) => value,
                    _ => json!(ToolPayload::result(message.content.clone())),
                };
                let mut function_response = json!({
                    "name": name,
                    "response": response
                });
                if let Some(id) = &message.tool_call_id {
                    function_response["id"] = json!(id);
                }
                Some(json!({
                    "role": "user",
                    "parts": [{ "functionResponse": function_response }]
                }))
            }
        })
        .collect()
}

/// Convert tools into a single Gemini tool bundle of function declarations.
///
/// The parameter schema is forwarded untouched as `parametersJsonSchema`,
/// which keeps `required` and `additionalProperties` intact.
pub fn tools_to_gemini_spec(tools: &[Tool]) -> ProviderResult<Vec<Value>> {
    let declarations: Vec<Value> = unique_declarations(tools)?
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "parametersJsonSchema": tool.parameters,
            })
        })
        .collect();

    if declarations.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![json!({ "functionDeclarations": declarations })])
}

/// Convert a `generateContent` reply into the provider-agnostic response
pub fn gemini_response_to_response(response: &Value) -> ProviderResult<Response> {
    let candidate = match response
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
    {
        Some(candidate) => candidate,
        None => {
            let reason = response
                .pointer("/promptFeedback/blockReason")
                .and_then(Value::as_str)
                .unwrap_or("no candidates returned");
            return Err(ProviderError::MalformedResponse(format!(
                "Gemini returned no candidates: {}",
                reason
            )));
        }
    };

    let mut assistant_text = String::new();
    let mut tool_calls = Vec::new();

    let parts = candidate
        .pointer("/content/parts")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for part in parts {
        if let Some(function_call) = part.get("functionCall") {
            tool_calls.push(parse_function_call(function_call)?);
        } else if let Some(text) = part.get("text").and_then(Value::as_str) {
            if part.get("thought").and_then(Value::as_bool) != Some(true) {
                assistant_text.push_str(text);
            }
        }
    }

    Ok(Response {
        assistant_text,
        tool_calls,
        usage: get_gemini_usage(response),
    })
}

fn parse_function_call(function_call: &Value) -> ProviderResult<ToolCall> {
    let name = function_call
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            ProviderError::MalformedResponse("Function call without a name".to_string())
        })?;

    let arguments = match function_call.get("args") {
        None | Some(Value::Null) => ToolArguments::new(),
        Some(Value::Object(args)) => args.clone(),
        Some(other) => {
            return Err(ProviderError::MalformedResponse(format!(
                "Function call arguments must be an object, got: {}",
                other
            )))
        }
    };

    let call = ToolCall::new(name, arguments);
    Ok(match function_call.get("id").and_then(Value::as_str) {
        Some(id) => call.with_id(id),
        None => call,
    })
}

fn get_gemini_usage(data: &Value) -> Option<Usage> {
    let usage = data.get("usageMetadata")?;
    Some(Usage::new(
        usage
            .get("promptTokenCount")
            .and_then(Value::as_u64)
            .unwrap_or_default(),
        usage
            .get("candidatesTokenCount")
            .and_then(Value::as_u64)
            .unwrap_or_default(),
    ))
}

#[async_trait]
impl Provider for GeminiProvider {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn chat(&self, messages: &[Message], tools: &[Tool]) -> ProviderResult<Response> {
        let mut payload = json!({
            "contents": messages_to_gemini_spec(messages),
        });

        if let Some(instruction) = self.system_instruction(messages) {
            payload["systemInstruction"] = instruction;
        }

        let tools_spec = tools_to_gemini_spec(tools)?;
        if !tools_spec.is_empty() {
            payload["tools"] = json!(tools_spec);
        }

        let mut generation_config = serde_json::Map::new();
        if let Some(temp) = self.config.temperature {
            generation_config.insert("temperature".to_string(), json!(temp));
        }
        if let Some(tokens) = self.config.max_tokens {
            generation_config.insert("maxOutputTokens".to_string(), json!(tokens));
        }
        if !generation_config.is_empty() {
            payload["generationConfig"] = Value::Object(generation_config);
        }

        tracing::debug!(model = %self.config.model, contents = messages.len(), "sending generateContent request");
        let response = self.post(&payload).await?;

        if let Some(error) = response.get("error") {
            return Err(ProviderError::Api(error.to_string()));
        }

        gemini_response_to_response(&response)
    }
}
