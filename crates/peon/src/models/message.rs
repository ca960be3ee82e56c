use serde::{Deserialize, Serialize};

use super::content::ToolPayload;
use super::role::Role;
use crate::errors::{AgentError, AgentResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A single entry of the conversation exchanged with an LLM
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Correlates a tool result with the backend's call, when the backend issues ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// The tool that produced this entry; always present for `Role::Tool`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// Build a message from its parts, rejecting entries that break the protocol contract
    pub fn new<S: Into<String>>(
        role: Role,
        content: S,
        tool_call_id: Option<String>,
        name: Option<String>,
    ) -> AgentResult<Self> {
        let msg = Self {
            role,
            content: content.into(),
            tool_call_id,
            name,
        };
        msg.validate()?;
        Ok(msg)
    }

    pub fn validate(&self) -> AgentResult<()> {
        if self.role == Role::Tool && self.name.as_deref().map_or(true, str::is_empty) {
            return Err(AgentError::InvalidMessage(
                "Tool message must carry the name of the tool that produced it".into(),
            ));
        }
        Ok(())
    }

    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Create a tool result entry tagged with the producing tool's name and call id
    pub fn tool<S: Into<String>>(
        name: S,
        tool_call_id: Option<String>,
        payload: &ToolPayload,
    ) -> AgentResult<Self> {
        Self::new(
            Role::Tool,
            payload.to_json_string(),
            tool_call_id,
            Some(name.into()),
        )
    }

    fn plain<S: Into<String>>(role: Role, content: S) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
            name: None,
        }
    }

    /// Decode the payload of a tool entry
    pub fn tool_payload(&self) -> Option<ToolPayload> {
        (self.role == Role::Tool).then(|| ToolPayload::from_content(&self.content))
    }
}
