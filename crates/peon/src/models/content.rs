use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The structured payload carried by a `tool` conversation entry.
///
/// Serializes to exactly one of `{"result": ...}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolPayload {
    Result(Value),
    Error(String),
}

impl ToolPayload {
    pub fn result<V: Into<Value>>(value: V) -> Self {
        ToolPayload::Result(value.into())
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        ToolPayload::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolPayload::Error(_))
    }

    /// Render the payload as the JSON text stored in a conversation entry
    pub fn to_json_string(&self) -> String {
        match self {
            ToolPayload::Result(value) => serde_json::json!({ "result": value }).to_string(),
            ToolPayload::Error(message) => serde_json::json!({ "error": message }).to_string(),
        }
    }

    /// Parse the JSON text of a conversation entry back into a payload.
    /// Content that is not a payload object is treated as a plain result.
    pub fn from_content(content: &str) -> Self {
        serde_json::from_str(content)
            .unwrap_or_else(|_| ToolPayload::Result(Value::String(content.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_payload_shape() {
        let payload = ToolPayload::result("- main.py: file_size=12 bytes, is_dir=false\n");
        let value: Value = serde_json::from_str(&payload.to_json_string()).unwrap();
        assert_eq!(
            value,
            json!({"result": "- main.py: file_size=12 bytes, is_dir=false\n"})
        );
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_error_payload_shape() {
        let payload = ToolPayload::error("Tool not found: nope");
        let value: Value = serde_json::from_str(&payload.to_json_string()).unwrap();
        assert_eq!(value, json!({"error": "Tool not found: nope"}));
        assert!(value.get("result").is_none());
        assert!(payload.is_error());
    }

    #[test]
    fn test_from_content_falls_back_to_plain_result() {
        assert_eq!(
            ToolPayload::from_content("not json at all"),
            ToolPayload::result("not json at all")
        );
        assert_eq!(
            ToolPayload::from_content(r#"{"error": "boom"}"#),
            ToolPayload::error("boom")
        );
    }
}
