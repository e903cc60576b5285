//! Tool-calling bridge between a chat model and the gateway.
//!
//! The bridge advertises two function tools to an OpenAI-compatible chat
//! backend:
//!
//! - `sm_save` (`symbol`, `text`, `cat?`, `subcat?`, `aliases?`) maps to
//!   `tools/call` / `sm.texts.save`
//! - `sm_get` (`symbol`) maps to `resources/read`
//!
//! Each tool result is sent back to the model as a `role: tool` message
//! until the model answers without tool calls or the step cap is reached.

mod backend;
mod tools;

pub use backend::{BackendKind, OpenAiCompatClient, build_http_client};
pub use tools::{BridgeOutcome, DEFAULT_MAX_STEPS, GET_TOOL, SAVE_TOOL, ToolBridge, tool_definitions};

use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A chat backend that supports function tools.
pub trait ChatBackend: Send + Sync {
    /// The backend name.
    fn name(&self) -> &'static str;

    /// Sends the conversation and returns the assistant message.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Transport`] if the backend cannot be reached
    /// or answers with a failure status.
    fn chat(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ChatMessage>;
}

impl<B: ChatBackend + ?Sized> ChatBackend for &B {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn chat(&self, messages: &[ChatMessage], tools: &[Value]) -> Result<ChatMessage> {
        (**self).chat(messages, tools)
    }
}

/// One chat message in OpenAI wire format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user`, `assistant` or `tool`.
    pub role: String,
    /// Text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool calls requested by the assistant.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Call id this tool message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool name for tool messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Creates a tool result message.
    #[must_use]
    pub fn tool(call_id: Option<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_call_id: call_id,
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// A function call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call id, echoed in the tool result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Always `function` when present.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// The function and its arguments.
    pub function: FunctionCall,
}

/// Function name plus arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Tool name.
    pub name: String,
    /// Arguments, either a JSON-encoded string or an object depending on
    /// the backend.
    #[serde(default)]
    pub arguments: Value,
}

impl FunctionCall {
    /// Decodes the arguments into a JSON object.
    ///
    /// An empty or null argument list decodes to `{}`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if string arguments are not
    /// valid JSON.
    pub fn parsed_arguments(&self) -> Result<Value> {
        match &self.arguments {
            Value::Null => Ok(Value::Object(serde_json::Map::new())),
            Value::String(raw) if raw.trim().is_empty() => {
                Ok(Value::Object(serde_json::Map::new()))
            },
            Value::String(raw) => serde_json::from_str(raw).map_err(|e| {
                crate::Error::InvalidInput(format!("tool arguments are not valid JSON: {e}"))
            }),
            other => Ok(other.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_arguments_accept_string_and_object() {
        let call = FunctionCall {
            name: "sm_get".to_string(),
            arguments: json!("{\"symbol\":\"HGI.DEF\"}"),
        };
        assert_eq!(call.parsed_arguments().unwrap()["symbol"], "HGI.DEF");

        let call = FunctionCall {
            name: "sm_get".to_string(),
            arguments: json!({"symbol": "HGI.DEF"}),
        };
        assert_eq!(call.parsed_arguments().unwrap()["symbol"], "HGI.DEF");

        let call = FunctionCall {
            name: "sm_get".to_string(),
            arguments: json!(""),
        };
        assert_eq!(call.parsed_arguments().unwrap(), json!({}));
    }

    #[test]
    fn test_assistant_message_roundtrip() {
        let raw = json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {"name": "sm_get", "arguments": "{\"symbol\":\"X\"}"}
            }]
        });
        let message: ChatMessage = serde_json::from_value(raw).unwrap();
        assert_eq!(message.tool_calls.len(), 1);

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["tool_calls"][0]["id"], "call_1");
        assert!(value.get("content").is_none());
    }
}
