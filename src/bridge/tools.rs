//! The tool loop.

use super::{ChatBackend, ChatMessage, ToolCall};
use crate::mcp::{ReadResult, ResourceContent, SaveArgs, text_uri};
use crate::models::SaveRequest;
use crate::services::SymbolGateway;
use crate::{Error, FaultKind, Result};
use serde_json::{Value, json};
use tracing::info_span;

/// Name of the save function tool.
pub const SAVE_TOOL: &str = "sm_save";

/// Name of the get function tool.
pub const GET_TOOL: &str = "sm_get";

/// Default cap on model turns.
pub const DEFAULT_MAX_STEPS: usize = 8;

/// Returns the function tool definitions advertised to the model.
#[must_use]
pub fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "type": "function",
            "function": {
                "name": SAVE_TOOL,
                "description": "Save a symbolic memory entry",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "symbol": {"type": "string"},
                        "text": {"type": "string"},
                        "cat": {"type": "string"},
                        "subcat": {"type": "string"},
                        "aliases": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": ["symbol", "text"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": GET_TOOL,
                "description": "Fetch a symbolic memory entry by symbol or alias",
                "parameters": {
                    "type": "object",
                    "properties": {"symbol": {"type": "string"}},
                    "required": ["symbol"]
                }
            }
        }),
    ]
}

/// How a bridge run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeOutcome {
    /// The model answered without requesting tools.
    Answer(String),
    /// Strict-get mode: the text of the first successful `sm_get`.
    Retrieved(String),
}

impl BridgeOutcome {
    /// Returns the text to print.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Answer(text) | Self::Retrieved(text) => text,
        }
    }
}

/// Runs a chat model against the gateway until it produces an answer.
///
/// Unknown tools and gateway faults are reported back to the model as
/// `{"error": ...}` tool results. Transport faults end the run.
pub struct ToolBridge<G: SymbolGateway, B: ChatBackend> {
    gateway: G,
    backend: B,
    max_steps: usize,
    strict_get: bool,
}

impl<G: SymbolGateway, B: ChatBackend> ToolBridge<G, B> {
    /// Creates a bridge with the default step cap.
    #[must_use]
    pub const fn new(gateway: G, backend: B) -> Self {
        Self {
            gateway,
            backend,
            max_steps: DEFAULT_MAX_STEPS,
            strict_get: false,
        }
    }

    /// Sets the step cap.
    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Stops at the first successful `sm_get` and returns only its text.
    #[must_use]
    pub const fn with_strict_get(mut self, strict_get: bool) -> Self {
        self.strict_get = strict_get;
        self
    }

    /// Returns the gateway.
    #[must_use]
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Runs the loop for a single user prompt.
    ///
    /// # Errors
    ///
    /// Returns a transport error from the backend or gateway, or
    /// [`Error::OperationFailed`] if no answer arrives within the step cap.
    pub fn run(&self, prompt: &str) -> Result<BridgeOutcome> {
        let tools = tool_definitions();
        let mut messages = vec![ChatMessage::user(prompt)];

        for step in 0..self.max_steps {
            let span = info_span!("bridge.step", step, backend = self.backend.name());
            let _guard = span.enter();

            let reply = self.backend.chat(&messages, &tools)?;
            if reply.tool_calls.is_empty() {
                return Ok(BridgeOutcome::Answer(reply.content.unwrap_or_default()));
            }

            let calls = reply.tool_calls.clone();
            messages.push(reply);

            for call in &calls {
                let name = call.function.name.as_str();
                let result = self.execute(call)?;

                if self.strict_get
                    && name == GET_TOOL
                    && let Some(text) = retrieved_text(&result)
                {
                    return Ok(BridgeOutcome::Retrieved(text));
                }

                messages.push(ChatMessage::tool(
                    call.id.clone(),
                    name,
                    result.to_string(),
                ));
            }
        }

        Err(Error::operation(
            "tool_loop",
            format!("no final answer within {} steps", self.max_steps),
        ))
    }

    /// Executes one tool call, returning the JSON tool result.
    fn execute(&self, call: &ToolCall) -> Result<Value> {
        let name = call.function.name.as_str();
        let result = match name {
            SAVE_TOOL => self.save(call),
            GET_TOOL => self.get(call),
            other => Err(Error::Protocol(format!("unknown tool: {other}"))),
        };

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::counter!("bridge_tool_calls_total", "tool" => name.to_string(), "status" => status)
            .increment(1);

        match result {
            Ok(value) => Ok(value),
            Err(e) if e.kind() == FaultKind::Transport => Err(e),
            Err(e) => {
                tracing::debug!(tool = name, error = %e, "Tool call failed");
                Ok(json!({ "error": e.to_string() }))
            },
        }
    }

    fn save(&self, call: &ToolCall) -> Result<Value> {
        let args: SaveArgs = serde_json::from_value(call.function.parsed_arguments()?)
            .map_err(|e| Error::InvalidInput(format!("invalid {SAVE_TOOL} arguments: {e}")))?;
        let response = self.gateway.save(&SaveRequest::from(args))?;
        serde_json::to_value(response).map_err(|e| Error::operation("encode_save_response", e))
    }

    fn get(&self, call: &ToolCall) -> Result<Value> {
        let args = call.function.parsed_arguments()?;
        let symbol = args
            .get("symbol")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidInput(format!("{GET_TOOL} requires 'symbol'")))?;

        let text = self.gateway.read(symbol)?;
        let result = ReadResult {
            contents: vec![ResourceContent::text(text_uri(symbol), text)],
        };
        serde_json::to_value(result).map_err(|e| Error::operation("encode_read_result", e))
    }
}

fn retrieved_text(result: &Value) -> Option<String> {
    result
        .get("contents")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(str::to_string)
}
