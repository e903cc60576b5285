//! JSON-RPC client for the gateway.
//!
//! [`RpcClient`] builds request envelopes and maps error envelopes back onto
//! [`Error`] kinds. The wire is abstracted by [`RpcTransport`]:
//!
//! - [`HttpTransport`]: `POST` to a remote `/mcp` endpoint
//! - [`LocalTransport`]: an in-process [`McpServer`], no network

use super::resources::{ReadResult, text_uri};
use super::server::{McpServer, codes};
use super::tool_types::SAVE_TOOL;
use crate::models::{SaveRequest, SaveResponse};
use crate::services::SymbolGateway;
use crate::{Error, Result};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::instrument;

/// Sends one JSON-RPC envelope and returns the response envelope.
pub trait RpcTransport: Send + Sync {
    /// Delivers `request` and returns the raw response envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if no response was received.
    fn send(&self, request: &Value) -> Result<Value>;
}

/// HTTP transport using a blocking `reqwest` client.
pub struct HttpTransport {
    url: String,
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Creates a transport for `url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::operation("build_http_client", e))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RpcTransport for HttpTransport {
    fn send(&self, request: &Value) -> Result<Value> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .map_err(|e| transport_error("rpc_request", &e))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| transport_error("rpc_response", &e))?;

        match serde_json::from_str::<Value>(&body) {
            Ok(envelope) if envelope.get("result").is_some() || envelope.get("error").is_some() => {
                Ok(envelope)
            },
            _ if !status.is_success() => Err(Error::Transport {
                operation: "rpc_response".to_string(),
                cause: format!("HTTP {status}: {body}"),
            }),
            _ => Err(Error::Protocol(format!("malformed response envelope: {body}"))),
        }
    }
}

fn transport_error(operation: &str, error: &reqwest::Error) -> Error {
    let cause = if error.is_timeout() {
        format!("timed out: {error}")
    } else {
        error.to_string()
    };
    Error::Transport {
        operation: operation.to_string(),
        cause,
    }
}

/// In-process transport that hands envelopes straight to a server.
pub struct LocalTransport {
    server: McpServer,
}

impl LocalTransport {
    /// Wraps `server`.
    #[must_use]
    pub const fn new(server: McpServer) -> Self {
        Self { server }
    }
}

impl RpcTransport for LocalTransport {
    fn send(&self, request: &Value) -> Result<Value> {
        let response = self.server.handle_request(&request.to_string());
        serde_json::from_str(&response).map_err(|e| Error::operation("decode_rpc_response", e))
    }
}

/// JSON-RPC client with incrementing request ids.
pub struct RpcClient<T: RpcTransport> {
    transport: T,
    next_id: AtomicU64,
}

impl RpcClient<HttpTransport> {
    /// Creates a client for a remote gateway.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn http(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(url, timeout)?))
    }
}

impl RpcClient<LocalTransport> {
    /// Creates a client over an in-process server.
    #[must_use]
    pub const fn local(server: McpServer) -> Self {
        Self::new(LocalTransport::new(server))
    }
}

impl<T: RpcTransport> RpcClient<T> {
    /// Creates a client over `transport`.
    #[must_use]
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Performs the `initialize` + `notifications/initialized` handshake.
    ///
    /// Returns the `initialize` result.
    ///
    /// # Errors
    ///
    /// Returns an error if either call fails.
    pub fn initialize(&self) -> Result<Value> {
        let result = self.call(
            "initialize",
            json!({
                "protocolVersion": super::server::PROTOCOL_VERSION,
                "clientInfo": { "name": "symmem", "version": env!("CARGO_PKG_VERSION") },
                "capabilities": {}
            }),
        )?;
        self.call("notifications/initialized", json!({}))?;
        Ok(result)
    }

    /// Calls `method` and returns its `result`.
    ///
    /// # Errors
    ///
    /// Returns the error carried by the response envelope, mapped onto an
    /// [`Error`] kind, or a transport error.
    #[instrument(skip(self, params), fields(rpc.id = tracing::field::Empty))]
    pub fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::Span::current().record("rpc.id", id);

        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let mut envelope = self.transport.send(&request)?;
        if let Some(error) = envelope.get("error") {
            return Err(error_from_envelope(error));
        }
        Ok(envelope
            .get_mut("result")
            .map(Value::take)
            .unwrap_or_default())
    }
}

/// Maps a JSON-RPC error object back onto an [`Error`].
fn error_from_envelope(error: &Value) -> Error {
    let code = error
        .get("code")
        .and_then(Value::as_i64)
        .unwrap_or(i64::from(codes::INTERNAL_ERROR));
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_string();

    match i32::try_from(code).unwrap_or(codes::INTERNAL_ERROR) {
        codes::INVALID_PARAMS => Error::InvalidInput(message),
        codes::NOT_FOUND => Error::NotFound(message),
        codes::METHOD_NOT_FOUND | codes::INVALID_REQUEST | codes::PARSE_ERROR => {
            Error::Protocol(message)
        },
        _ => Error::operation("rpc_call", message),
    }
}

impl<T: RpcTransport> SymbolGateway for RpcClient<T> {
    fn save(&self, request: &SaveRequest) -> Result<SaveResponse> {
        let arguments =
            serde_json::to_value(request).map_err(|e| Error::operation("encode_save", e))?;
        let result = self.call(
            "tools/call",
            json!({ "name": SAVE_TOOL, "arguments": arguments }),
        )?;
        serde_json::from_value(result).map_err(|e| Error::operation("decode_save_response", e))
    }

    fn read(&self, symbol_or_alias: &str) -> Result<String> {
        let result = self.call("resources/read", json!({ "uri": text_uri(symbol_or_alias) }))?;
        let read: ReadResult =
            serde_json::from_value(result).map_err(|e| Error::operation("decode_read", e))?;
        read.contents
            .into_iter()
            .next()
            .map(|content| content.text)
            .ok_or_else(|| Error::Protocol("resources/read returned no contents".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::SymbolService;
    use std::sync::Mutex;

    fn local_client() -> RpcClient<LocalTransport> {
        RpcClient::local(McpServer::new(SymbolService::in_memory().unwrap()))
    }

    struct RecordingTransport {
        seen: Mutex<Vec<Value>>,
        reply: Value,
    }

    impl RpcTransport for RecordingTransport {
        fn send(&self, request: &Value) -> Result<Value> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn test_ids_increment() {
        let client = RpcClient::new(RecordingTransport {
            seen: Mutex::new(Vec::new()),
            reply: json!({"jsonrpc": "2.0", "id": 1, "result": {}}),
        });
        client.initialize().unwrap();
        client.call("initialize", json!({})).unwrap();

        let seen = client.transport().seen.lock().unwrap();
        let ids: Vec<u64> = seen.iter().map(|r| r["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(seen[1]["method"], "notifications/initialized");
    }

    #[test]
    fn test_handshake_over_local_transport() {
        let client = local_client();
        let result = client.initialize().unwrap();
        assert_eq!(result["serverInfo"]["name"], "sm-mcp");
    }

    #[test]
    fn test_gateway_roundtrip() {
        let client = local_client();
        let response = client
            .save(&SaveRequest::new("TST.ONE", "hello world one").with_alias("one"))
            .unwrap();
        assert_eq!(response.outcome.symbol.as_str(), "TST.ONE");
        assert_eq!(client.read("one").unwrap(), "hello world one");
    }

    #[test]
    fn test_error_kinds_survive_the_wire() {
        let client = local_client();

        assert!(matches!(client.read("missing"), Err(Error::NotFound(_))));
        assert!(matches!(
            client.save(&SaveRequest::new("TST.ONE", "")),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(client.read("a/b"), Err(Error::Protocol(_))));
        assert!(matches!(
            client.call("tools/list", json!({})),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn test_unreachable_server_is_a_transport_fault() {
        let client = RpcClient::http("http://127.0.0.1:9/mcp", Duration::from_millis(500)).unwrap();
        let err = client.read("anything").unwrap_err();
        assert_eq!(err.kind(), crate::FaultKind::Transport);
    }
}
