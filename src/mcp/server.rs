//! Gateway server setup and lifecycle.
//!
//! Serves newline-delimited JSON-RPC over stdio, or `POST /mcp` over HTTP
//! when built with the `http` feature.

use super::dispatch::McpMethod;
use super::resources::{ReadResult, ResourceContent, parse_text_uri};
use super::tool_types::{SAVE_TOOL, SaveArgs};
use crate::models::SaveRequest;
use crate::services::SymbolService;
use crate::{Error, FaultKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use std::time::Instant;
use tracing::info_span;

/// Protocol version announced by `initialize`.
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Server name announced by `initialize`.
pub const SERVER_NAME: &str = "sm-mcp";

/// Maximum request size in bytes.
const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024;

/// JSON-RPC error codes used by the gateway.
pub mod codes {
    /// The request is not valid JSON.
    pub const PARSE_ERROR: i32 = -32700;
    /// Malformed request or resource URI.
    pub const INVALID_REQUEST: i32 = -32600;
    /// Unknown method or tool.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Missing or invalid arguments.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Storage or serialization failure.
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Symbol or alias does not resolve.
    pub const NOT_FOUND: i32 = -32002;
}

/// Transport type for the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Standard input/output.
    #[default]
    Stdio,
    /// HTTP transport.
    Http,
}

impl Transport {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
        }
    }
}

/// JSON-RPC gateway over a [`SymbolService`].
#[derive(Clone)]
pub struct McpServer {
    service: SymbolService,
    transport: Transport,
    port: u16,
}

impl McpServer {
    /// Creates a stdio server over `service`.
    #[must_use]
    pub const fn new(service: SymbolService) -> Self {
        Self {
            service,
            transport: Transport::Stdio,
            port: 8000,
        }
    }

    /// Sets the transport type.
    #[must_use]
    pub const fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Sets the HTTP port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Returns the underlying service.
    #[must_use]
    pub const fn service(&self) -> &SymbolService {
        &self.service
    }

    /// Starts the server and blocks until the transport closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub fn start(self) -> Result<()> {
        match self.transport {
            Transport::Stdio => self.run_stdio(),
            Transport::Http => self.run_http(),
        }
    }

    fn run_stdio(&self) -> Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let reader = BufReader::new(stdin.lock());

        tracing::info!("Gateway listening on stdio");

        for line in reader.lines() {
            let line = line.map_err(|e| Error::operation("read_stdin", e))?;
            if line.trim().is_empty() {
                continue;
            }

            let response = self.handle_request(&line);

            writeln!(stdout, "{response}").map_err(|e| Error::operation("write_stdout", e))?;
            stdout
                .flush()
                .map_err(|e| Error::operation("flush_stdout", e))?;
        }

        Ok(())
    }

    #[cfg(feature = "http")]
    fn run_http(self) -> Result<()> {
        use axum::http::header;
        use axum::{Router, routing::post};
        use std::sync::Arc;
        use tower_http::set_header::SetResponseHeaderLayer;
        use tower_http::trace::TraceLayer;

        let port = self.port;
        let app = Router::new()
            .route("/mcp", post(http_transport::handle_http_request))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                header::HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                header::HeaderValue::from_static("no-store"),
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::new(self));

        let rt =
            tokio::runtime::Runtime::new().map_err(|e| Error::operation("create_runtime", e))?;

        let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
        tracing::info!(port, "Gateway listening on http://{addr}/mcp");

        rt.block_on(async {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .map_err(|e| Error::operation("bind", e))?;

            axum::serve(listener, app)
                .await
                .map_err(|e| Error::operation("serve", e))
        })
    }

    #[cfg(not(feature = "http"))]
    #[allow(clippy::unused_self, clippy::needless_pass_by_value)]
    fn run_http(self) -> Result<()> {
        Err(Error::operation(
            "run_http",
            "HTTP transport requires the 'http' feature",
        ))
    }

    /// Handles one JSON-RPC request and returns the serialized response.
    #[must_use]
    pub fn handle_request(&self, request: &str) -> String {
        if request.len() > MAX_REQUEST_BODY_SIZE {
            tracing::warn!(
                request_size = request.len(),
                max_size = MAX_REQUEST_BODY_SIZE,
                "Request exceeds maximum size limit"
            );
            return format_error(
                None,
                codes::INVALID_REQUEST,
                &format!(
                    "Request too large: {} bytes (max: {MAX_REQUEST_BODY_SIZE} bytes)",
                    request.len()
                ),
            );
        }

        let start = Instant::now();
        let transport_label = self.transport.as_str();

        let span = info_span!(
            "mcp.request",
            transport = transport_label,
            rpc.method = tracing::field::Empty,
            rpc.id = tracing::field::Empty,
            status = tracing::field::Empty
        );
        let _guard = span.enter();

        let parsed: std::result::Result<JsonRpcRequest, _> = serde_json::from_str(request);
        let mut method_label = "parse_error".to_string();
        let mut status_label = "error";

        let response = match parsed {
            Ok(req) => {
                method_label.clone_from(&req.method);
                span.record("rpc.method", method_label.as_str());
                if let Some(id) = &req.id {
                    let id_str = id.to_string();
                    span.record("rpc.id", id_str.as_str());
                }

                tracing::debug!(method = %method_label, "Processing gateway request");

                let result = self.dispatch_method(&req.method, req.params);
                status_label = if result.is_ok() { "success" } else { "error" };
                span.record("status", status_label);
                format_response(req.id, result)
            },
            Err(e) => {
                span.record("status", "parse_error");
                format_error(None, codes::PARSE_ERROR, &format!("Parse error: {e}"))
            },
        };

        metrics::counter!(
            "mcp_requests_total",
            "method" => method_label.clone(),
            "transport" => transport_label,
            "status" => status_label
        )
        .increment(1);
        metrics::histogram!(
            "mcp_request_duration_ms",
            "method" => method_label,
            "transport" => transport_label
        )
        .record(start.elapsed().as_secs_f64() * 1000.0);

        response
    }

    fn dispatch_method(&self, method: &str, params: Option<Value>) -> DispatchResult {
        match McpMethod::from(method) {
            McpMethod::Initialize => Ok(Self::handle_initialize()),
            McpMethod::Initialized => Ok(Value::Null),
            McpMethod::CallTool => self.handle_call_tool(params),
            McpMethod::ReadResource => self.handle_read_resource(params),
            McpMethod::Unknown(name) => {
                Err((codes::METHOD_NOT_FOUND, format!("Unknown method: {name}")))
            },
        }
    }

    fn handle_initialize() -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            },
            "capabilities": {
                "resources": {},
                "tools": {}
            }
        })
    }

    fn handle_call_tool(&self, params: Option<Value>) -> DispatchResult {
        let params = params.ok_or((codes::INVALID_PARAMS, "Missing params".to_string()))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or((codes::INVALID_PARAMS, "Missing tool name".to_string()))?;
        if name != SAVE_TOOL {
            return Err((codes::METHOD_NOT_FOUND, format!("Unknown tool: {name}")));
        }

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| serde_json::json!({}));
        let args: SaveArgs = serde_json::from_value(arguments)
            .map_err(|e| (codes::INVALID_PARAMS, format!("Invalid arguments: {e}")))?;

        let response = self
            .service
            .save(&SaveRequest::from(args))
            .map_err(|e| rpc_error(&e))?;

        serde_json::to_value(response)
            .map_err(|e| (codes::INTERNAL_ERROR, format!("Failed to encode response: {e}")))
    }

    fn handle_read_resource(&self, params: Option<Value>) -> DispatchResult {
        let uri = params
            .as_ref()
            .and_then(|p| p.get("uri"))
            .and_then(Value::as_str)
            .ok_or((codes::INVALID_REQUEST, "Invalid uri".to_string()))?;

        let name = parse_text_uri(uri).map_err(|e| (codes::INVALID_REQUEST, rpc_error(&e).1))?;
        let body = self.service.read(name).map_err(|e| rpc_error(&e))?;

        let result = ReadResult {
            contents: vec![ResourceContent::text(uri, body)],
        };
        serde_json::to_value(result)
            .map_err(|e| (codes::INTERNAL_ERROR, format!("Failed to encode response: {e}")))
    }
}

/// Maps a service error onto a JSON-RPC error code and message.
///
/// Messages carry the bare detail so the client can rebuild the same variant.
fn rpc_error(error: &Error) -> (i32, String) {
    let code = match error.kind() {
        FaultKind::Validation => codes::INVALID_PARAMS,
        FaultKind::NotFound => codes::NOT_FOUND,
        FaultKind::Protocol => codes::METHOD_NOT_FOUND,
        FaultKind::Transport | FaultKind::Internal => {
            tracing::error!(error = %error, "Gateway request failed");
            codes::INTERNAL_ERROR
        },
    };
    let message = match error {
        Error::InvalidInput(detail) | Error::NotFound(detail) | Error::Protocol(detail) => {
            detail.clone()
        },
        other => other.to_string(),
    };
    (code, message)
}

fn format_response(id: Option<Value>, result: DispatchResult) -> String {
    match result {
        Ok(value) => {
            let response = JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id,
                result: Some(value),
                error: None,
            };
            serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
        },
        Err((code, message)) => format_error(id, code, &message),
    }
}

fn format_error(id: Option<Value>, code: i32, message: &str) -> String {
    let response = JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.to_string(),
        }),
    };
    serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
}

/// Result type for method dispatch.
type DispatchResult = std::result::Result<Value, (i32, String)>;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// Protocol version tag (not checked).
    #[serde(rename = "jsonrpc", default)]
    _jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[cfg(feature = "http")]
mod http_transport {
    use super::McpServer;
    use axum::extract::State;
    use axum::http::{StatusCode, header};
    use axum::response::IntoResponse;
    use std::sync::Arc;

    /// `POST /mcp`: runs the request on the blocking pool and returns the
    /// JSON-RPC envelope as-is.
    pub async fn handle_http_request(
        State(server): State<Arc<McpServer>>,
        body: String,
    ) -> impl IntoResponse {
        let response =
            tokio::task::spawn_blocking(move || server.handle_request(&body)).await;

        match response {
            Ok(json) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                json,
            ),
            Err(e) => {
                tracing::error!(error = %e, "Gateway worker failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "application/json")],
                    super::format_error(None, super::codes::INTERNAL_ERROR, "Internal error"),
                )
            },
        }
    }
}
