//! Gateway end-to-end tests.
//!
//! Drives the JSON-RPC server through [`RpcClient`] over the in-process
//! transport, and through raw request strings where the envelope itself is
//! under test.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use serde_json::{Value, json};
use symmem::mcp::{LocalTransport, McpServer, RpcClient, codes};
use symmem::models::{SaveRequest, SaveStatus};
use symmem::services::{SymbolGateway, SymbolService};
use symmem::{Error, FaultKind};

fn server() -> McpServer {
    McpServer::new(SymbolService::in_memory().unwrap())
}

fn client() -> RpcClient<LocalTransport> {
    let client = RpcClient::local(server());
    client.initialize().unwrap();
    client
}

fn raw(server: &McpServer, request: &Value) -> Value {
    serde_json::from_str(&server.handle_request(&request.to_string())).unwrap()
}

// ============================================================================
// Suggestions
// ============================================================================

mod suggestions {
    use super::*;

    #[test]
    fn test_neighbor_taxonomy_is_suggested() {
        let client = client();
        client
            .save(
                &SaveRequest::new("TST.NEIGHBOR", "hybrid intelligence symbolic memory")
                    .with_category("ai")
                    .with_subcategory("architecture.hybrid"),
            )
            .unwrap();

        let response = client
            .save(&SaveRequest::new(
                "TST.TWO",
                "hybrid intelligence and symbolic memory",
            ))
            .unwrap();

        assert_eq!(response.outcome.status, SaveStatus::Created);
        let suggestions = response.suggestions.expect("suggestions present");

        let top = suggestions.top_category().unwrap();
        assert_eq!(top.category, "ai");
        assert!((top.score - 1.0).abs() < 1e-9);

        let pair = suggestions.top_pair().unwrap();
        assert_eq!(pair.category, "ai");
        assert_eq!(pair.subcategory, "architecture.hybrid");
        assert!((pair.score - 1.0).abs() < 1e-9);

        assert_eq!(suggestions.neighbors[0].symbol, "TST.NEIGHBOR");
    }

    #[test]
    fn test_classified_save_gets_no_suggestions() {
        let client = client();
        client
            .save(&SaveRequest::new("TST.NEIGHBOR", "hybrid intelligence").with_category("ai"))
            .unwrap();

        let response = client
            .save(
                &SaveRequest::new("TST.TWO", "hybrid intelligence")
                    .with_category("ai")
                    .with_subcategory("architecture.hybrid"),
            )
            .unwrap();
        assert!(response.suggestions.is_none());
    }

    #[test]
    fn test_empty_store_gets_no_suggestions() {
        let client = client();
        let response = client
            .save(&SaveRequest::new("TST.ONE", "hello world one"))
            .unwrap();
        assert!(response.suggestions.is_none());
    }

    #[test]
    fn test_suggestions_wire_shape() {
        let server = server();
        raw(
            &server,
            &json!({
                "jsonrpc": "2.0", "id": 1, "method": "tools/call",
                "params": {"name": "sm.texts.save", "arguments": {
                    "symbol": "TST.NEIGHBOR",
                    "text": "hybrid intelligence symbolic memory",
                    "cat": "ai", "subcat": "architecture.hybrid"
                }}
            }),
        );
        let response = raw(
            &server,
            &json!({
                "jsonrpc": "2.0", "id": 2, "method": "tools/call",
                "params": {"name": "sm.texts.save", "arguments": {
                    "symbol": "TST.TWO",
                    "text": "hybrid intelligence and symbolic memory"
                }}
            }),
        );

        let result = &response["result"];
        assert_eq!(result["status"], "created");
        assert_eq!(result["symbol"], "TST.TWO");
        assert_eq!(result["prev"]["cat"], Value::Null);
        assert_eq!(result["suggestions"]["cat"][0]["value"], "ai");
        assert_eq!(result["suggestions"]["subcat"][0]["cat"], "ai");
        assert_eq!(
            result["suggestions"]["subcat"][0]["value"],
            "architecture.hybrid"
        );
    }
}

// ============================================================================
// Reads and Aliases
// ============================================================================

mod reads {
    use super::*;

    #[test]
    fn test_read_by_symbol_and_alias() {
        let client = client();
        client
            .save(&SaveRequest::new("HGI.DEF", "HGI = AI:n ja ihmisen yhteistyö").with_alias("hgi"))
            .unwrap();

        assert_eq!(client.read("HGI.DEF").unwrap(), "HGI = AI:n ja ihmisen yhteistyö");
        assert_eq!(client.read("hgi").unwrap(), "HGI = AI:n ja ihmisen yhteistyö");
    }

    #[test]
    fn test_resave_reports_previous_taxonomy() {
        let client = client();
        client
            .save(
                &SaveRequest::new("TST.ONE", "hello world one")
                    .with_category("smoke")
                    .with_subcategory("smoke.basic"),
            )
            .unwrap();
        let response = client
            .save(&SaveRequest::new("TST.ONE", "hello world one, again"))
            .unwrap();

        assert_eq!(response.outcome.status, SaveStatus::Updated);
        assert_eq!(response.outcome.prev.category.as_deref(), Some("smoke"));
        assert_eq!(
            response.outcome.prev.subcategory.as_deref(),
            Some("smoke.basic")
        );
    }

    #[test]
    fn test_resource_read_echoes_uri() {
        let server = server();
        raw(
            &server,
            &json!({
                "jsonrpc": "2.0", "id": 1, "method": "tools/call",
                "params": {"name": "sm.texts.save", "arguments": {
                    "symbol": "TST.ONE", "text": "hello", "aliases": ["one"]
                }}
            }),
        );
        let response = raw(
            &server,
            &json!({
                "jsonrpc": "2.0", "id": 2, "method": "resources/read",
                "params": {"uri": "resource://sm/v1/texts/one"}
            }),
        );

        let content = &response["result"]["contents"][0];
        assert_eq!(content["uri"], "resource://sm/v1/texts/one");
        assert_eq!(content["type"], "text");
        assert_eq!(content["text"], "hello");
        assert_eq!(response["id"], 2);
    }
}

// ============================================================================
// Error Mapping
// ============================================================================

mod errors {
    use super::*;

    fn error_code(server: &McpServer, method: &str, params: Value) -> i64 {
        let response = raw(
            server,
            &json!({"jsonrpc": "2.0", "id": 7, "method": method, "params": params}),
        );
        assert_eq!(response["id"], 7);
        response["error"]["code"].as_i64().unwrap()
    }

    #[test]
    fn test_error_codes() {
        let server = server();

        assert_eq!(
            error_code(&server, "resources/read", json!({"uri": "resource://sm/v1/texts/missing"})),
            i64::from(codes::NOT_FOUND)
        );
        assert_eq!(
            error_code(&server, "resources/read", json!({"uri": "resource://sm/v1/texts/"})),
            i64::from(codes::INVALID_REQUEST)
        );
        assert_eq!(
            error_code(&server, "tools/call", json!({"name": "sm.texts.delete", "arguments": {}})),
            i64::from(codes::METHOD_NOT_FOUND)
        );
        assert_eq!(
            error_code(
                &server,
                "tools/call",
                json!({"name": "sm.texts.save", "arguments": {"symbol": "TST.ONE", "text": ""}})
            ),
            i64::from(codes::INVALID_PARAMS)
        );
        assert_eq!(
            error_code(&server, "prompts/list", json!({})),
            i64::from(codes::METHOD_NOT_FOUND)
        );
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let server = server();
        let response: Value = serde_json::from_str(&server.handle_request("{not json")).unwrap();
        assert_eq!(response["error"]["code"], codes::PARSE_ERROR);
    }

    #[test]
    fn test_client_sees_typed_errors() {
        let client = client();

        let err = client.read("missing").unwrap_err();
        assert!(matches!(&err, Error::NotFound(name) if name == "missing"));

        let err = client
            .save(&SaveRequest::new("", "body"))
            .unwrap_err();
        assert_eq!(err.kind(), FaultKind::Validation);
    }
}

// ============================================================================
// HTTP Transport
// ============================================================================

#[cfg(feature = "http")]
mod http {
    use super::*;
    use std::net::TcpListener;
    use std::time::Duration;
    use symmem::mcp::{HttpTransport, Transport};

    fn free_port() -> u16 {
        TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    fn connect(port: u16) -> RpcClient<HttpTransport> {
        let url = format!("http://127.0.0.1:{port}/mcp");
        for _ in 0..50 {
            let client = RpcClient::http(&url, Duration::from_secs(2)).unwrap();
            if client.initialize().is_ok() {
                return client;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        panic!("gateway on port {port} never answered");
    }

    #[test]
    fn test_default_build_serves_http() {
        let port = free_port();
        std::thread::spawn(move || {
            let _ = server()
                .with_transport(Transport::Http)
                .with_port(port)
                .start();
        });

        let client = connect(port);
        client
            .save(&SaveRequest::new("TST.HTTP", "over the wire").with_alias("wire"))
            .unwrap();
        assert_eq!(client.read("wire").unwrap(), "over the wire");
    }
}
