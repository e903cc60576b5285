//! JSON-RPC gateway.
//!
//! The gateway serves a fixed method set over a single request/response
//! channel:
//!
//! | Method | Effect |
//! |--------|--------|
//! | `initialize` | protocol version, server identity, capabilities |
//! | `notifications/initialized` | acknowledgment, returns `null` |
//! | `tools/call` (`sm.texts.save`) | save, plus suggestions when taxonomy is missing |
//! | `resources/read` (`resource://sm/v1/texts/<name>`) | body lookup by symbol or alias |
//!
//! ## Usage
//!
//! ```bash
//! symmem serve                      # stdio
//! symmem serve --transport http     # POST http://127.0.0.1:8000/mcp
//! ```

mod client;
mod dispatch;
mod resources;
mod server;
mod tool_types;

pub use client::{HttpTransport, LocalTransport, RpcClient, RpcTransport};
pub use dispatch::McpMethod;
pub use resources::{ReadResult, ResourceContent, TEXT_URI_PREFIX, parse_text_uri, text_uri};
pub use server::{McpServer, PROTOCOL_VERSION, SERVER_NAME, Transport, codes};
pub use tool_types::{SAVE_TOOL, SaveArgs};
