//! MCP (Model Context Protocol) tool calls over HTTP.
//!
//! Agents reached through the routing fabric and the orchestration pipeline
//! expose named tools behind a JSON-RPC 2.0 `tools/call` endpoint.
//! [`McpHttpClient`] implements [`switchyard_core::ToolInvoker`] on top of it.

pub mod client;
pub mod protocol;

pub use client::McpHttpClient;
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpContent, McpToolResult};
