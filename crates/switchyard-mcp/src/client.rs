//! MCP client that posts JSON-RPC 2.0 `tools/call` requests to an HTTP
//! endpoint.

use crate::protocol::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use switchyard_core::{SwitchyardError, SwitchyardResult, ToolCall, ToolInvoker};
use tracing::{debug, warn};

/// Talks to one MCP endpoint over HTTP.
pub struct McpHttpClient {
    endpoint: String,
    token: Option<String>,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl McpHttpClient {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> SwitchyardResult<Self> {
        Self::with_timeout(endpoint, token, Duration::from_secs(30))
    }

    pub fn with_timeout(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> SwitchyardResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SwitchyardError::Http(e.to_string()))?;
        Ok(Self::with_client(endpoint, token, http))
    }

    /// Reuse an existing HTTP client (and its connection pool).
    pub fn with_client(
        endpoint: impl Into<String>,
        token: Option<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            token,
            http,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Call a tool and return the raw MCP result.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
        token: Option<&str>,
    ) -> SwitchyardResult<McpToolResult> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let req = JsonRpcRequest::tool_call(id, name, arguments);
        debug!(endpoint = %self.endpoint, tool = name, id, "MCP tools/call");

        let mut builder = self.http.post(&self.endpoint).json(&req);
        if let Some(token) = token.or(self.token.as_deref()) {
            builder = builder.bearer_auth(token);
        }

        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                SwitchyardError::Timeout(format!("MCP tool '{name}'"))
            } else {
                SwitchyardError::Http(format!("MCP tool '{name}': {e}"))
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SwitchyardError::remote(status.as_u16(), name));
        }

        let rpc: JsonRpcResponse = resp
            .json()
            .await
            .map_err(|e| SwitchyardError::Http(format!("Invalid JSON-RPC response: {e}")))?;

        if let Some(err) = rpc.error {
            return Err(SwitchyardError::Tool(err.describe()));
        }

        let result = rpc
            .result
            .ok_or_else(|| SwitchyardError::Tool("Empty tools/call result".into()))?;
        let tool_result: McpToolResult = serde_json::from_value(result)
            .map_err(|e| SwitchyardError::Tool(format!("Failed to parse tool result: {e}")))?;

        if tool_result.is_error {
            let detail = tool_result.first_text().unwrap_or("no detail").to_string();
            warn!(tool = name, %detail, "MCP tool reported an error");
            return Err(SwitchyardError::Tool(format!("Tool '{name}' failed: {detail}")));
        }

        Ok(tool_result)
    }

    /// Invoke `call`, presenting `token` as the bearer credential instead
    /// of the client's own.
    pub async fn call_as(
        &self,
        call: ToolCall,
        token: Option<&str>,
    ) -> SwitchyardResult<serde_json::Value> {
        let result = self.call_tool(&call.name, call.arguments, token).await?;
        Ok(result.into_value())
    }
}

#[async_trait]
impl ToolInvoker for McpHttpClient {
    async fn invoke(&self, call: ToolCall) -> SwitchyardResult<serde_json::Value> {
        self.call_as(call, None).await
    }
}
