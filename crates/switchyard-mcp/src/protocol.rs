//! MCP JSON-RPC 2.0 message types.

use serde::{Deserialize, Serialize};

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }

    /// A `tools/call` request for `name` with `arguments`.
    pub fn tool_call(id: u64, name: &str, arguments: serde_json::Value) -> Self {
        Self::new(
            id,
            "tools/call",
            Some(serde_json::json!({ "name": name, "arguments": arguments })),
        )
    }
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    pub id: Option<u64>,
    pub result: Option<serde_json::Value>,
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    /// Server-supplied detail, appended to the error message when present.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    /// `MCP error <code>: <message>`, followed by `data` when the server sent any.
    pub fn describe(&self) -> String {
        match &self.data {
            Some(serde_json::Value::String(detail)) => {
                format!("MCP error {}: {} ({detail})", self.code, self.message)
            }
            Some(detail) if !detail.is_null() => {
                format!("MCP error {}: {} ({detail})", self.code, self.message)
            }
            _ => format!("MCP error {}: {}", self.code, self.message),
        }
    }
}

/// Result of a `tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct McpToolResult {
    #[serde(default)]
    pub content: Vec<McpContent>,
    #[serde(default, rename = "structuredContent")]
    pub structured_content: Option<serde_json::Value>,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

/// MCP content block.
#[derive(Debug, Clone, Deserialize)]
pub struct McpContent {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default)]
    pub text: String,
}

impl McpToolResult {
    /// The first text content block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
    }

    /// The tool's JSON payload: `structuredContent` when present, otherwise
    /// the first text block parsed as JSON, or kept as a string when it is
    /// not JSON. A result with no content is `null`.
    pub fn into_value(self) -> serde_json::Value {
        if let Some(structured) = self.structured_content {
            return structured;
        }
        match self.first_text() {
            Some(text) => serde_json::from_str(text)
                .unwrap_or_else(|_| serde_json::Value::String(text.to_string())),
            None => serde_json::Value::Null,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> McpToolResult {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_tool_call_request_shape() {
        let req = JsonRpcRequest::tool_call(7, "rag_vector_query", json!({"query": "q"}));
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["jsonrpc"], "2.0");
        assert_eq!(v["id"], 7);
        assert_eq!(v["method"], "tools/call");
        assert_eq!(v["params"]["name"], "rag_vector_query");
        assert_eq!(v["params"]["arguments"]["query"], "q");
    }

    #[test]
    fn test_error_data_appended_to_description() {
        let err: JsonRpcError = serde_json::from_value(json!({
            "code": -32602,
            "message": "Invalid params",
            "data": "missing field `proof`"
        }))
        .unwrap();
        assert_eq!(
            err.describe(),
            "MCP error -32602: Invalid params (missing field `proof`)"
        );

        let bare: JsonRpcError =
            serde_json::from_value(json!({"code": -32601, "message": "Method not found"})).unwrap();
        assert_eq!(bare.describe(), "MCP error -32601: Method not found");
    }

    #[test]
    fn test_response_without_version_field_parses() {
        let resp: JsonRpcResponse =
            serde_json::from_value(json!({"id": 3, "result": {"content": []}})).unwrap();
        assert_eq!(resp.id, Some(3));
        assert!(resp.error.is_none());
    }

    #[test]
    fn test_structured_content_preferred() {
        let result = parse(json!({
            "content": [{"type": "text", "text": "{\"ignored\": true}"}],
            "structuredContent": {"status": "ok"}
        }));
        assert_eq!(result.into_value(), json!({"status": "ok"}));
    }

    #[test]
    fn test_text_parsed_as_json() {
        let result = parse(json!({"content": [{"type": "text", "text": "{\"plan\": \"allow\"}"}]}));
        assert_eq!(result.into_value()["plan"], "allow");
    }

    #[test]
    fn test_plain_text_kept_as_string() {
        let result = parse(json!({"content": [{"type": "text", "text": "dispatched"}]}));
        assert_eq!(result.into_value(), json!("dispatched"));
    }

    #[test]
    fn test_empty_result_is_null() {
        assert!(parse(json!({})).into_value().is_null());
    }
}
