use crate::error::SwitchyardResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A request to invoke a named external tool with a JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id, used in logs only.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON arguments to pass to the tool.
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            arguments,
        }
    }
}

/// Anything that can execute a [`ToolCall`] and hand back its JSON result.
///
/// The pipeline reaches its normalization, retrieval and dispatch
/// collaborators through this seam; the transport is up to the implementor.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, call: ToolCall) -> SwitchyardResult<serde_json::Value>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_call_ids_are_unique() {
        let a = ToolCall::new("normalize", serde_json::json!({}));
        let b = ToolCall::new("normalize", serde_json::json!({}));
        assert_ne!(a.id, b.id);
        assert_eq!(a.name, "normalize");
    }

    struct Echo;

    #[async_trait]
    impl ToolInvoker for Echo {
        async fn invoke(&self, call: ToolCall) -> SwitchyardResult<serde_json::Value> {
            Ok(serde_json::json!({ "tool": call.name, "args": call.arguments }))
        }
    }

    #[tokio::test]
    async fn test_invoker_object_safe() {
        let invoker: Box<dyn ToolInvoker> = Box::new(Echo);
        let out = invoker
            .invoke(ToolCall::new("echo", serde_json::json!({"x": 1})))
            .await
            .unwrap();
        assert_eq!(out["tool"], "echo");
        assert_eq!(out["args"]["x"], 1);
    }
}
