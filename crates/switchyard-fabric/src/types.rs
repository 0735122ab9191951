use serde::{Deserialize, Serialize};

/// A routing request. Lives for one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingEnvelope {
    /// Caller identifier, used for logging only.
    #[serde(default)]
    pub source: String,
    pub task: String,
    /// Role override; without it the orchestrator serves the request.
    #[serde(default, rename = "targetRole", skip_serializing_if = "Option::is_none")]
    pub target_role: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Bearer credential passed on to forwarded calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl RoutingEnvelope {
    pub fn new(task: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            source: String::new(),
            task: task.into(),
            target_role: None,
            payload,
            token: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.target_role = Some(role.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// The id of the agent that served the request and its response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingResult {
    pub agent: String,
    pub response: serde_json::Value,
}
