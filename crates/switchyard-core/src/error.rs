use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A convenience `Result` alias using [`SwitchyardError`].
pub type SwitchyardResult<T> = Result<T, SwitchyardError>;

/// Top-level error type shared by every Switchyard crate.
///
/// Routing, pipeline and store failures each get their own variant so that
/// callers can branch on the failure kind instead of parsing messages.
#[derive(Error, Debug)]
pub enum SwitchyardError {
    /// The envelope asked for a role that no directory entry carries.
    #[error("No agents found for role: {0}")]
    NoAgentForRole(String),

    /// No role override was given and the directory has no orchestrator.
    #[error("No orchestrator agent configured")]
    NoOrchestratorConfigured,

    /// The task name is not in the dispatch table.
    #[error("Unknown routing task: {0}")]
    UnknownTask(String),

    /// The normalization stage of an orchestration run failed.
    #[error("Normalization failed: {0}")]
    NormalizationFailed(String),

    /// The dispatch stage failed. `partial` carries the earlier stage outputs.
    #[error("Dispatch failed: {message}")]
    DispatchFailed {
        /// Why the dispatch tool call failed.
        message: String,
        /// Context, evidence and decision produced before dispatch.
        partial: Box<serde_json::Value>,
    },

    /// A vector's length differs from the namespace dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension already fixed for the namespace.
        expected: usize,
        /// Length of the offending vector.
        actual: usize,
    },

    /// A remote collaborator answered with a non-2xx status.
    #[error("{message} failed: {status}")]
    Remote {
        /// HTTP status code returned by the collaborator.
        status: u16,
        /// The operation that was attempted.
        message: String,
    },

    /// An external tool answered with a JSON-RPC error or an error result.
    #[error("Tool error: {0}")]
    Tool(String),

    /// Transport-level HTTP failure (connect, decode, ...).
    #[error("HTTP error: {0}")]
    Http(String),

    /// An external call did not resolve within its configured budget.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// A request payload could not be understood.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Persistence failure inside the vector store.
    #[error("Store error: {0}")]
    Store(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem or socket failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SwitchyardError {
    /// Stable snake-case identifier for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SwitchyardError::NoAgentForRole(_) => "no_agent_for_role",
            SwitchyardError::NoOrchestratorConfigured => "no_orchestrator_configured",
            SwitchyardError::UnknownTask(_) => "unknown_task",
            SwitchyardError::NormalizationFailed(_) => "normalization_failed",
            SwitchyardError::DispatchFailed { .. } => "dispatch_failed",
            SwitchyardError::DimensionMismatch { .. } => "dimension_mismatch",
            SwitchyardError::Remote { .. } => "remote_error",
            SwitchyardError::Tool(_) => "tool_error",
            SwitchyardError::Http(_) => "http_error",
            SwitchyardError::Timeout(_) => "timeout",
            SwitchyardError::InvalidRequest(_) => "invalid_request",
            SwitchyardError::Store(_) => "store_error",
            SwitchyardError::Config(_) => "config_error",
            SwitchyardError::Json(_) => "json_error",
            SwitchyardError::Io(_) => "io_error",
        }
    }

    /// Build a [`SwitchyardError::Remote`] from a status code and operation name.
    pub fn remote(status: u16, operation: impl Into<String>) -> Self {
        SwitchyardError::Remote {
            status,
            message: operation.into(),
        }
    }
}

/// Structured failure body returned to callers: kind + message, plus
/// whatever diagnostic payload the error carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    /// Same value as [`SwitchyardError::kind`].
    pub kind: String,
    /// Human-readable error message.
    pub message: String,
    /// Partial results, dimensions or remote status, depending on the kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&SwitchyardError> for Failure {
    fn from(err: &SwitchyardError) -> Self {
        let details = match err {
            SwitchyardError::DispatchFailed { partial, .. } => Some((**partial).clone()),
            SwitchyardError::DimensionMismatch { expected, actual } => {
                Some(serde_json::json!({ "expected": expected, "actual": actual }))
            }
            SwitchyardError::Remote { status, .. } => Some(serde_json::json!({ "status": status })),
            _ => None,
        };
        Failure {
            kind: err.kind().to_string(),
            message: err.to_string(),
            details,
        }
    }
}
