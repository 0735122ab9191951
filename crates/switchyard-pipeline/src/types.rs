use crate::critic::CriticNote;
use crate::evaluator::DecisionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stage an orchestration run is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Normalize,
    Evaluate,
    Retrieve,
    Dispatch,
    Completed,
    Failed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Normalize => write!(f, "NORMALIZE"),
            Stage::Evaluate => write!(f, "EVALUATE"),
            Stage::Retrieve => write!(f, "RETRIEVE"),
            Stage::Dispatch => write!(f, "DISPATCH"),
            Stage::Completed => write!(f, "COMPLETED"),
            Stage::Failed => write!(f, "FAILED"),
        }
    }
}

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// Everything one run has produced so far. Lives only for the run.
#[derive(Debug, Clone)]
pub struct OrchestrationState {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub stage: Stage,
    pub input: serde_json::Value,
    pub context: Option<serde_json::Value>,
    pub evaluation: Option<DecisionResult>,
    pub critic: Option<CriticNote>,
    pub evidence: Vec<serde_json::Value>,
    pub dispatch: Option<serde_json::Value>,
}

impl OrchestrationState {
    pub fn new(input: serde_json::Value) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            stage: Stage::Normalize,
            input,
            context: None,
            evaluation: None,
            critic: None,
            evidence: Vec::new(),
            dispatch: None,
        }
    }

    pub fn advance(&mut self, stage: Stage) {
        self.stage = stage;
    }

    /// Stage outputs gathered so far, for failure payloads.
    pub fn partial(&self) -> serde_json::Value {
        serde_json::json!({
            "run_id": self.run_id,
            "status": RunStatus::Failed,
            "stage": self.stage,
            "dmn_result": self.evaluation,
            "critic": self.critic,
            "rag_support": self.evidence,
            "plan": self.evaluation.as_ref().map(|e| e.plan.clone()),
            "action": self.evaluation.as_ref().map(|e| e.action.clone()),
        })
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestrationOutcome {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub dmn_result: DecisionResult,
    pub critic: CriticNote,
    pub rag_support: Vec<serde_json::Value>,
    pub plan: String,
    pub action: String,
    pub dispatch_status: serde_json::Value,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_value(RunStatus::Completed).unwrap(), "COMPLETED");
        assert_eq!(serde_json::to_value(Stage::Dispatch).unwrap(), "DISPATCH");
        assert_eq!(Stage::Retrieve.to_string(), "RETRIEVE");
    }

    #[test]
    fn test_partial_before_evaluation() {
        let state = OrchestrationState::new(serde_json::json!({"x": 1}));
        let partial = state.partial();
        assert_eq!(partial["status"], "FAILED");
        assert_eq!(partial["stage"], "NORMALIZE");
        assert!(partial["dmn_result"].is_null());
        assert_eq!(partial["rag_support"], serde_json::json!([]));
    }
}
