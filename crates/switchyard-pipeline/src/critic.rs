//! Critic pass over an evaluation.
//!
//! [`critique`] reviews the evaluator's inputs and outputs and returns a
//! separate annotation. It never changes the evaluation itself.

use crate::evaluator::{DecisionInput, DecisionResult};
use serde::{Deserialize, Serialize};

const DEFAULTED_PENALTY: f64 = 0.25;
const MISSING_FIELD_PENALTY: f64 = 0.05;
const CONFLICT_PENALTY: f64 = 0.2;
/// Below this confidence the critic recommends holding an actionable plan.
const OVERRIDE_THRESHOLD: f64 = 0.5;

/// Critic annotation attached to every orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticNote {
    /// In `[0, 1]`; 1 means every table matched and nothing looked off.
    pub confidence: f64,
    pub flags: Vec<String>,
    /// Suggested replacement action, if the critic disagrees.
    #[serde(rename = "override")]
    pub override_action: Option<String>,
}

/// Review `result` against the `input` it was computed from.
pub fn critique(input: &DecisionInput, result: &DecisionResult) -> CriticNote {
    let mut confidence: f64 = 1.0;
    let mut flags = Vec::new();

    for table in &result.defaulted {
        flags.push(format!("defaulted:{table}"));
        confidence -= DEFAULTED_PENALTY;
    }

    for field in input.missing_fields() {
        flags.push(format!("missing:{field}"));
        confidence -= MISSING_FIELD_PENALTY;
    }

    let executes = result.action == "execute";
    if executes && matches!(input.system_status.as_str(), "degraded" | "maintenance") {
        flags.push("execute_while_degraded".to_string());
        confidence -= CONFLICT_PENALTY;
    }
    if executes && result.capacity == "heavy" {
        flags.push("execute_at_heavy_capacity".to_string());
        confidence -= CONFLICT_PENALTY;
    }

    let confidence = confidence.clamp(0.0, 1.0);
    let override_action = (confidence < OVERRIDE_THRESHOLD && result.action != "stop")
        .then(|| "hold".to_string());

    CriticNote {
        confidence,
        flags,
        override_action,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::evaluator::{evaluate, DecisionModel};

    fn full_input() -> DecisionInput {
        DecisionInput {
            system_status: "healthy".into(),
            request_type: "query".into(),
            skill_category: "read".into(),
            security_level: "low".into(),
            agent_load: "low".into(),
            context_complexity: "simple".into(),
        }
    }

    #[test]
    fn test_clean_run_full_confidence() {
        let input = full_input();
        let result = evaluate(&DecisionModel::builtin(), &input);
        let note = critique(&input, &result);
        assert!((note.confidence - 1.0).abs() < f64::EPSILON);
        assert!(note.flags.is_empty());
        assert!(note.override_action.is_none());
    }

    #[test]
    fn test_critic_does_not_touch_result() {
        let input = DecisionInput::default();
        let result = evaluate(&DecisionModel::builtin(), &input);
        let before = result.clone();
        let _ = critique(&input, &result);
        assert_eq!(result, before);
    }

    #[test]
    fn test_defaults_lower_confidence() {
        let input = DecisionInput::default();
        let result = evaluate(&DecisionModel::builtin(), &input);
        let note = critique(&input, &result);
        assert!(note.confidence < 0.5);
        assert!(note.flags.iter().any(|f| f == "defaulted:dec-requestRouting"));
        assert!(note.flags.iter().any(|f| f == "missing:agentLoad"));
        // Already stopping: nothing to override.
        assert!(note.override_action.is_none());
    }

    #[test]
    fn test_conflict_flags() {
        let input = DecisionInput {
            system_status: "degraded".into(),
            ..full_input()
        };
        let result = DecisionResult {
            route: "standard".into(),
            policy: "allow".into(),
            capacity: "heavy".into(),
            plan: "standard".into(),
            action: "execute".into(),
            defaulted: vec!["dec-agentCapacity".into()],
        };
        let note = critique(&input, &result);
        assert!(note.flags.contains(&"execute_while_degraded".to_string()));
        assert!(note.flags.contains(&"execute_at_heavy_capacity".to_string()));
        assert!(note.confidence < 0.5);
        assert_eq!(note.override_action.as_deref(), Some("hold"));
    }

    #[test]
    fn test_confidence_clamped() {
        let result = DecisionResult {
            route: "x".into(),
            policy: "x".into(),
            capacity: "heavy".into(),
            plan: "x".into(),
            action: "execute".into(),
            defaulted: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        };
        let note = critique(&DecisionInput::default(), &result);
        assert!((note.confidence - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_override_serialized_name() {
        let note = CriticNote {
            confidence: 0.2,
            flags: vec![],
            override_action: Some("hold".into()),
        };
        let v = serde_json::to_value(&note).unwrap();
        assert_eq!(v["override"], "hold");
    }
}
