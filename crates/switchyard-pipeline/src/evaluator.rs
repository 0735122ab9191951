//! Rule-table decision evaluator.
//!
//! Four tables are consulted in order. Each row lists its input cells then
//! its output cells; `"-"` matches anything and the first matching row wins.
//! When several tables share an id, the last one with a matching row decides.
//! A table with no matching row leaves its outputs at the defaults
//! (`reject`, `deny`, `heavy`, `deny`, `stop`).

use serde::{Deserialize, Serialize};
use switchyard_core::{SwitchyardError, SwitchyardResult};

pub const REQUEST_ROUTING: &str = "dec-requestRouting";
pub const SKILL_POLICY: &str = "dec-skillPolicy";
pub const AGENT_CAPACITY: &str = "dec-agentCapacity";
pub const ORCHESTRATION_PLAN: &str = "dec-orchestrationPlan";

const WILDCARD: &str = "-";

const DEFAULT_ROUTE: &str = "reject";
const DEFAULT_POLICY: &str = "deny";
const DEFAULT_CAPACITY: &str = "heavy";
const DEFAULT_PLAN: &str = "deny";
const DEFAULT_ACTION: &str = "stop";

/// One decision table: rows of string cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTable {
    pub id: String,
    pub rules: Vec<Vec<String>>,
}

/// The full set of decision tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionModel {
    pub decisions: Vec<DecisionTable>,
}

#[derive(Deserialize)]
struct ModelDocument {
    #[serde(rename = "dmn-model")]
    model: DecisionModel,
}

/// (inputs, outputs) per known table.
fn arity(id: &str) -> Option<(usize, usize)> {
    match id {
        REQUEST_ROUTING | SKILL_POLICY | AGENT_CAPACITY => Some((2, 1)),
        ORCHESTRATION_PLAN => Some((3, 2)),
        _ => None,
    }
}

fn rows<const N: usize>(rules: &[[&str; N]]) -> Vec<Vec<String>> {
    rules
        .iter()
        .map(|r| r.iter().map(|c| (*c).to_string()).collect())
        .collect()
}

impl DecisionModel {
    /// Parse a model document of the form
    /// `{"dmn-model": {"decisions": [{"id": ..., "rules": [[...]]}]}}`.
    pub fn from_json(json: &str) -> SwitchyardResult<Self> {
        let doc: ModelDocument = serde_json::from_str(json)
            .map_err(|e| SwitchyardError::Config(format!("Invalid decision model: {e}")))?;
        doc.model.validate()?;
        Ok(doc.model)
    }

    /// Every row of a known table must have exactly inputs + outputs cells.
    pub fn validate(&self) -> SwitchyardResult<()> {
        for table in &self.decisions {
            let Some((inputs, outputs)) = arity(&table.id) else {
                continue;
            };
            for (i, rule) in table.rules.iter().enumerate() {
                if rule.len() != inputs + outputs {
                    return Err(SwitchyardError::Config(format!(
                        "Rule {i} of '{}' has {} cells, expected {}",
                        table.id,
                        rule.len(),
                        inputs + outputs
                    )));
                }
            }
        }
        Ok(())
    }

    /// The model shipped with Switchyard.
    pub fn builtin() -> Self {
        Self {
            decisions: vec![
                DecisionTable {
                    id: REQUEST_ROUTING.into(),
                    rules: rows(&[
                        ["maintenance", "-", "reject"],
                        ["healthy", "query", "fast-path"],
                        ["healthy", "-", "standard"],
                        ["degraded", "query", "standard"],
                        ["degraded", "-", "queued"],
                    ]),
                },
                DecisionTable {
                    id: SKILL_POLICY.into(),
                    rules: rows(&[
                        ["-", "critical", "deny"],
                        ["read", "-", "allow"],
                        ["write", "low", "allow"],
                        ["write", "-", "review"],
                        ["admin", "-", "review"],
                    ]),
                },
                DecisionTable {
                    id: AGENT_CAPACITY.into(),
                    rules: rows(&[
                        ["low", "simple", "light"],
                        ["low", "-", "standard"],
                        ["medium", "complex", "heavy"],
                        ["medium", "-", "standard"],
                        ["high", "-", "heavy"],
                    ]),
                },
                DecisionTable {
                    id: ORCHESTRATION_PLAN.into(),
                    rules: rows(&[
                        ["reject", "-", "-", "deny", "stop"],
                        ["-", "deny", "-", "deny", "stop"],
                        ["fast-path", "allow", "light", "direct", "execute"],
                        ["-", "allow", "heavy", "scale-out", "queue"],
                        ["-", "allow", "-", "standard", "execute"],
                        ["-", "review", "-", "escalate", "hold"],
                    ]),
                },
            ],
        }
    }

    /// Outputs of the first matching row in the last table named `id` that
    /// has one. Rows of the wrong width never match.
    fn first_match<'a>(&'a self, id: &str, inputs: &[&str]) -> Option<&'a [String]> {
        let width = arity(id).map(|(i, o)| i + o);
        self.decisions
            .iter()
            .rev()
            .filter(|t| t.id == id)
            .find_map(|t| {
                t.rules.iter().find(|rule| {
                    width.map_or(rule.len() > inputs.len(), |w| rule.len() == w)
                        && rule
                            .iter()
                            .zip(inputs)
                            .all(|(cell, value)| cell == WILDCARD || cell == value)
                })
            })
            .map(|rule| &rule[inputs.len()..])
    }
}

impl Default for DecisionModel {
    fn default() -> Self {
        Self::builtin()
    }
}

/// The six context fields the tables read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionInput {
    pub system_status: String,
    pub request_type: String,
    pub skill_category: String,
    pub security_level: String,
    pub agent_load: String,
    pub context_complexity: String,
}

impl DecisionInput {
    /// Read the fields from a normalized context object, looking inside a
    /// nested `"context"` object when present. Missing fields are empty and
    /// only match wildcards; numbers and booleans are compared as text.
    pub fn from_context(value: &serde_json::Value) -> Self {
        let source = match value.get("context") {
            Some(inner) if inner.is_object() => inner,
            _ => value,
        };
        let field = |key: &str| match source.get(key) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(v @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => v.to_string(),
            _ => String::new(),
        };
        Self {
            system_status: field("systemStatus"),
            request_type: field("requestType"),
            skill_category: field("skillCategory"),
            security_level: field("securityLevel"),
            agent_load: field("agentLoad"),
            context_complexity: field("contextComplexity"),
        }
    }

    /// Names of fields that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("systemStatus", &self.system_status),
            ("requestType", &self.request_type),
            ("skillCategory", &self.skill_category),
            ("securityLevel", &self.security_level),
            ("agentLoad", &self.agent_load),
            ("contextComplexity", &self.context_complexity),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_empty())
        .map(|(k, _)| k)
        .collect()
    }
}

/// Outputs of the four tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub route: String,
    pub policy: String,
    pub capacity: String,
    pub plan: String,
    pub action: String,
    /// Ids of tables where no row matched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaulted: Vec<String>,
}

/// Apply `model` to `input`. Pure: no I/O, same input gives same output.
pub fn evaluate(model: &DecisionModel, input: &DecisionInput) -> DecisionResult {
    let mut defaulted = Vec::new();
    let mut single = |id: &str, inputs: [&str; 2], default: &str| -> String {
        match model.first_match(id, &inputs) {
            Some(out) => out[0].clone(),
            None => {
                defaulted.push(id.to_string());
                default.to_string()
            }
        }
    };

    let route = single(
        REQUEST_ROUTING,
        [input.system_status.as_str(), input.request_type.as_str()],
        DEFAULT_ROUTE,
    );
    let policy = single(
        SKILL_POLICY,
        [input.skill_category.as_str(), input.security_level.as_str()],
        DEFAULT_POLICY,
    );
    let capacity = single(
        AGENT_CAPACITY,
        [input.agent_load.as_str(), input.context_complexity.as_str()],
        DEFAULT_CAPACITY,
    );

    let plan_inputs = [route.as_str(), policy.as_str(), capacity.as_str()];
    let (plan, action) = match model.first_match(ORCHESTRATION_PLAN, &plan_inputs) {
        Some(out) => (out[0].clone(), out[1].clone()),
        None => {
            defaulted.push(ORCHESTRATION_PLAN.to_string());
            (DEFAULT_PLAN.to_string(), DEFAULT_ACTION.to_string())
        }
    };

    DecisionResult {
        route,
        policy,
        capacity,
        plan,
        action,
        defaulted,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(sys: &str, req: &str, cat: &str, sec: &str, load: &str, cx: &str) -> DecisionInput {
        DecisionInput {
            system_status: sys.into(),
            request_type: req.into(),
            skill_category: cat.into(),
            security_level: sec.into(),
            agent_load: load.into(),
            context_complexity: cx.into(),
        }
    }

    #[test]
    fn test_fast_path_execute() {
        let r = evaluate(
            &DecisionModel::builtin(),
            &input("healthy", "query", "read", "low", "low", "simple"),
        );
        assert_eq!(r.route, "fast-path");
        assert_eq!(r.policy, "allow");
        assert_eq!(r.capacity, "light");
        assert_eq!(r.plan, "direct");
        assert_eq!(r.action, "execute");
        assert!(r.defaulted.is_empty());
    }

    #[test]
    fn test_heavy_load_scales_out() {
        let r = evaluate(
            &DecisionModel::builtin(),
            &input("healthy", "mutation", "read", "low", "high", "complex"),
        );
        assert_eq!(r.route, "standard");
        assert_eq!(r.capacity, "heavy");
        assert_eq!((r.plan.as_str(), r.action.as_str()), ("scale-out", "queue"));
    }

    #[test]
    fn test_critical_security_denied() {
        let r = evaluate(
            &DecisionModel::builtin(),
            &input("healthy", "query", "read", "critical", "low", "simple"),
        );
        assert_eq!(r.policy, "deny");
        assert_eq!((r.plan.as_str(), r.action.as_str()), ("deny", "stop"));
    }

    #[test]
    fn test_empty_input_uses_defaults() {
        let r = evaluate(&DecisionModel::builtin(), &DecisionInput::default());
        assert_eq!(r.route, "reject");
        assert_eq!(r.policy, "deny");
        assert_eq!(r.capacity, "heavy");
        assert_eq!(r.plan, "deny");
        assert_eq!(r.action, "stop");
        assert_eq!(r.defaulted.len(), 3);
        assert!(!r.defaulted.contains(&ORCHESTRATION_PLAN.to_string()));
    }

    #[test]
    fn test_first_matching_row_wins() {
        let model = DecisionModel::from_json(
            &json!({"dmn-model": {"decisions": [
                {"id": "dec-requestRouting", "rules": [["-", "-", "first"], ["healthy", "-", "second"]]}
            ]}})
            .to_string(),
        )
        .unwrap();
        let r = evaluate(&model, &input("healthy", "x", "", "", "", ""));
        assert_eq!(r.route, "first");
    }

    #[test]
    fn test_later_duplicate_table_overrides() {
        let model = DecisionModel::from_json(
            &json!({"dmn-model": {"decisions": [
                {"id": "dec-requestRouting", "rules": [["healthy", "-", "base"]]},
                {"id": "dec-requestRouting", "rules": [["healthy", "-", "override"]]},
                {"id": "dec-requestRouting", "rules": [["degraded", "-", "unused"]]}
            ]}})
            .to_string(),
        )
        .unwrap();
        let r = evaluate(&model, &input("healthy", "query", "", "", "", ""));
        assert_eq!(r.route, "override");
        assert!(!r.defaulted.contains(&REQUEST_ROUTING.to_string()));
    }

    #[test]
    fn test_short_plan_row_falls_back_to_defaults() {
        let mut model = DecisionModel::builtin();
        for table in &mut model.decisions {
            if table.id == ORCHESTRATION_PLAN {
                table.rules = vec![vec!["-".into(), "-".into(), "-".into(), "standard".into()]];
            }
        }
        let r = evaluate(&model, &DecisionInput::default());
        assert_eq!((r.plan.as_str(), r.action.as_str()), ("deny", "stop"));
        assert!(r.defaulted.contains(&ORCHESTRATION_PLAN.to_string()));
    }

    #[test]
    fn test_wide_row_never_matches() {
        let model = DecisionModel {
            decisions: vec![DecisionTable {
                id: REQUEST_ROUTING.into(),
                rules: rows(&[["-", "-", "standard", "extra"]]),
            }],
        };
        let r = evaluate(&model, &input("healthy", "query", "", "", "", ""));
        assert_eq!(r.route, "reject");
        assert!(r.defaulted.contains(&REQUEST_ROUTING.to_string()));
    }

    #[test]
    fn test_empty_model_all_defaults() {
        let model = DecisionModel { decisions: vec![] };
        let r = evaluate(&model, &input("healthy", "query", "read", "low", "low", "simple"));
        assert_eq!(r.action, "stop");
        assert_eq!(r.defaulted.len(), 4);
    }

    #[test]
    fn test_from_json_rejects_bad_arity() {
        let err = DecisionModel::from_json(
            &json!({"dmn-model": {"decisions": [
                {"id": "dec-orchestrationPlan", "rules": [["a", "b", "c", "d"]]}
            ]}})
            .to_string(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "config_error");
    }

    #[test]
    fn test_from_json_ignores_unknown_tables() {
        let model = DecisionModel::from_json(
            &json!({"dmn-model": {"decisions": [{"id": "dec-other", "rules": [["x"]]}]}})
                .to_string(),
        )
        .unwrap();
        assert_eq!(model.decisions.len(), 1);
    }

    #[test]
    fn test_input_from_nested_context() {
        let value = json!({"context": {"systemStatus": "healthy", "agentLoad": 3}});
        let input = DecisionInput::from_context(&value);
        assert_eq!(input.system_status, "healthy");
        assert_eq!(input.agent_load, "3");
        assert!(input.missing_fields().contains(&"requestType"));
    }

    #[test]
    fn test_input_from_flat_context() {
        let input = DecisionInput::from_context(&json!({"requestType": "query", "skillCategory": "read"}));
        assert_eq!(input.request_type, "query");
        assert_eq!(input.skill_category, "read");
    }

    #[test]
    fn test_result_serializes_without_empty_defaulted() {
        let r = evaluate(
            &DecisionModel::builtin(),
            &input("healthy", "query", "read", "low", "low", "simple"),
        );
        let v = serde_json::to_value(&r).unwrap();
        assert!(v.get("defaulted").is_none());
        assert_eq!(v["plan"], "direct");
    }
}
