use crate::directory::AgentRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use switchyard_core::{SwitchyardError, SwitchyardResult};

/// Vector store operation behind a `vector.*` task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Embed,
    Upsert,
    Query,
    Dot,
}

/// How a forwarded payload reaches the remote agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardCall {
    /// JSON-RPC `tools/call` for the named tool at the agent's endpoint.
    Tool(String),
    /// Plain JSON POST to `endpoint + path`.
    Post(String),
}

/// What the fabric does for a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handler {
    /// Run the orchestration pipeline in-process.
    Orchestrate,
    Store(StoreOp),
    /// Pass the payload through to the first agent of `role`.
    Forward { role: AgentRole, call: ForwardCall },
}

/// A `[[routes]]` entry. Exactly one of `tool` and `post` must be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    pub task: String,
    pub role: AgentRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<String>,
}

impl RouteSpec {
    pub fn handler(&self) -> SwitchyardResult<Handler> {
        let call = match (&self.tool, &self.post) {
            (Some(tool), None) => ForwardCall::Tool(tool.clone()),
            (None, Some(path)) => ForwardCall::Post(path.clone()),
            _ => {
                return Err(SwitchyardError::Config(format!(
                    "Route '{}' must set exactly one of `tool` or `post`",
                    self.task
                )))
            }
        };
        Ok(Handler::Forward {
            role: self.role,
            call,
        })
    }
}

/// Task name → handler. Built once at startup, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    handlers: BTreeMap<String, Handler>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in task set.
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.register("dmn.orchestrate", Handler::Orchestrate);
        table.register("vector.embed", Handler::Store(StoreOp::Embed));
        table.register("vector.upsert", Handler::Store(StoreOp::Upsert));
        table.register("vector.query", Handler::Store(StoreOp::Query));
        table.register("vector.dot", Handler::Store(StoreOp::Dot));
        table.register("rag.query", tool(AgentRole::Retrieval, "rag_vector_query"));
        table.register("actions.review", tool(AgentRole::Review, "review_github_actions"));
        table.register(
            "simulation.step",
            Handler::Forward {
                role: AgentRole::Simulation,
                call: ForwardCall::Post("/step".into()),
            },
        );
        table.register("zk.verify", tool(AgentRole::Verifier, "zk_verify_proof"));
        table.register("ci.release_gate", tool(AgentRole::Ci, "ci_run_release_checks"));
        table
    }

    /// Add or replace the handler for `task`.
    pub fn register(&mut self, task: impl Into<String>, handler: Handler) {
        self.handlers.insert(task.into(), handler);
    }

    /// Register every configured route on top of the current table.
    pub fn with_routes(mut self, routes: &[RouteSpec]) -> SwitchyardResult<Self> {
        for route in routes {
            if route.task.is_empty() {
                return Err(SwitchyardError::Config("Route with an empty task name".into()));
            }
            self.register(route.task.clone(), route.handler()?);
        }
        Ok(self)
    }

    pub fn get(&self, task: &str) -> Option<&Handler> {
        self.handlers.get(task)
    }

    /// Registered task names, sorted.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

fn tool(role: AgentRole, name: &str) -> Handler {
    Handler::Forward {
        role,
        call: ForwardCall::Tool(name.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table() {
        let table = DispatchTable::standard();
        assert_eq!(table.tasks().count(), 10);
        assert_eq!(table.get("dmn.orchestrate"), Some(&Handler::Orchestrate));
        assert_eq!(
            table.get("vector.dot"),
            Some(&Handler::Store(StoreOp::Dot))
        );
        assert_eq!(
            table.get("simulation.step"),
            Some(&Handler::Forward {
                role: AgentRole::Simulation,
                call: ForwardCall::Post("/step".into()),
            })
        );
        assert!(table.get("deploy.rocket").is_none());
    }

    #[test]
    fn test_routes_extend_and_override() {
        let routes = vec![
            RouteSpec {
                task: "telemetry.push".into(),
                role: AgentRole::Telemetry,
                tool: None,
                post: Some("/push".into()),
            },
            RouteSpec {
                task: "rag.query".into(),
                role: AgentRole::Retrieval,
                tool: Some("rag_hybrid_query".into()),
                post: None,
            },
        ];
        let table = DispatchTable::standard().with_routes(&routes).unwrap();
        assert_eq!(table.tasks().count(), 11);
        assert_eq!(
            table.get("rag.query"),
            Some(&Handler::Forward {
                role: AgentRole::Retrieval,
                call: ForwardCall::Tool("rag_hybrid_query".into()),
            })
        );
    }

    #[test]
    fn test_route_needs_exactly_one_call() {
        let both = RouteSpec {
            task: "x".into(),
            role: AgentRole::Ci,
            tool: Some("a".into()),
            post: Some("/b".into()),
        };
        let neither = RouteSpec {
            tool: None,
            post: None,
            ..both.clone()
        };
        assert_eq!(both.handler().unwrap_err().kind(), "config_error");
        assert_eq!(neither.handler().unwrap_err().kind(), "config_error");
    }

    #[test]
    fn test_route_spec_from_toml() {
        #[derive(Deserialize)]
        struct File {
            routes: Vec<RouteSpec>,
        }
        let file: File = toml::from_str(
            r#"
            [[routes]]
            task = "zk.batch"
            role = "verifier"
            tool = "zk_verify_batch"
            "#,
        )
        .unwrap();
        assert_eq!(file.routes[0].role, AgentRole::Verifier);
        assert!(file.routes[0].post.is_none());
    }
}
