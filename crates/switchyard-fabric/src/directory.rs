use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use switchyard_core::{SwitchyardError, SwitchyardResult};

/// Role an agent plays. Routing resolves agents by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentRole {
    /// Owns the orchestration pipeline; the default target of every envelope.
    Orchestrator,
    Decision,
    Review,
    Retrieval,
    VectorStore,
    Gateway,
    SessionCoordinator,
    Ci,
    Verifier,
    Simulation,
    Telemetry,
    GenericClient,
}

impl AgentRole {
    pub const ALL: [AgentRole; 12] = [
        AgentRole::Orchestrator,
        AgentRole::Decision,
        AgentRole::Review,
        AgentRole::Retrieval,
        AgentRole::VectorStore,
        AgentRole::Gateway,
        AgentRole::SessionCoordinator,
        AgentRole::Ci,
        AgentRole::Verifier,
        AgentRole::Simulation,
        AgentRole::Telemetry,
        AgentRole::GenericClient,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Orchestrator => "orchestrator",
            AgentRole::Decision => "decision",
            AgentRole::Review => "review",
            AgentRole::Retrieval => "retrieval",
            AgentRole::VectorStore => "vector-store",
            AgentRole::Gateway => "gateway",
            AgentRole::SessionCoordinator => "session-coordinator",
            AgentRole::Ci => "ci",
            AgentRole::Verifier => "verifier",
            AgentRole::Simulation => "simulation",
            AgentRole::Telemetry => "telemetry",
            AgentRole::GenericClient => "generic-client",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = SwitchyardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| SwitchyardError::InvalidRequest(format!("Unknown agent role: {s}")))
    }
}

/// How an agent is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transport {
    InProcess,
    Remote,
    Socket,
}

/// An addressable agent. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub id: String,
    pub role: AgentRole,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    pub transport: Transport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub internal: bool,
}

#[derive(Deserialize)]
struct AgentsFile {
    #[serde(default)]
    agents: Vec<AgentDescriptor>,
}

/// Read-only catalog of agents, in declaration order.
#[derive(Debug, Clone)]
pub struct AgentDirectory {
    agents: Vec<AgentDescriptor>,
    by_id: HashMap<String, usize>,
}

impl AgentDirectory {
    /// Build a directory. Ids must be non-empty and unique.
    pub fn new(agents: Vec<AgentDescriptor>) -> SwitchyardResult<Self> {
        let mut by_id = HashMap::with_capacity(agents.len());
        for (i, agent) in agents.iter().enumerate() {
            if agent.id.is_empty() {
                return Err(SwitchyardError::Config(format!(
                    "Agent #{i} has an empty id"
                )));
            }
            if by_id.insert(agent.id.clone(), i).is_some() {
                return Err(SwitchyardError::Config(format!(
                    "Duplicate agent id: {}",
                    agent.id
                )));
            }
        }
        Ok(Self { agents, by_id })
    }

    /// Parse an `[[agents]]` array from TOML.
    pub fn from_toml_str(s: &str) -> SwitchyardResult<Self> {
        let file: AgentsFile = toml::from_str(s)
            .map_err(|e| SwitchyardError::Config(format!("Invalid agent directory: {e}")))?;
        Self::new(file.agents)
    }

    /// The standard twelve-agent catalog.
    pub fn builtin() -> Self {
        let agents = builtin_agents();
        let by_id = agents
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i))
            .collect();
        Self { agents, by_id }
    }

    pub fn lookup_by_id(&self, id: &str) -> Option<&AgentDescriptor> {
        self.by_id.get(id).map(|&i| &self.agents[i])
    }

    /// Every agent with `role`, in declaration order.
    pub fn lookup_by_role(&self, role: AgentRole) -> Vec<&AgentDescriptor> {
        self.agents.iter().filter(|a| a.role == role).collect()
    }

    pub fn first_by_role(&self, role: AgentRole) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|a| a.role == role)
    }

    pub fn all(&self) -> &[AgentDescriptor] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for AgentDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}

const TOOL_HOST: &str = "http://localhost:8080/mcp";

fn agent(
    id: &str,
    role: AgentRole,
    description: &str,
    capabilities: &[&str],
    transport: Transport,
    endpoint: Option<&str>,
) -> AgentDescriptor {
    AgentDescriptor {
        id: id.to_string(),
        role,
        description: description.to_string(),
        capabilities: capabilities.iter().map(|c| (*c).to_string()).collect(),
        transport,
        endpoint: endpoint.map(str::to_string),
        internal: false,
    }
}

fn builtin_agents() -> Vec<AgentDescriptor> {
    use AgentRole::*;
    use Transport::*;

    let mut ci = agent(
        "CI001",
        Ci,
        "Runs tests, builds, security scans and release gating.",
        &["ci.run_tests", "ci.build", "ci.lint", "ci.release-gate"],
        Remote,
        Some(TOOL_HOST),
    );
    ci.internal = true;

    vec![
        agent(
            "CDYP71",
            Orchestrator,
            "Decision pipeline orchestrator with critic.",
            &[
                "dmn.evaluate",
                "dmn.critic",
                "normalize.context",
                "rag.query",
                "plan.dispatch",
                "mcp.call",
            ],
            InProcess,
            Some(TOOL_HOST),
        ),
        agent(
            "DEC001",
            Decision,
            "Decision table inspection and validation.",
            &[
                "dmn.inspect",
                "dmn.get_rules",
                "dmn.get_inputs",
                "dmn.get_outputs",
                "dmn.validate",
            ],
            Remote,
            Some(TOOL_HOST),
        ),
        agent(
            "REVIEWER001",
            Review,
            "Reviews CI workflow files for security and correctness.",
            &["actions.review", "actions.lint", "security.scan"],
            Remote,
            Some(TOOL_HOST),
        ),
        agent(
            "VEC001",
            VectorStore,
            "Embeddings, upserts and nearest-neighbor search.",
            &["vector.embed", "vector.upsert", "vector.query", "vector.dot"],
            Remote,
            Some("http://localhost:8088/v1"),
        ),
        agent(
            "RAG001",
            Retrieval,
            "Chunking and retrieval support.",
            &["rag.ingest", "rag.query", "rag.similarity"],
            Remote,
            Some("http://localhost:8000"),
        ),
        agent(
            "CFW001",
            Gateway,
            "Edge gateway for session onboarding and token issuance.",
            &["ws.onboard", "jwt.issue", "mcp.forward", "task.route"],
            Socket,
            Some("wss://gateway.invalid/onboard"),
        ),
        agent(
            "DO001",
            SessionCoordinator,
            "Stateful coordination of sessions, tool calls and fan-out.",
            &["session.manage", "broadcast", "mcp.proxy"],
            Socket,
            Some("wss://gateway.invalid/onboard"),
        ),
        ci,
        agent(
            "ZK001",
            Verifier,
            "Proof verification for onboarding and release gating.",
            &["zk.verify", "zk.proof_check", "zk.release_gate"],
            Remote,
            Some(TOOL_HOST),
        ),
        agent(
            "SIM001",
            Simulation,
            "Simulation engine stepping.",
            &["wham.step", "wham.bind", "wham.render"],
            Remote,
            Some("http://localhost:7000"),
        ),
        agent(
            "TEL001",
            Telemetry,
            "Collects logs, events and metrics.",
            &["telemetry.collect", "telemetry.push", "telemetry.summarize"],
            Remote,
            Some("http://localhost:9090"),
        ),
        agent(
            "CLI001",
            GenericClient,
            "Generic tool-call client.",
            &["mcp.call"],
            Remote,
            Some(TOOL_HOST),
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_one_agent_per_role() {
        let dir = AgentDirectory::builtin();
        assert_eq!(dir.len(), 12);
        for role in AgentRole::ALL {
            assert_eq!(dir.lookup_by_role(role).len(), 1, "role {role}");
        }
        assert_eq!(dir.first_by_role(AgentRole::Orchestrator).unwrap().id, "CDYP71");
        assert!(dir.lookup_by_id("CI001").unwrap().internal);
    }

    #[test]
    fn test_role_round_trip() {
        for role in AgentRole::ALL {
            assert_eq!(role.as_str().parse::<AgentRole>().unwrap(), role);
            let json = serde_json::to_value(role).unwrap();
            assert_eq!(json, role.as_str());
        }
        assert!("nonexistent-role".parse::<AgentRole>().is_err());
    }

    #[test]
    fn test_lookup_by_role_keeps_order() {
        let dir = AgentDirectory::from_toml_str(
            r#"
            [[agents]]
            id = "R2"
            role = "retrieval"
            transport = "remote"
            endpoint = "http://r2"

            [[agents]]
            id = "O1"
            role = "orchestrator"
            transport = "in-process"

            [[agents]]
            id = "R1"
            role = "retrieval"
            transport = "remote"
            capabilities = ["rag.query"]
            "#,
        )
        .unwrap();

        let ids: Vec<&str> = dir
            .lookup_by_role(AgentRole::Retrieval)
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(ids, vec!["R2", "R1"]);
        assert!(dir.lookup_by_id("R1").unwrap().capabilities.contains("rag.query"));
        assert!(dir.lookup_by_role(AgentRole::Ci).is_empty());
        assert!(dir.lookup_by_id("missing").is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = AgentDirectory::from_toml_str(
            r#"
            [[agents]]
            id = "A"
            role = "ci"
            transport = "remote"

            [[agents]]
            id = "A"
            role = "review"
            transport = "remote"
            "#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "config_error");
        assert!(err.to_string().contains("Duplicate agent id: A"));
    }

    #[test]
    fn test_unknown_role_in_toml_rejected() {
        let err = AgentDirectory::from_toml_str(
            r#"
            [[agents]]
            id = "A"
            role = "wizard"
            transport = "remote"
            "#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "config_error");
    }

    #[test]
    fn test_empty_file_is_empty_directory() {
        let dir = AgentDirectory::from_toml_str("").unwrap();
        assert!(dir.is_empty());
    }
}
