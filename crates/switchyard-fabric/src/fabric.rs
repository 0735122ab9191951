use crate::directory::{AgentDescriptor, AgentDirectory, AgentRole};
use crate::forward::Forwarder;
use crate::table::{DispatchTable, Handler, StoreOp};
use crate::types::{RoutingEnvelope, RoutingResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use switchyard_core::{SwitchyardError, SwitchyardResult};
use switchyard_pipeline::Pipeline;
use switchyard_vector::VectorService;
use tracing::{info, warn};

/// Routes envelopes to the pipeline, the vector service or a remote agent.
///
/// Holds no per-request state; every collaborator is shared read-only.
pub struct RoutingFabric {
    directory: Arc<AgentDirectory>,
    table: Arc<DispatchTable>,
    pipeline: Arc<Pipeline>,
    vectors: Arc<dyn VectorService>,
    forwarder: Arc<dyn Forwarder>,
}

impl RoutingFabric {
    pub fn new(
        directory: Arc<AgentDirectory>,
        table: Arc<DispatchTable>,
        pipeline: Arc<Pipeline>,
        vectors: Arc<dyn VectorService>,
        forwarder: Arc<dyn Forwarder>,
    ) -> Self {
        Self {
            directory,
            table,
            pipeline,
            vectors,
            forwarder,
        }
    }

    pub fn directory(&self) -> &AgentDirectory {
        &self.directory
    }

    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    /// Route one envelope.
    ///
    /// The agent is resolved before the task is looked up, and nothing runs
    /// for an unregistered task.
    pub async fn route(&self, envelope: RoutingEnvelope) -> SwitchyardResult<RoutingResult> {
        let resolved = self.resolve(envelope.target_role.as_deref())?;

        let handler = self.table.get(&envelope.task).ok_or_else(|| {
            warn!(task = %envelope.task, source = %envelope.source, "Fabric: unknown task");
            SwitchyardError::UnknownTask(envelope.task.clone())
        })?;

        info!(
            task = %envelope.task,
            source = %envelope.source,
            agent = %resolved.id,
            "Fabric: routing"
        );

        match handler {
            Handler::Orchestrate => {
                let outcome = self.pipeline.run(envelope.payload).await?;
                Ok(RoutingResult {
                    agent: resolved.id.clone(),
                    response: serde_json::to_value(outcome)?,
                })
            }
            Handler::Store(op) => {
                let agent = self.first_of(AgentRole::VectorStore)?;
                let response = self.store(*op, envelope.payload).await?;
                Ok(RoutingResult {
                    agent: agent.id.clone(),
                    response,
                })
            }
            Handler::Forward { role, call } => {
                let agent = self.first_of(*role)?;
                let response = self
                    .forwarder
                    .forward(agent, call, envelope.payload, envelope.token.as_deref())
                    .await?;
                info!(task = %envelope.task, agent = %agent.id, "Fabric: forwarded");
                Ok(RoutingResult {
                    agent: agent.id.clone(),
                    response,
                })
            }
        }
    }

    fn resolve(&self, target_role: Option<&str>) -> SwitchyardResult<&AgentDescriptor> {
        match target_role {
            Some(raw) => {
                let role: AgentRole = raw
                    .parse()
                    .map_err(|_| SwitchyardError::NoAgentForRole(raw.to_string()))?;
                self.first_of(role)
            }
            None => self
                .directory
                .first_by_role(AgentRole::Orchestrator)
                .ok_or(SwitchyardError::NoOrchestratorConfigured),
        }
    }

    fn first_of(&self, role: AgentRole) -> SwitchyardResult<&AgentDescriptor> {
        self.directory
            .first_by_role(role)
            .ok_or_else(|| SwitchyardError::NoAgentForRole(role.to_string()))
    }

    async fn store(
        &self,
        op: StoreOp,
        payload: serde_json::Value,
    ) -> SwitchyardResult<serde_json::Value> {
        match op {
            StoreOp::Embed => to_json(self.vectors.embed(parse(payload)?).await?),
            StoreOp::Upsert => to_json(self.vectors.upsert_vectors(parse(payload)?).await?),
            StoreOp::Query => to_json(self.vectors.query(parse(payload)?).await?),
            StoreOp::Dot => to_json(self.vectors.dot(parse(payload)?).await?),
        }
    }
}

fn parse<T: DeserializeOwned>(payload: serde_json::Value) -> SwitchyardResult<T> {
    serde_json::from_value(payload).map_err(|e| SwitchyardError::InvalidRequest(e.to_string()))
}

fn to_json<T: Serialize>(value: T) -> SwitchyardResult<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}
