//! Assembles services from a loaded [`SwitchyardConfig`].

use crate::config::{RetrieverKind, SwitchyardConfig};
use std::sync::Arc;
use std::time::Duration;
use switchyard_fabric::{AgentDirectory, DispatchTable, HttpForwarder, RoutingFabric};
use switchyard_pipeline::{DecisionModel, Pipeline, Retriever, ToolRetriever, VectorRetriever};
use switchyard_vector::{
    EmbedderSet, FileVectorStore, HttpEmbedding, InMemoryVectorStore, LocalVectorService,
    VectorBusClient, VectorService, VectorStore,
};
use tracing::info;

/// The remote vector bus when one is configured, the local store otherwise.
pub async fn vector_service(config: &SwitchyardConfig) -> anyhow::Result<Arc<dyn VectorService>> {
    if let Some(url) = &config.vector_bus.url {
        info!(%url, "Using remote vector bus");
        let client = VectorBusClient::with_timeout(
            url.clone(),
            config.vector_bus.token.clone(),
            Duration::from_secs(config.vector_bus.timeout_secs),
        )?;
        return Ok(Arc::new(client));
    }

    let store: Arc<dyn VectorStore> = match &config.store.path {
        Some(path) => {
            let store = FileVectorStore::open(path.clone(), config.store.dimension).await?;
            info!(path = %path.display(), "Opened vector store");
            Arc::new(store)
        }
        None => match config.store.dimension {
            Some(dim) => Arc::new(InMemoryVectorStore::with_dimension(dim)),
            None => Arc::new(InMemoryVectorStore::new()),
        },
    };

    let mut embedders = EmbedderSet::local();
    if let Some(remote) = &config.embedding {
        info!(model = %remote.model, "Remote embeddings enabled");
        embedders = embedders.with_remote(Arc::new(HttpEmbedding::new(remote.clone())?));
    }

    Ok(Arc::new(LocalVectorService::new(store, embedders)))
}

pub fn decision_model(config: &SwitchyardConfig) -> anyhow::Result<DecisionModel> {
    match &config.pipeline.model_path {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|e| {
                anyhow::anyhow!("Failed to read decision model '{}': {e}", path.display())
            })?;
            let model = DecisionModel::from_json(&json)?;
            info!(path = %path.display(), tables = model.decisions.len(), "Loaded decision model");
            Ok(model)
        }
        None => Ok(DecisionModel::builtin()),
    }
}

pub fn directory(config: &SwitchyardConfig) -> anyhow::Result<AgentDirectory> {
    if config.agents.is_empty() {
        Ok(AgentDirectory::builtin())
    } else {
        Ok(AgentDirectory::new(config.agents.clone())?)
    }
}

/// Wire directory, dispatch table, pipeline and forwarder into a fabric.
pub fn fabric(
    config: &SwitchyardConfig,
    vectors: Arc<dyn VectorService>,
) -> anyhow::Result<RoutingFabric> {
    let directory = directory(config)?;
    let table = DispatchTable::standard().with_routes(&config.routes)?;
    let tools = Arc::new(config.pipeline.tool_client()?);

    let retriever: Arc<dyn Retriever> = match config.pipeline.retriever {
        RetrieverKind::Vector => Arc::new(VectorRetriever::new(
            vectors.clone(),
            config.pipeline.namespace.clone(),
        )),
        RetrieverKind::Tool => Arc::new(ToolRetriever::new(tools.clone())),
    };

    let pipeline = Pipeline::new(
        tools,
        retriever,
        Arc::new(decision_model(config)?),
        config.pipeline.stage_config(),
    );

    info!(
        agents = directory.len(),
        tasks = table.tasks().count(),
        "Routing fabric ready"
    );

    Ok(RoutingFabric::new(
        Arc::new(directory),
        Arc::new(table),
        Arc::new(pipeline),
        vectors,
        Arc::new(HttpForwarder::with_timeout(Duration::from_secs(
            config.pipeline.stage_timeout_secs,
        ))?),
    ))
}
