use async_trait::async_trait;
use std::sync::Arc;
use switchyard_core::{SwitchyardResult, ToolCall, ToolInvoker};
use switchyard_vector::{DeterministicEmbedding, QueryRequest, VectorService, DEFAULT_DIMENSION};

/// Tool that answers retrieval queries.
pub const RAG_TOOL: &str = "rag_vector_query";

/// Source of advisory evidence for the retrieve stage.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `top_k` evidence snippets for `query`, best first.
    async fn retrieve(&self, query: &str, top_k: usize) -> SwitchyardResult<Vec<serde_json::Value>>;
}

/// Retrieval through the `rag_vector_query` tool.
pub struct ToolRetriever {
    tools: Arc<dyn ToolInvoker>,
}

impl ToolRetriever {
    pub fn new(tools: Arc<dyn ToolInvoker>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Retriever for ToolRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> SwitchyardResult<Vec<serde_json::Value>> {
        let result = self
            .tools
            .invoke(ToolCall::new(
                RAG_TOOL,
                serde_json::json!({ "query": query, "topK": top_k }),
            ))
            .await?;
        let mut evidence = evidence_list(result);
        evidence.truncate(top_k);
        Ok(evidence)
    }
}

/// Accepts a bare array, or an object carrying `matches` or `results`.
fn evidence_list(value: serde_json::Value) -> Vec<serde_json::Value> {
    match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Null => Vec::new(),
        serde_json::Value::Object(mut map) => {
            for key in ["matches", "results"] {
                if let Some(serde_json::Value::Array(items)) = map.remove(key) {
                    return items;
                }
            }
            vec![serde_json::Value::Object(map)]
        }
        other => vec![other],
    }
}

/// Retrieval straight from a vector service: the query text is embedded
/// deterministically and searched in one namespace.
pub struct VectorRetriever {
    service: Arc<dyn VectorService>,
    namespace: String,
    dim: usize,
}

impl VectorRetriever {
    pub fn new(service: Arc<dyn VectorService>, namespace: impl Into<String>) -> Self {
        Self {
            service,
            namespace: namespace.into(),
            dim: DEFAULT_DIMENSION,
        }
    }

    pub fn with_dimension(mut self, dim: usize) -> Self {
        self.dim = dim;
        self
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> SwitchyardResult<Vec<serde_json::Value>> {
        let resp = self
            .service
            .query(QueryRequest {
                namespace: Some(self.namespace.clone()),
                vector: DeterministicEmbedding::vector(query, self.dim),
                top_k: Some(top_k),
                include_text: Some(true),
            })
            .await?;
        resp.matches
            .into_iter()
            .map(|m| serde_json::to_value(m).map_err(Into::into))
            .collect()
    }
}
