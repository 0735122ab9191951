use crate::embedding::{EmbedderSet, DEFAULT_DIMENSION};
use crate::store::{score_candidates, EmbeddingRecord, VectorStore, DEFAULT_NAMESPACE};
use crate::wire::{
    DotRequest, DotResponse, EmbedRequest, EmbedResponse, Embedding, QueryMatch, QueryRequest,
    QueryResponse, UpsertRequest, UpsertResponse,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use switchyard_core::SwitchyardResult;
use tracing::debug;

/// Default number of matches a query returns when `topK` is absent.
pub const DEFAULT_TOP_K: usize = 10;

/// The vector bus contract: embed, upsert, query and dot, plus a liveness
/// check. Implemented over HTTP by [`crate::VectorBusClient`] and in-process
/// by [`LocalVectorService`].
#[async_trait]
pub trait VectorService: Send + Sync {
    async fn healthz(&self) -> SwitchyardResult<()>;

    async fn embed(&self, request: EmbedRequest) -> SwitchyardResult<EmbedResponse>;

    async fn upsert_vectors(&self, request: UpsertRequest) -> SwitchyardResult<UpsertResponse>;

    async fn query(&self, request: QueryRequest) -> SwitchyardResult<QueryResponse>;

    async fn dot(&self, request: DotRequest) -> SwitchyardResult<DotResponse>;
}

/// A [`VectorService`] backed by a local [`VectorStore`] and embedder set.
pub struct LocalVectorService {
    store: Arc<dyn VectorStore>,
    embedders: EmbedderSet,
    default_dim: usize,
    default_top_k: usize,
}

impl LocalVectorService {
    pub fn new(store: Arc<dyn VectorStore>, embedders: EmbedderSet) -> Self {
        Self {
            store,
            embedders,
            default_dim: DEFAULT_DIMENSION,
            default_top_k: DEFAULT_TOP_K,
        }
    }

    /// Dimension used by `embed` when the request leaves `dim` unset.
    pub fn with_default_dim(mut self, dim: usize) -> Self {
        self.default_dim = dim;
        self
    }

    pub fn with_default_top_k(mut self, top_k: usize) -> Self {
        self.default_top_k = top_k;
        self
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }
}

#[async_trait]
impl VectorService for LocalVectorService {
    async fn healthz(&self) -> SwitchyardResult<()> {
        self.store.namespaces().await.map(|_| ())
    }

    async fn embed(&self, request: EmbedRequest) -> SwitchyardResult<EmbedResponse> {
        let dim = request.dim.unwrap_or(self.default_dim);
        let embedder = self.embedders.select(request.model.as_deref());
        let vectors = embedder.embed_batch(&request.texts, dim).await?;
        debug!(count = vectors.len(), dim, mode = embedder.mode(), "Embedded texts");

        let embeddings = request
            .texts
            .into_iter()
            .zip(vectors)
            .map(|(text, vector)| Embedding { text, vector })
            .collect();
        Ok(EmbedResponse { dim, embeddings })
    }

    async fn upsert_vectors(&self, request: UpsertRequest) -> SwitchyardResult<UpsertResponse> {
        let namespace = request.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
        let now = Utc::now();
        let records = request
            .items
            .into_iter()
            .map(|item| EmbeddingRecord {
                id: item.id,
                vector: item.vector,
                text: item.text,
                meta: item.meta,
                updated_at: now,
            })
            .collect();
        let upserted = self.store.upsert(namespace, records).await?;
        Ok(UpsertResponse { upserted })
    }

    async fn query(&self, request: QueryRequest) -> SwitchyardResult<QueryResponse> {
        let namespace = request.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
        let top_k = request.top_k.unwrap_or(self.default_top_k);
        let include_text = request.include_text.unwrap_or(false);

        let results = self.store.query(namespace, &request.vector, top_k).await?;
        let matches = results
            .into_iter()
            .map(|r| {
                let (text, meta) = if include_text {
                    (r.record.text, r.record.meta)
                } else {
                    (None, None)
                };
                QueryMatch {
                    id: r.record.id,
                    score: r.score,
                    text,
                    meta,
                }
            })
            .collect();
        Ok(QueryResponse { matches })
    }

    async fn dot(&self, request: DotRequest) -> SwitchyardResult<DotResponse> {
        let scores = score_candidates(&request.query, &request.vectors)?;
        Ok(DotResponse { scores })
    }
}
