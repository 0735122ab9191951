use crate::service::VectorService;
use crate::wire::{
    DotRequest, DotResponse, EmbedRequest, EmbedResponse, QueryRequest, QueryResponse,
    UpsertRequest, UpsertResponse,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use switchyard_core::{SwitchyardError, SwitchyardResult};
use tracing::debug;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8088/v1";

/// HTTP client for a remote vector bus.
///
/// Every operation maps a non-2xx answer to
/// [`SwitchyardError::Remote`] carrying the status and the operation name.
pub struct VectorBusClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl VectorBusClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> SwitchyardResult<Self> {
        Self::with_timeout(base_url, token, Duration::from_secs(30))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> SwitchyardResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SwitchyardError::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn post<B, R>(&self, path: &str, operation: &str, body: &B) -> SwitchyardResult<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, operation, "Vector bus request");
        let resp = self
            .authorize(self.http.post(&url).json(body))
            .send()
            .await
            .map_err(|e| map_transport(e, operation))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SwitchyardError::remote(status.as_u16(), operation));
        }
        resp.json()
            .await
            .map_err(|e| SwitchyardError::Http(format!("{operation}: {e}")))
    }
}

fn map_transport(err: reqwest::Error, operation: &str) -> SwitchyardError {
    if err.is_timeout() {
        SwitchyardError::Timeout(operation.to_string())
    } else {
        SwitchyardError::Http(format!("{operation}: {err}"))
    }
}

#[async_trait]
impl VectorService for VectorBusClient {
    async fn healthz(&self) -> SwitchyardResult<()> {
        let url = format!("{}/healthz", self.base_url);
        let resp = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(|e| map_transport(e, "healthz"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SwitchyardError::remote(status.as_u16(), "healthz"));
        }
        Ok(())
    }

    async fn embed(&self, request: EmbedRequest) -> SwitchyardResult<EmbedResponse> {
        self.post("/embed", "embed", &request).await
    }

    async fn upsert_vectors(&self, request: UpsertRequest) -> SwitchyardResult<UpsertResponse> {
        self.post("/vectors", "upsert", &request).await
    }

    async fn query(&self, request: QueryRequest) -> SwitchyardResult<QueryResponse> {
        self.post("/query", "query", &request).await
    }

    async fn dot(&self, request: DotRequest) -> SwitchyardResult<DotResponse> {
        self.post("/dot", "dot", &request).await
    }
}
